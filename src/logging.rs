use crate::config::Config;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Keep guards alive for the lifetime of the app.
pub struct LogGuards {
    _file_guard: WorkerGuard,
}

fn split_path(path: &Path) -> (PathBuf, String) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let file = path
        .file_name()
        .unwrap_or_else(|| OsStr::new("flavourfinder.logs"))
        .to_string_lossy()
        .to_string();
    (dir, file)
}

#[must_use]
pub fn init_logging(config: &Config) -> LogGuards {
    let filter = EnvFilter::new(config.log_filter());

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_ansi(true)
        .compact()
        .with_timer(fmt::time::ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()));

    let (dir, file) = split_path(&config.log_file);
    let appender = tracing_appender::rolling::never(dir, file);
    let (nb, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .compact()
        .with_timer(fmt::time::ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_writer(nb);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    LogGuards { _file_guard: guard }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_path_handles_bare_file_names() {
        let (dir, file) = split_path(Path::new("app.logs"));
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(file, "app.logs");

        let (dir, file) = split_path(Path::new("/var/log/ff/out.log"));
        assert_eq!(dir, PathBuf::from("/var/log/ff"));
        assert_eq!(file, "out.log");
    }
}
