use clap::{ArgAction, Parser, Subcommand};
use std::{net::SocketAddr, path::PathBuf};
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(
    name = "flavourfinder",
    version,
    about = "Backend API for the FlavourFinder app"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub config: Config,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print a signed access token for local testing of protected routes
    IssueToken {
        /// User id to put in the `sub` claim
        #[arg(long)]
        sub: String,

        /// Lifetime of the token in hours
        #[arg(long, default_value_t = 24)]
        ttl_hours: u64,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
}

/// `FlavourFinder` server configuration
#[derive(Parser, Debug, Clone)]
pub struct Config {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease verbosity (-q, -qq, -qqq)
    #[arg(short = 'q', action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Address to bind the HTTP server to
    #[arg(long, env = "FLAVOURFINDER_BIND_ADDR", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Database path
    #[arg(
        long,
        env = "FLAVOURFINDER_DATABASE_PATH",
        default_value = "flavourfinder.sqlite"
    )]
    pub database_path: PathBuf,

    /// Log file path (logs are written to stdout + this file)
    #[arg(long, env = "FLAVOURFINDER_LOG_FILE", default_value = "flavourfinder.logs")]
    pub log_file: PathBuf,

    /// Shared secret used to verify HS256 bearer tokens
    #[arg(long, env = "FLAVOURFINDER_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// API key for the chat-completion endpoint
    #[arg(long, env = "FLAVOURFINDER_LLM_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Completion model to use
    #[arg(
        long,
        env = "FLAVOURFINDER_LLM_MODEL",
        default_value = "llama-3.3-70b-versatile"
    )]
    pub llm_model: String,

    /// Base URL of the OpenAI-compatible completion API
    #[arg(
        long,
        env = "FLAVOURFINDER_LLM_API_URL",
        default_value = "https://api.groq.com/openai/v1"
    )]
    pub llm_api_url: String,

    /// Unsplash access key for recipe images
    #[arg(long, env = "FLAVOURFINDER_UNSPLASH_ACCESS_KEY", hide_env_values = true)]
    pub unsplash_access_key: Option<String>,

    /// Unsplash API base URL
    #[arg(
        long,
        env = "FLAVOURFINDER_UNSPLASH_API_URL",
        default_value = "https://api.unsplash.com"
    )]
    pub unsplash_api_url: String,
}

fn required<'a>(value: Option<&'a String>, name: &'static str) -> Result<&'a str, ConfigError> {
    value
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

impl Config {
    #[must_use]
    pub fn verbosity_delta(&self) -> i16 {
        i16::from(self.verbose) - i16::from(self.quiet)
    }

    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        match self.verbosity_delta() {
            d if d <= -2 => "error",
            -1 => "warn",
            0 => "info,flavourfinder=info,axum=info,tower_http=info",
            1 => "debug,flavourfinder=debug,axum=info,tower_http=info,sqlx=warn,hyper=info",
            2 => "trace,flavourfinder=trace,axum=debug,tower_http=trace,sqlx=info,hyper=info",
            _ => "trace,flavourfinder=trace,axum=trace,tower_http=trace,sqlx=debug,hyper=debug",
        }
    }

    /// Every credential the server cannot run without.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Missing`] naming the first absent or blank setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        required(self.jwt_secret.as_ref(), "FLAVOURFINDER_JWT_SECRET")?;
        required(self.llm_api_key.as_ref(), "FLAVOURFINDER_LLM_API_KEY")?;
        required(
            self.unsplash_access_key.as_ref(),
            "FLAVOURFINDER_UNSPLASH_ACCESS_KEY",
        )?;
        Ok(())
    }

    /// # Errors
    ///
    /// [`ConfigError::Missing`] if no JWT secret is configured.
    pub fn jwt_secret(&self) -> Result<&str, ConfigError> {
        required(self.jwt_secret.as_ref(), "FLAVOURFINDER_JWT_SECRET")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["flavourfinder"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().config
    }

    #[test]
    fn missing_credentials_are_reported_by_name() {
        let c = parse(&[
            "--jwt-secret",
            "s",
            "--llm-api-key",
            "k",
            "--unsplash-access-key",
            "  ",
        ]);
        assert_eq!(
            c.validate(),
            Err(ConfigError::Missing("FLAVOURFINDER_UNSPLASH_ACCESS_KEY"))
        );

        let c = parse(&[
            "--jwt-secret",
            "s",
            "--llm-api-key",
            "k",
            "--unsplash-access-key",
            "u",
        ]);
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn verbosity_flags_pick_filter() {
        assert_eq!(parse(&["-qq"]).log_filter(), "error");
        assert!(parse(&["-v"]).log_filter().starts_with("debug"));
    }
}
