#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

use clap::Parser;
use tokio::net::TcpListener;

use flavourfinder::{
    auth::{JwtVerifier, issue_token},
    build_app,
    config::{Cli, Commands, Config},
    images::ImageResolver,
    llm::LlmClient,
    logging::init_logging,
    models::AppState,
    store::Store,
};

fn masked(v: Option<&String>) -> &'static str {
    if v.is_some_and(|k| !k.trim().is_empty()) {
        "<set>"
    } else {
        "<not set>"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Handle subcommands
    if let Some(command) = cli.command {
        return handle_command(&cli.config, command);
    }

    let config = cli.config;

    // Keep guard alive so file logger flushes correctly
    let _log_guards = init_logging(&config);

    // Log all configuration (mask sensitive values)
    tracing::info!("=== Configuration ===");
    tracing::info!("Bind address: {}", config.bind);
    tracing::info!("Database path: {}", config.database_path.display());
    tracing::info!("Log file: {}", config.log_file.display());
    tracing::info!("JWT secret: {}", masked(config.jwt_secret.as_ref()));
    tracing::info!("LLM API key: {}", masked(config.llm_api_key.as_ref()));
    tracing::info!("LLM model: {}", config.llm_model);
    tracing::info!("LLM API URL: {}", config.llm_api_url);
    tracing::info!(
        "Unsplash access key: {}",
        masked(config.unsplash_access_key.as_ref())
    );
    tracing::info!("Unsplash API URL: {}", config.unsplash_api_url);
    tracing::info!("====================");

    if let Err(e) = config.validate() {
        tracing::error!("{e}; refusing to start");
        return Err(e.into());
    }

    let state = build_state(&config).await?;
    let app = build_app(state);

    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!("listening on {}", config.bind);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let store = Store::connect(&config.database_path).await?;
    let jwt = JwtVerifier::new(config.jwt_secret()?);
    let llm = LlmClient::new(
        config.llm_api_url.clone(),
        config.llm_api_key.clone().unwrap_or_default(),
        config.llm_model.clone(),
    );
    let images = ImageResolver::new(
        config.unsplash_api_url.clone(),
        config.unsplash_access_key.clone().unwrap_or_default(),
    );

    Ok(AppState {
        store,
        http: reqwest::Client::new(),
        llm,
        images,
        jwt,
    })
}

fn handle_command(config: &Config, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::IssueToken { sub, ttl_hours } => {
            let secret = config.jwt_secret()?;
            let now = u64::try_from(chrono::Utc::now().timestamp())?;
            let token = issue_token(secret, &sub, now + ttl_hours * 3600)?;
            println!("{token}");
            Ok(())
        }
    }
}
