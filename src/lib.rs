#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod images;
pub mod llm;
pub mod logging;
pub mod models;
pub mod parser;
pub mod preferences;
pub mod prompts;
pub mod routes;
pub mod store;

pub use app::build_app;
pub use models::AppState;
