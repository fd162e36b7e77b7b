use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::{auth::AuthError, llm::LlmError, parser::ParseError, store::StoreError};

/// Route-boundary error. Full detail goes to the log; clients get a fixed,
/// safe message per kind.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Completion or persistence backend unreachable or erroring.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Model output did not decode into a valid recipe.
    #[error("malformed model response: {0}")]
    MalformedResponse(#[from] ParseError),

    #[error("duplicate: {0}")]
    Duplicate(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        Self::Upstream(e.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate { recipe_id } => {
                Self::Duplicate(format!("recipe {recipe_id} is already saved"))
            }
            StoreError::Db(e) => Self::Upstream(e.to_string()),
            StoreError::Encode(e) => Self::Internal(e.into()),
        }
    }
}

#[derive(Serialize)]
struct ErrBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (code, msg) = match &self {
            Self::Auth(_) => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            Self::Upstream(detail) => {
                tracing::error!(%detail, "upstream failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream service unavailable".to_string(),
                )
            }
            Self::MalformedResponse(e) => {
                tracing::error!(error = %e, "unusable model output");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "model returned an unusable recipe".to_string(),
                )
            }
            Self::Duplicate(_) => (StatusCode::CONFLICT, "recipe already saved".to_string()),
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            Self::Internal(err) => {
                tracing::error!("{:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (code, Json(ErrBody { error: msg })).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
