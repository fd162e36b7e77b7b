use axum::{Extension, Json, extract::State};

use crate::{
    auth::AuthUser, error::AppResult, models::AppState, preferences::UserPreferences,
};

/// GET /preferences
/// Stored preferences, or the all-moderate defaults if none were saved.
///
/// # Errors
/// Returns an error if querying the preferences fails.
pub async fn get(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> AppResult<Json<UserPreferences>> {
    let prefs = state
        .store
        .get_preferences(&user_id)
        .await?
        .unwrap_or_default();
    Ok(Json(prefs))
}

/// PUT /preferences
///
/// # Errors
/// Returns an error if the upsert fails.
pub async fn put(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(prefs): Json<UserPreferences>,
) -> AppResult<Json<UserPreferences>> {
    let stored = state.store.upsert_preferences(&user_id, &prefs).await?;
    tracing::debug!(user = %user_id, "preferences updated");
    Ok(Json(stored))
}
