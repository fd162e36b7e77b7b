use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{
        AppState, GenerateRecipeReq, HistoryRow, ModifyRecipeReq, Recipe, SavedRecipeRow,
    },
    parser::parse_recipe,
    preferences::UserPreferences,
    prompts::{
        GENERATE_TEMPERATURE, MAX_EXISTING_TITLES, MAX_TOKENS, MODIFY_TEMPERATURE,
        build_generate_prompt, build_modify_prompt,
    },
};

const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 100;

fn new_recipe_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Keep only the most recent titles; caller lists are oldest-first.
fn bounded_titles(mut titles: Vec<String>) -> Vec<String> {
    titles.retain(|t| !t.trim().is_empty());
    if titles.len() > MAX_EXISTING_TITLES {
        titles.drain(..titles.len() - MAX_EXISTING_TITLES);
    }
    titles
}

/// Prompt, complete, parse, then attach an id and an image.
async fn generate_recipe(
    state: &AppState,
    preferences: &UserPreferences,
    existing_titles: &[String],
) -> AppResult<Recipe> {
    let prompt = build_generate_prompt(&preferences.to_prompt_string(), existing_titles);
    let raw = state
        .llm
        .complete(&state.http, &prompt, GENERATE_TEMPERATURE, MAX_TOKENS)
        .await?;
    let generated = parse_recipe(&raw)?;

    let image_url = state
        .images
        .resolve(&state.http, &generated.title, &generated.tags)
        .await;

    Ok(Recipe::from_generated(new_recipe_id(), image_url, generated))
}

/// POST /recipes/generate
///
/// # Errors
/// Returns an error if the completion call fails, its output is not a
/// usable recipe, or the history row cannot be written.
pub async fn generate(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(req): Json<GenerateRecipeReq>,
) -> AppResult<Json<Recipe>> {
    let titles = match req.existing_recipes {
        Some(titles) => bounded_titles(titles),
        None => {
            let limit = i64::try_from(MAX_EXISTING_TITLES).unwrap_or(i64::MAX);
            state.store.recent_titles(&user_id, limit).await?
        }
    };

    let recipe = generate_recipe(&state, &req.preferences, &titles).await?;
    tracing::info!(user = %user_id, recipe_id = %recipe.id, title = %recipe.title, "recipe generated");

    state.store.insert_history(&user_id, &recipe).await?;
    Ok(Json(recipe))
}

/// POST /recipes/modify
///
/// # Errors
/// Returns an error if the request is empty, the completion call fails, or
/// its output is not a usable recipe.
pub async fn modify(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(req): Json<ModifyRecipeReq>,
) -> AppResult<Json<Recipe>> {
    if req.modification.trim().is_empty() {
        return Err(AppError::BadRequest("modification must not be empty".into()));
    }
    if !req.original_recipe.is_object() {
        return Err(AppError::BadRequest(
            "original_recipe must be a JSON object".into(),
        ));
    }

    let prompt = build_modify_prompt(&req.original_recipe, req.modification.trim());
    let raw = state
        .llm
        .complete(&state.http, &prompt, MODIFY_TEMPERATURE, MAX_TOKENS)
        .await?;
    let modified = parse_recipe(&raw)?;

    let image_url = match req
        .original_recipe
        .get("image_url")
        .and_then(JsonValue::as_str)
        .filter(|u| !u.trim().is_empty())
    {
        Some(url) => url.to_string(),
        None => {
            state
                .images
                .resolve(&state.http, &modified.title, &modified.tags)
                .await
        }
    };

    let recipe = Recipe::from_generated(new_recipe_id(), image_url, modified);
    tracing::info!(user = %user_id, recipe_id = %recipe.id, "recipe modified");
    Ok(Json(recipe))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct HistoryResp {
    pub history: Vec<HistoryRow>,
}

/// GET /recipes/history?limit=50
///
/// A limit of zero or below yields an empty list.
///
/// # Errors
/// Returns an error if querying the history fails.
pub async fn history(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(q): Query<HistoryQuery>,
) -> AppResult<Json<HistoryResp>> {
    let limit = q.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    if limit <= 0 {
        return Ok(Json(HistoryResp { history: Vec::new() }));
    }
    let history = state
        .store
        .list_history(&user_id, limit.min(MAX_HISTORY_LIMIT))
        .await?;
    Ok(Json(HistoryResp { history }))
}

/// POST /recipes/save  (body: a full recipe)
///
/// # Errors
/// Returns a duplicate error if the caller already saved this recipe id.
pub async fn save(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(recipe): Json<Recipe>,
) -> AppResult<Json<JsonValue>> {
    if recipe.id.trim().is_empty() {
        return Err(AppError::BadRequest("recipe id must not be empty".into()));
    }
    let row = state.store.save_recipe(&user_id, &recipe).await?;
    Ok(Json(json!({ "status": "saved", "recipe_id": row.recipe_id })))
}

/// DELETE /recipes/save/{recipe_id}
///
/// # Errors
/// Returns an error if deleting fails; removing nothing is not an error.
pub async fn unsave(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(recipe_id): Path<String>,
) -> AppResult<Json<JsonValue>> {
    let deleted = state.store.unsave_recipe(&user_id, &recipe_id).await?;
    Ok(Json(json!({ "status": "removed", "deleted": deleted })))
}

#[derive(Serialize)]
pub struct SavedResp {
    pub recipes: Vec<SavedRecipeRow>,
}

/// GET /recipes/saved
///
/// # Errors
/// Returns an error if querying saved recipes fails.
pub async fn saved(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> AppResult<Json<SavedResp>> {
    let recipes = state.store.list_saved(&user_id).await?;
    Ok(Json(SavedResp { recipes }))
}

/// GET /recipes/test
/// Unauthenticated end-to-end check of completion + image lookup.
pub async fn test_generation(State(state): State<AppState>) -> Json<JsonValue> {
    match generate_recipe(&state, &UserPreferences::default(), &[]).await {
        Ok(recipe) => {
            let image = recipe.image_url.clone();
            Json(json!({ "status": "success", "recipe": recipe, "image": image }))
        }
        Err(e) => {
            tracing::warn!(error = %e, "diagnostic generation failed");
            Json(json!({ "status": "error", "message": e.to_string() }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_titles_keeps_most_recent_ten() {
        let titles: Vec<String> = (0..14).map(|i| format!("Dish {i}")).collect();
        let kept = bounded_titles(titles);
        assert_eq!(kept.len(), 10);
        assert_eq!(kept.first().map(String::as_str), Some("Dish 4"));
        assert_eq!(kept.last().map(String::as_str), Some("Dish 13"));
    }

    #[test]
    fn bounded_titles_drops_blanks() {
        let kept = bounded_titles(vec!["".into(), "Soup".into(), "  ".into()]);
        assert_eq!(kept, ["Soup"]);
    }
}
