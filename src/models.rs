use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use sqlx::types::Json;

use crate::{
    auth::JwtVerifier, images::ImageResolver, llm::LlmClient, preferences::UserPreferences,
    store::Store,
};

/* ---------- App state ---------- */
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub http: reqwest::Client,
    pub llm: LlmClient,
    pub images: ImageResolver,
    pub jwt: JwtVerifier,
}

/* ---------- Recipe ---------- */

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Macros {
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RecipeStep {
    pub step_number: u32,
    pub instruction: String,
}

/// What the model is asked to produce: a recipe without id or image.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct GeneratedRecipe {
    pub title: String,
    pub description: String,
    pub cook_time: u32,
    pub tags: Vec<String>,
    pub ingredients: Vec<String>,
    pub steps: Vec<RecipeStep>,
    pub macros: Macros,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Recipe {
    pub id: String,
    pub image_url: String,
    pub title: String,
    pub description: String,
    pub cook_time: u32,
    pub tags: Vec<String>,
    pub ingredients: Vec<String>,
    pub steps: Vec<RecipeStep>,
    pub macros: Macros,
}

impl Recipe {
    #[must_use]
    pub fn from_generated(id: String, image_url: String, g: GeneratedRecipe) -> Self {
        Self {
            id,
            image_url,
            title: g.title,
            description: g.description,
            cook_time: g.cook_time,
            tags: g.tags,
            ingredients: g.ingredients,
            steps: g.steps,
            macros: g.macros,
        }
    }
}

/* ---------- Requests ---------- */

#[derive(Deserialize, Debug)]
pub struct GenerateRecipeReq {
    #[serde(default)]
    pub preferences: UserPreferences,
    /// When absent, the caller's recent history is used instead.
    #[serde(default)]
    pub existing_recipes: Option<Vec<String>>,
}

#[derive(Deserialize, Debug)]
pub struct ModifyRecipeReq {
    pub original_recipe: JsonValue,
    pub modification: String,
}

/* ---------- Stored rows ---------- */

#[derive(Serialize, FromRow, Clone, Debug)]
pub struct HistoryRow {
    pub id: i64,
    pub user_id: String,
    pub recipe_id: String,
    pub title: String,
    pub recipe_data: Json<Recipe>,
    pub created_at: String,
}

#[derive(Serialize, FromRow, Clone, Debug)]
pub struct SavedRecipeRow {
    pub id: i64,
    pub user_id: String,
    pub recipe_id: String,
    pub recipe_data: Json<Recipe>,
    pub created_at: String,
}
