use axum::Json;
use serde_json::{Value as JsonValue, json};

pub async fn root() -> Json<JsonValue> {
    Json(json!({ "message": "FlavourFinder Backend API" }))
}

pub async fn health() -> Json<JsonValue> {
    Json(json!({ "status": "healthy" }))
}
