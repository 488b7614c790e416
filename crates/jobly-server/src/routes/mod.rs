pub mod companies;
pub mod jobs;

use crate::error::ApiError;
use axum::Json;
use axum::http::Uri;
use serde_json::{Value, json};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}
