use axum::{http::StatusCode, http::Uri, Json};
use serde_json::{json, Value};

use crate::error::AppError;

pub mod auth;
pub mod comments;
pub mod users;

pub async fn root() -> &'static str {
    "Movieflix API is running..."
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Not Found - {}", uri.path()))
}
