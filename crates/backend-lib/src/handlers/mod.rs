// ============================
// crates/backend-lib/src/handlers/mod.rs
// ============================
//! HTTP handlers.
pub mod auth;
pub mod oauth;

use axum::{extract::rejection::JsonRejection, Json};
use serde_json::{json, Value};

use crate::error::AppError;

/// Liveness check
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Turn a body rejection into the uniform error shape
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))
}
