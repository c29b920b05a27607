// ============================
// crates/backend-lib/src/handlers/oauth.rs
// ============================
//! Identity provider redirect and callback.
use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use lem_common::{OAuthCallbackQuery, OAuthLoginResponse, UserSummary};

use crate::error::AppError;
use crate::AppState;

/// `GET /api/v1/auth/google/login`
pub async fn login_redirect(State(state): State<Arc<AppState>>) -> Response {
    match state.auth.oauth_authorization_url() {
        Some((url, _state)) => Redirect::temporary(&url).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// `GET /api/v1/auth/google/callback?code=...`
pub async fn callback(
    State(state): State<Arc<AppState>>,
    query: Result<Query<OAuthCallbackQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    if state.auth.identity_provider().is_none() {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }

    let Query(query) = query.map_err(|rejection| AppError::InvalidInput(rejection.body_text()))?;
    if query.code.is_empty() {
        return Err(AppError::InvalidInput("Authorization code is missing".to_string()));
    }

    let result = state.auth.oauth_callback(&query.code).await?;
    let body = OAuthLoginResponse {
        message: "Login successful".to_string(),
        user: UserSummary {
            email: result.user.email,
            role: result.user.role,
        },
        access_token: result.access_token,
        refresh_token: result.refresh_token,
    };
    Ok(Json(body).into_response())
}
