// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Login and password reset endpoints.
use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use lem_common::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, ResetPasswordRequest,
    VerifyOtpRequest, VerifyOtpResponse, RESET_REQUESTED_MESSAGE,
};

use super::json_body;
use crate::error::AppError;
use crate::validation;
use crate::AppState;

/// `POST /api/v1/auth/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let req = json_body(body)?;
    validation::validate_login(&req)?;

    let result = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(LoginResponse {
        access_token: result.access_token,
        refresh_token: result.refresh_token,
    }))
}

/// `POST /api/v1/auth/forgot-password`
///
/// Answers the same way whether or not the account exists.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let req = json_body(body)?;
    validation::validate_forgot_password(&req)?;

    let outcome = state.auth.request_reset(&req.email).await?;
    tracing::debug!(?outcome, "forgot-password handled");
    Ok(Json(MessageResponse::new(RESET_REQUESTED_MESSAGE)))
}

/// `POST /api/v1/auth/verify-otp`
pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    body: Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> Result<Json<VerifyOtpResponse>, AppError> {
    let req = json_body(body)?;
    validation::validate_verify_otp(&req)?;

    let reset_token = state.auth.verify_otp(&req.email, &req.code).await?;
    Ok(Json(VerifyOtpResponse {
        message: "OTP verified".to_string(),
        reset_token,
    }))
}

/// `POST /api/v1/auth/reset-password`
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let req = json_body(body)?;
    validation::validate_reset_password(&req)?;

    state
        .auth
        .reset_password(&req.reset_token, &req.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password has been reset successfully")))
}
