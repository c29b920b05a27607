// crates/backend-lib/src/error.rs

//! Central error types + Axum integration.
//!
//! [`AuthError`] is the closed set of failures the credential and token
//! operations can return. [`AppError`] is what HTTP handlers return; it wraps
//! [`AuthError`] and adds request-level failures.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::TokenError;
use crate::storage::StoreError;

/// Failures of the authentication core
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Not found")]
    NotFound,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired OTP")]
    InvalidOrExpiredOtp,

    #[error("Account uses social login through {0}")]
    UnsupportedProvider(String),

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("Failed to generate tokens")]
    TokenGenerationFailed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Identity provider error: {0}")]
    Upstream(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::NotFound | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::InvalidOrExpiredOtp | AuthError::InvalidResetToken => {
                StatusCode::UNAUTHORIZED
            },
            AuthError::UnsupportedProvider(_) => StatusCode::CONFLICT,
            AuthError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AuthError::TokenGenerationFailed | AuthError::Config(_) | AuthError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            // a missing account must look exactly like a wrong password
            AuthError::NotFound | AuthError::InvalidCredentials => "AUTH_001",
            AuthError::InvalidOrExpiredOtp => "AUTH_002",
            AuthError::InvalidResetToken => "AUTH_003",
            AuthError::UnsupportedProvider(_) => "AUTH_004",
            AuthError::TokenGenerationFailed => "TOKEN_001",
            AuthError::Config(_) => "CFG_001",
            AuthError::Storage(_) => "STORE_001",
            AuthError::Upstream(_) => "UPSTREAM_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AuthError::NotFound | AuthError::InvalidCredentials => {
                "Invalid email or password".to_string()
            },
            AuthError::InvalidOrExpiredOtp => "Invalid or expired OTP".to_string(),
            AuthError::InvalidResetToken => "Invalid or expired reset token".to_string(),
            AuthError::UnsupportedProvider(_) => {
                "This account uses social login. Please use the social provider to sign in."
                    .to_string()
            },
            AuthError::TokenGenerationFailed => "Failed to generate tokens".to_string(),
            AuthError::Config(_) => "Server is misconfigured".to_string(),
            AuthError::Storage(_) => "An internal server error occurred".to_string(),
            AuthError::Upstream(_) => "Identity provider request failed".to_string(),
        }
    }

    /// Whether the detailed message may be shown to a caller.
    /// Authentication failures never carry detail.
    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            AuthError::Config(_) | AuthError::Storage(_) | AuthError::Upstream(_)
        )
    }
}

/// Errors returned by HTTP handlers
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(err) => err.status_code(),
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Auth(err) => err.error_code(),
            AppError::InvalidInput(_) => "VAL_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Auth(err) => err.sanitized_message(),
            AppError::InvalidInput(_) => "Invalid input provided".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Auth(err) if err.is_operational() && cfg!(debug_assertions) => {
                err.to_string()
            },
            AppError::Auth(err) => err.sanitized_message(),
            AppError::InvalidInput(_) => self.to_string(),
            AppError::Internal(_) if cfg!(debug_assertions) => self.to_string(),
            AppError::Internal(_) => self.sanitized_message(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.message();

        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Config => AuthError::Config(err.to_string()),
            _ => AuthError::TokenGenerationFailed,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Auth(AuthError::Storage(err))
    }
}
