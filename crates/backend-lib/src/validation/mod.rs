// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request body validation.

use lem_common::{ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, VerifyOtpRequest};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::auth::{validate_password_strength, PasswordRequirements, MIN_PASSWORD_LENGTH};
use crate::error::AppError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit
const OTP_LENGTH: usize = 6;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid code: {0}")]
    InvalidCode(String),

    #[error("Invalid reset token: {0}")]
    InvalidResetToken(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

/// Validate an email address
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail("Email must not be empty".to_string()));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "Email must be at most {MAX_EMAIL_LENGTH} characters"
        )));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail("Email format is invalid".to_string()));
    }

    Ok(email)
}

/// Validate a submitted one-time code. Shape only; the store decides if it matches.
pub fn validate_otp_code(code: &str) -> ValidationResult<&str> {
    if code.is_empty() {
        return Err(ValidationError::InvalidCode("Code must not be empty".to_string()));
    }

    if code.len() != OTP_LENGTH || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidCode(format!(
            "Code must be {OTP_LENGTH} digits"
        )));
    }

    Ok(code)
}

/// Validate a new password chosen during reset
pub fn validate_new_password(password: &str) -> ValidationResult<&str> {
    if !validate_password_strength(password, &PasswordRequirements::default()) {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(password)
}

pub fn validate_login(req: &LoginRequest) -> ValidationResult<()> {
    validate_email(&req.email)?;
    if req.password.is_empty() {
        return Err(ValidationError::InvalidPassword(
            "Password must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_forgot_password(req: &ForgotPasswordRequest) -> ValidationResult<()> {
    validate_email(&req.email)?;
    Ok(())
}

pub fn validate_verify_otp(req: &VerifyOtpRequest) -> ValidationResult<()> {
    validate_email(&req.email)?;
    validate_otp_code(&req.code)?;
    Ok(())
}

pub fn validate_reset_password(req: &ResetPasswordRequest) -> ValidationResult<()> {
    if req.reset_token.trim().is_empty() {
        return Err(ValidationError::InvalidResetToken(
            "Reset token must not be empty".to_string(),
        ));
    }
    validate_new_password(&req.new_password)?;
    Ok(())
}
