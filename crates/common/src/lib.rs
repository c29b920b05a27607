// ================
// crates/common/src/lib.rs
// ================
//! Common types shared between the `lem` auth server and its clients.
//! This module defines the JSON request and response bodies of the
//! authentication API and the role vocabulary carried in tokens.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role marker carried by reset-capability tokens. Never stored on a user.
pub const RESET_ONLY_ROLE: &str = "reset_only";

/// Generic body returned by forgot-password regardless of whether the account exists.
pub const RESET_REQUESTED_MESSAGE: &str = "If an account exists, an OTP has been sent.";

/// Account role
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Role::SuperAdmin),
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Local email/password login
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token pair returned by a successful login
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Start of the password reset flow
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Exchange an emailed one-time code for a reset token
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub code: String,
}

/// Commit a new password with a reset token
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ResetPasswordRequest {
    pub reset_token: String,
    pub new_password: String,
}

/// Plain acknowledgement body
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Body returned once an OTP has been accepted
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VerifyOtpResponse {
    pub message: String,
    pub reset_token: String,
}

/// Public view of the account that just signed in through a provider
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserSummary {
    pub email: String,
    pub role: Role,
}

/// Body returned by the OAuth callback
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OAuthLoginResponse {
    pub message: String,
    pub user: UserSummary,
    pub access_token: String,
    pub refresh_token: String,
}

/// Query string of the OAuth callback
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OAuthCallbackQuery {
    pub code: String,
    #[serde(default)]
    pub state: Option<String>,
}
