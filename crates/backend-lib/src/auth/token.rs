// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
//! Signed, expiring bearer tokens.
//!
//! All tokens are HS256 JWTs signed with one process-wide secret. Three kinds
//! are minted: access tokens (user id, email, role; 15 minutes), refresh tokens
//! (user id only; 7 days) and reset-capability tokens (`RESET:<email>`, role
//! `reset_only`; 15 minutes). Nothing is persisted. Validation checks the
//! signature, the claim shape and `exp` against the injected [`Clock`]; it
//! knows nothing about where a token is being used.
use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use lem_common::{Role, RESET_ONLY_ROLE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::Clock;

/// Access token lifetime in seconds (15 minutes)
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;
/// Refresh token lifetime in seconds (7 days)
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;
/// Reset-capability token lifetime in seconds (15 minutes)
pub const RESET_TOKEN_TTL_SECS: i64 = 15 * 60;

/// Subject prefix of reset-capability tokens
pub const RESET_SUBJECT_PREFIX: &str = "RESET:";

/// Token failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("signing secret is not configured")]
    Config,

    #[error("malformed token")]
    Malformed,

    #[error("bad signature")]
    BadSignature,

    #[error("token expired")]
    Expired,

    #[error("failed to encode token: {0}")]
    Encoding(String),
}

/// Claims carried by every token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, or `RESET:<email>` on reset-capability tokens
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// The user's role, or `reset_only`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// True for tokens minted by [`TokenIssuer::issue_reset_token`]
    pub fn is_reset_only(&self) -> bool {
        self.role.as_deref() == Some(RESET_ONLY_ROLE)
    }
}

/// Signing configuration
#[derive(Clone, Default)]
pub struct TokenSettings {
    /// HMAC secret. `None` or empty makes every operation fail with [`TokenError::Config`].
    pub secret: Option<String>,
}

impl TokenSettings {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
        }
    }
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Mints and validates tokens
pub struct TokenIssuer {
    settings: TokenSettings,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(settings: TokenSettings, clock: Arc<dyn Clock>) -> Self {
        Self { settings, clock }
    }

    fn secret(&self) -> Result<&[u8], TokenError> {
        match self.settings.secret.as_deref() {
            Some(secret) if !secret.is_empty() => Ok(secret.as_bytes()),
            _ => Err(TokenError::Config),
        }
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        let key = EncodingKey::from_secret(self.secret()?);
        encode(&Header::new(Algorithm::HS256), claims, &key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    fn claims(&self, sub: String, email: Option<String>, role: Option<String>, ttl_secs: i64) -> Claims {
        let now = self.clock.now();
        Claims {
            sub,
            email,
            role,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        }
    }

    /// Short-lived token identifying a user and their role
    pub fn issue_access_token(&self, user_id: &str, email: &str, role: Role) -> Result<String, TokenError> {
        let claims = self.claims(
            user_id.to_string(),
            Some(email.to_string()),
            Some(role.as_str().to_string()),
            ACCESS_TOKEN_TTL_SECS,
        );
        self.sign(&claims)
    }

    /// Long-lived token carrying only the user id
    pub fn issue_refresh_token(&self, user_id: &str) -> Result<String, TokenError> {
        let claims = self.claims(user_id.to_string(), None, None, REFRESH_TOKEN_TTL_SECS);
        self.sign(&claims)
    }

    /// Token that authorizes exactly one thing: setting a new password for `email`
    pub fn issue_reset_token(&self, email: &str) -> Result<String, TokenError> {
        let claims = self.claims(
            format!("{RESET_SUBJECT_PREFIX}{email}"),
            Some(email.to_string()),
            Some(RESET_ONLY_ROLE.to_string()),
            RESET_TOKEN_TTL_SECS,
        );
        self.sign(&claims)
    }

    /// Verify signature and expiry and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        let key = DecodingKey::from_secret(self.secret()?);

        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is checked below against the injected clock
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        })?;

        if self.clock.now().timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }
}
