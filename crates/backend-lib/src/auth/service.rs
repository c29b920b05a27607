use async_trait::async_trait;

use super::{LoginResult, OAuthResult, ResetRequestOutcome};
use crate::error::AuthError;

/// Every authentication operation the HTTP layer calls
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError>;
    async fn request_reset(&self, email: &str) -> Result<ResetRequestOutcome, AuthError>;
    async fn verify_otp(&self, email: &str, code: &str) -> Result<String, AuthError>;
    async fn reset_password(&self, reset_token: &str, new_password: &str) -> Result<(), AuthError>;

    /// Name of the configured identity provider, if any
    fn identity_provider(&self) -> Option<&str>;
    /// Provider redirect URL and state, `None` without a provider
    fn oauth_authorization_url(&self) -> Option<(String, String)>;
    async fn oauth_callback(&self, code: &str) -> Result<OAuthResult, AuthError>;
}
