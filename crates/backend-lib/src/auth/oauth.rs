// ============================
// crates/backend-lib/src/auth/oauth.rs
// ============================
//! Sign-in through an external identity provider.
//!
//! An [`IdentityProvider`] turns an authorization code into a profile.
//! [`OAuthService`] maps that profile onto a local account with one store
//! upsert keyed by `(provider, provider_id)`, then mints tokens for it.
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use reqwest::Url;
use serde::Deserialize;

use crate::auth::token::TokenIssuer;
use crate::auth::token_generator::generate_secure_token;
use crate::clock::Clock;
use crate::config::GoogleSettings;
use crate::error::AuthError;
use crate::metrics::OAUTH_LOGIN;
use crate::models::{ProviderIdentity, User};
use crate::storage::Store;

/// Profile returned by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProfile {
    pub external_id: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// An external identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Value stored in `User::provider`
    fn name(&self) -> &str;

    /// Where to send the browser to start sign-in
    fn authorization_url(&self, state: &str) -> String;

    /// Trade an authorization code for a provider access token
    async fn exchange_authorization_code(&self, code: &str) -> Result<String, AuthError>;

    async fn fetch_profile(&self, access_token: &str) -> Result<ExternalProfile, AuthError>;
}

const GOOGLE_PROVIDER: &str = "google";
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const GOOGLE_SCOPES: &str = "openid email profile";

#[derive(Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct GoogleUserInfo {
    id: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
}

/// Google OAuth 2.0 web flow
pub struct GoogleProvider {
    settings: GoogleSettings,
    http: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(settings: GoogleSettings) -> Self {
        Self {
            settings,
            http: reqwest::Client::new(),
        }
    }
}

fn upstream(context: &str, err: reqwest::Error) -> AuthError {
    AuthError::Upstream(format!("{context}: {err}"))
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn name(&self) -> &str {
        GOOGLE_PROVIDER
    }

    fn authorization_url(&self, state: &str) -> String {
        let params = [
            ("client_id", self.settings.client_id.as_str()),
            ("redirect_uri", self.settings.redirect_url.as_str()),
            ("response_type", "code"),
            ("scope", GOOGLE_SCOPES),
            ("state", state),
        ];
        match Url::parse_with_params(GOOGLE_AUTH_URL, &params) {
            Ok(url) => url.into(),
            Err(_) => GOOGLE_AUTH_URL.to_string(),
        }
    }

    async fn exchange_authorization_code(&self, code: &str) -> Result<String, AuthError> {
        let form = [
            ("code", code),
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
            ("redirect_uri", self.settings.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ];
        let response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&form)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| upstream("code exchange failed", e))?;

        let token: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| upstream("invalid token response", e))?;
        Ok(token.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ExternalProfile, AuthError> {
        let info: GoogleUserInfo = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| upstream("userinfo request failed", e))?
            .json()
            .await
            .map_err(|e| upstream("invalid userinfo response", e))?;

        Ok(ExternalProfile {
            external_id: info.id,
            email: info.email,
            display_name: info.name,
        })
    }
}

/// Result of a completed provider sign-in
#[derive(Debug, Clone)]
pub struct OAuthResult {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

pub struct OAuthService {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn Store>,
    tokens: Arc<TokenIssuer>,
    clock: Arc<dyn Clock>,
}

impl OAuthService {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn Store>,
        tokens: Arc<TokenIssuer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            store,
            tokens,
            clock,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Provider redirect plus the random state embedded in it
    pub fn authorization_url(&self) -> (String, String) {
        let state = generate_secure_token();
        (self.provider.authorization_url(&state), state)
    }

    /// Find or create the account for an external identity.
    ///
    /// New accounts get role `user`. Existing ones keep their id, role and
    /// creation time and take the provider's current email.
    pub async fn link_or_create(
        &self,
        provider: &str,
        provider_id: &str,
        email: &str,
    ) -> Result<User, AuthError> {
        let identity = ProviderIdentity::new(provider, provider_id);
        self.store
            .upsert_user_by_provider_identity(&identity, email, self.clock.now())
            .await?;

        self.store
            .find_user_by_provider_identity(&identity)
            .await?
            .ok_or(AuthError::NotFound)
    }

    /// Complete sign-in for an authorization code
    pub async fn handle_callback(&self, code: &str) -> Result<OAuthResult, AuthError> {
        let provider_token = self.provider.exchange_authorization_code(code).await?;
        let profile = self.provider.fetch_profile(&provider_token).await?;
        tracing::info!(provider = self.provider.name(), email = %profile.email, "fetched provider profile");

        let user = self
            .link_or_create(self.provider.name(), &profile.external_id, &profile.email)
            .await?;

        let access_token = self
            .tokens
            .issue_access_token(&user.id, &user.email, user.role)?;
        let refresh_token = self.tokens.issue_refresh_token(&user.id)?;

        counter!(OAUTH_LOGIN).increment(1);
        tracing::info!(provider = self.provider.name(), user_id = %user.id, "provider login succeeded");
        Ok(OAuthResult {
            user,
            access_token,
            refresh_token,
        })
    }
}
