use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::{
    AuthService, IdentityProvider, LoginResult, LoginService, OAuthResult, OAuthService,
    PasswordResetService, ResetRequestOutcome, TokenIssuer,
};
use crate::clock::Clock;
use crate::error::AuthError;
use crate::mail::Mailer;
use crate::storage::Store;

pub struct DefaultAuth {
    login: LoginService,
    reset: PasswordResetService,
    oauth: Option<OAuthService>,
}

impl DefaultAuth {
    pub fn new(login: LoginService, reset: PasswordResetService, oauth: Option<OAuthService>) -> Self {
        Self { login, reset, oauth }
    }

    /// Wire every flow to the same store, issuer and clock
    pub fn from_parts(
        store: Arc<dyn Store>,
        mailer: Arc<dyn Mailer>,
        tokens: Arc<TokenIssuer>,
        clock: Arc<dyn Clock>,
        provider: Option<Arc<dyn IdentityProvider>>,
    ) -> Self {
        let login = LoginService::new(store.clone(), tokens.clone(), clock.clone());
        let reset = PasswordResetService::new(store.clone(), mailer, tokens.clone(), clock.clone());
        let oauth = provider.map(|p| OAuthService::new(p, store, tokens, clock));
        Self::new(login, reset, oauth)
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        self.login.login(email, password).await
    }

    async fn request_reset(&self, email: &str) -> Result<ResetRequestOutcome, AuthError> {
        self.reset.request_reset(email).await
    }

    async fn verify_otp(&self, email: &str, code: &str) -> Result<String, AuthError> {
        self.reset.verify_otp(email, code).await
    }

    async fn reset_password(&self, reset_token: &str, new_password: &str) -> Result<(), AuthError> {
        self.reset.reset_password(reset_token, new_password).await
    }

    fn identity_provider(&self) -> Option<&str> {
        self.oauth.as_ref().map(OAuthService::provider_name)
    }

    fn oauth_authorization_url(&self) -> Option<(String, String)> {
        self.oauth.as_ref().map(OAuthService::authorization_url)
    }

    async fn oauth_callback(&self, code: &str) -> Result<OAuthResult, AuthError> {
        match &self.oauth {
            Some(oauth) => oauth.handle_callback(code).await,
            None => Err(AuthError::Config("no identity provider configured".to_string())),
        }
    }
}
