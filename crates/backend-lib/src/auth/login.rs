// ============================
// crates/backend-lib/src/auth/login.rs
// ============================
//! Email and password login.
use std::sync::{Arc, LazyLock};

use metrics::counter;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::TokenIssuer;
use crate::clock::Clock;
use crate::error::AuthError;
use crate::metrics::{LOGIN_FAILED, LOGIN_SUCCEEDED};
use crate::storage::Store;

/// Token pair handed out on a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
    pub access_token: String,
    pub refresh_token: String,
}

/// Checked against when there is no stored hash, so every rejection pays one Argon2 verify
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("no-such-account").ok());

pub struct LoginService {
    store: Arc<dyn Store>,
    tokens: Arc<TokenIssuer>,
    clock: Arc<dyn Clock>,
}

impl LoginService {
    pub fn new(store: Arc<dyn Store>, tokens: Arc<TokenIssuer>, clock: Arc<dyn Clock>) -> Self {
        Self { store, tokens, clock }
    }

    /// Check a password and mint an access and refresh token.
    ///
    /// Unknown emails, provider-only accounts and wrong passwords all fail
    /// with [`AuthError::InvalidCredentials`].
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        let user = self.store.find_user_by_email(email).await?;

        let verified = match user.as_ref().and_then(|u| u.password_hash.as_deref()) {
            Some(hash) => verify_password(hash, password),
            None => {
                if let Some(hash) = DUMMY_HASH.as_deref() {
                    verify_password(hash, password);
                }
                false
            },
        };

        let Some(user) = user.filter(|_| verified) else {
            counter!(LOGIN_FAILED).increment(1);
            tracing::info!(email, "login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let access_token = self
            .tokens
            .issue_access_token(&user.id, &user.email, user.role)?;
        let refresh_token = self.tokens.issue_refresh_token(&user.id)?;

        // last-login bookkeeping only
        if let Err(e) = self.store.touch_user(&user.id, self.clock.now()).await {
            tracing::debug!(user_id = %user.id, error = %e, "failed to record login time");
        }

        counter!(LOGIN_SUCCEEDED).increment(1);
        tracing::info!(email, role = %user.role, "login succeeded");
        Ok(LoginResult {
            access_token,
            refresh_token,
        })
    }
}
