// ============================
// crates/backend-lib/src/auth/reset.rs
// ============================
//! Password reset by emailed one-time code.
//!
//! Per email the flow moves from no request, to a pending code (one at a time,
//! a new request replaces the old code), to a consumed code that has been
//! exchanged for a reset-capability token. The token is the only thing
//! [`PasswordResetService::reset_password`] accepts.
use std::sync::Arc;

use metrics::counter;

use crate::auth::otp::new_otp_record;
use crate::auth::password::hash_password;
use crate::auth::token::TokenIssuer;
use crate::clock::Clock;
use crate::error::AuthError;
use crate::mail::Mailer;
use crate::metrics::{MAIL_FAILED, OTP_ISSUED, OTP_REJECTED, OTP_VERIFIED, PASSWORD_RESET};
use crate::storage::Store;

/// What happened on a reset request. Callers must render both the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetRequestOutcome {
    /// A code was stored and handed to the mailer
    CodeIssued,
    /// No account with that email
    Concealed,
}

/// Drives the reset flow against a store, a mailer and the token issuer
pub struct PasswordResetService {
    store: Arc<dyn Store>,
    mailer: Arc<dyn Mailer>,
    tokens: Arc<TokenIssuer>,
    clock: Arc<dyn Clock>,
}

impl PasswordResetService {
    pub fn new(
        store: Arc<dyn Store>,
        mailer: Arc<dyn Mailer>,
        tokens: Arc<TokenIssuer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            mailer,
            tokens,
            clock,
        }
    }

    /// Issue a code for `email` and mail it.
    ///
    /// Accounts that sign in through a provider are refused. Delivery failures
    /// are logged and otherwise ignored.
    pub async fn request_reset(&self, email: &str) -> Result<ResetRequestOutcome, AuthError> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            tracing::info!(email, "reset requested for unknown email");
            return Ok(ResetRequestOutcome::Concealed);
        };

        if !user.is_local() {
            return Err(AuthError::UnsupportedProvider(user.provider));
        }

        let record = new_otp_record(email, self.clock.now());
        let code = record.code.clone();
        self.store.upsert_otp(record).await?;
        counter!(OTP_ISSUED).increment(1);

        // delivery runs detached so known and unknown emails answer alike
        let mailer = Arc::clone(&self.mailer);
        let to = email.to_string();
        tokio::spawn(async move {
            if let Err(e) = mailer.send_otp_email(&to, &code).await {
                counter!(MAIL_FAILED).increment(1);
                tracing::warn!(email = %to, error = %e, "failed to send reset code email");
            }
        });

        tracing::info!(email, "reset code issued");
        Ok(ResetRequestOutcome::CodeIssued)
    }

    /// Consume a live code and return a reset-capability token.
    ///
    /// A code is accepted at most once, also under concurrent calls.
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<String, AuthError> {
        let now = self.clock.now();
        if !self.store.consume_otp(email, code, now).await? {
            counter!(OTP_REJECTED).increment(1);
            return Err(AuthError::InvalidOrExpiredOtp);
        }

        let token = self.tokens.issue_reset_token(email)?;

        counter!(OTP_VERIFIED).increment(1);
        tracing::info!(email, "reset code verified");
        Ok(token)
    }

    /// Set a new password for the account named by a reset-capability token
    pub async fn reset_password(&self, reset_token: &str, new_password: &str) -> Result<(), AuthError> {
        let claims = self
            .tokens
            .validate_token(reset_token)
            .map_err(|_| AuthError::InvalidResetToken)?;

        if !claims.is_reset_only() {
            return Err(AuthError::InvalidResetToken);
        }
        let email = match claims.email.as_deref() {
            Some(email) if !email.is_empty() => email,
            _ => return Err(AuthError::InvalidResetToken),
        };

        let hash = hash_password(new_password)
            .map_err(|e| AuthError::Config(format!("password hashing failed: {e}")))?;

        let matched = self
            .store
            .update_user_password(email, &hash, self.clock.now())
            .await?;
        if !matched {
            // the account vanished between verification and reset
            tracing::warn!(email, "password reset matched no account");
        }

        counter!(PASSWORD_RESET).increment(1);
        tracing::info!(email, "password reset");
        Ok(())
    }
}
