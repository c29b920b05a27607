// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core of the `lem-auth` service: credential checks, token lifecycle,
//! password reset by one-time code and provider sign-in, plus the HTTP
//! surface that exposes them.

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod mail;
pub mod metrics;
pub mod models;
pub mod router;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use crate::auth::{AuthService, DefaultAuth, GoogleProvider, IdentityProvider, TokenIssuer};
use crate::clock::Clock;
use crate::config::Settings;
use crate::error::AuthError;
use crate::mail::{LogMailer, Mailer, SmtpMailer};
use crate::storage::Store;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Settings
    pub settings: Arc<Settings>,
    /// Storage backend
    pub store: Arc<dyn Store>,
}

impl AppState {
    /// Build the production wiring: SMTP or log mailer, Google if configured
    pub fn new(settings: Settings, store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Result<Self, AuthError> {
        if !settings.has_jwt_secret() {
            return Err(AuthError::Config("jwt_secret must be set".to_string()));
        }

        let mailer: Arc<dyn Mailer> = match &settings.smtp {
            Some(smtp) => Arc::new(
                SmtpMailer::new(smtp).map_err(|e| AuthError::Config(format!("smtp: {e}")))?,
            ),
            None => {
                tracing::warn!("smtp not configured, reset codes will only be logged");
                Arc::new(LogMailer)
            },
        };
        let provider = settings
            .google
            .clone()
            .map(|google| Arc::new(GoogleProvider::new(google)) as Arc<dyn IdentityProvider>);

        let tokens = Arc::new(TokenIssuer::new(settings.token_settings(), clock.clone()));
        let auth = Arc::new(DefaultAuth::from_parts(store.clone(), mailer, tokens, clock, provider));

        Ok(Self::with_auth(settings, store, auth))
    }

    /// Assemble state around an already built service
    pub fn with_auth(settings: Settings, store: Arc<dyn Store>, auth: Arc<dyn AuthService>) -> Self {
        Self {
            auth,
            settings: Arc::new(settings),
            store,
        }
    }
}
