//! Shared setup for integration tests.
//!
//! Builds an [`AppState`] over a flat-file store in a temporary directory,
//! with a manual clock, a mailer that records every code it is asked to send
//! and a scripted identity provider.
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use backend_lib::{
    auth::{
        init_superuser, BootstrapOutcome, DefaultAuth, ExternalProfile, IdentityProvider,
        TokenIssuer, TokenSettings,
    },
    clock::ManualClock,
    config::{Settings, SuperuserSettings},
    error::AuthError,
    mail::{MailError, Mailer},
    storage::FlatFileStore,
    AppState,
};
use parking_lot::Mutex;
use tempfile::TempDir;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const ADMIN_EMAIL: &str = "admin@x.test";
pub const ADMIN_PASSWORD: &str = "Sup3rSecret";

/// Mailer that keeps every message instead of sending it
#[derive(Default)]
pub struct CapturingMailer {
    sent: Mutex<Vec<(String, String)>>,
    read: Mutex<usize>,
}

impl CapturingMailer {
    /// Next code mailed to `email` that no earlier call returned.
    ///
    /// Delivery runs on a spawned task, so this waits for it.
    pub async fn next_code_for(&self, email: &str) -> String {
        let wait = async {
            loop {
                if let Some(code) = self.take_next(email) {
                    return code;
                }
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(std::time::Duration::from_secs(5), wait)
            .await
            .unwrap_or_else(|_| panic!("no code mailed to {email}"))
    }

    fn take_next(&self, email: &str) -> Option<String> {
        let sent = self.sent.lock();
        let mut read = self.read.lock();
        let (offset, (_, code)) = sent[*read..]
            .iter()
            .enumerate()
            .find(|(_, (to, _))| to == email)?;
        *read += offset + 1;
        Some(code.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send_otp_email(&self, to: &str, code: &str) -> Result<(), MailError> {
        self.sent.lock().push((to.to_string(), code.to_string()));
        Ok(())
    }
}

/// Provider that accepts one code and returns a configurable profile
pub struct ScriptedProvider {
    pub profile: Mutex<ExternalProfile>,
}

impl ScriptedProvider {
    pub fn new(external_id: &str, email: &str) -> Self {
        Self {
            profile: Mutex::new(ExternalProfile {
                external_id: external_id.to_string(),
                email: email.to_string(),
                display_name: None,
            }),
        }
    }

    pub fn set_email(&self, email: &str) {
        self.profile.lock().email = email.to_string();
    }
}

#[async_trait]
impl IdentityProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn authorization_url(&self, state: &str) -> String {
        format!("https://idp.test/authorize?state={state}")
    }

    async fn exchange_authorization_code(&self, code: &str) -> Result<String, AuthError> {
        match code {
            "valid-code" => Ok("idp-access-token".to_string()),
            _ => Err(AuthError::Upstream("code rejected".to_string())),
        }
    }

    async fn fetch_profile(&self, _access_token: &str) -> Result<ExternalProfile, AuthError> {
        Ok(self.profile.lock().clone())
    }
}

pub struct TestEnv {
    pub state: Arc<AppState>,
    pub store: Arc<FlatFileStore>,
    pub mailer: Arc<CapturingMailer>,
    pub provider: Arc<ScriptedProvider>,
    pub clock: Arc<ManualClock>,
    pub tokens: Arc<TokenIssuer>,
    // dropped last so the store directory outlives the test
    pub temp_dir: TempDir,
}

/// Full environment with the admin account already bootstrapped
pub async fn setup_test_env() -> TestEnv {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FlatFileStore::open(temp_dir.path()).unwrap());
    let clock = Arc::new(ManualClock::starting_now());
    let mailer = Arc::new(CapturingMailer::default());
    let provider = Arc::new(ScriptedProvider::new("google-sub-1", "grace@x.test"));
    let tokens = Arc::new(TokenIssuer::new(TokenSettings::new(TEST_SECRET), clock.clone()));

    let mut settings = Settings::default();
    settings.data_dir = temp_dir.path().to_path_buf();
    settings.jwt_secret = Some(TEST_SECRET.to_string());
    settings.superuser = Some(SuperuserSettings {
        email: Some(ADMIN_EMAIL.to_string()),
        password: Some(ADMIN_PASSWORD.to_string()),
    });

    let outcome = init_superuser(&*store, settings.superuser.as_ref(), &*clock)
        .await
        .unwrap();
    assert_eq!(outcome, BootstrapOutcome::Created);

    let auth = Arc::new(DefaultAuth::from_parts(
        store.clone(),
        mailer.clone(),
        tokens.clone(),
        clock.clone(),
        Some(provider.clone() as Arc<dyn IdentityProvider>),
    ));
    let state = Arc::new(AppState::with_auth(settings, store.clone(), auth));

    TestEnv {
        state,
        store,
        mailer,
        provider,
        clock,
        tokens,
        temp_dir,
    }
}
