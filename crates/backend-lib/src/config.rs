// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Settings are merged from built-in defaults, an optional TOML file and
//! `LEM_`-prefixed environment variables, later sources winning. Nested keys
//! use a double underscore, e.g. `LEM_SUPERUSER__EMAIL`.
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::TokenSettings;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

const ENV_PREFIX: &str = "LEM_";
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const DEFAULT_SENDER: &str = "noreply@lem.local";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Load(Box::new(err))
    }
}

/// Application settings
#[derive(Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,
    /// Directory of the flat-file store
    pub data_dir: PathBuf,
    /// Per-request deadline
    pub request_timeout_secs: u64,
    /// Token signing secret. Required to serve requests.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// Account created at first start when no super_admin exists
    #[serde(default)]
    pub superuser: Option<SuperuserSettings>,
    /// Outbound mail relay. Codes are only logged when absent.
    #[serde(default)]
    pub smtp: Option<SmtpSettings>,
    /// Google sign-in. The provider routes answer 404 when absent.
    #[serde(default)]
    pub google: Option<GoogleSettings>,
}

/// Bootstrap super_admin credentials
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SuperuserSettings {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// SMTP relay
#[derive(Clone, Serialize, Deserialize)]
pub struct SmtpSettings {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Sender address; defaults to the username
    #[serde(default)]
    pub from: Option<String>,
}

/// Google OAuth client
#[derive(Clone, Serialize, Deserialize)]
pub struct GoogleSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

fn default_smtp_port() -> u16 {
    587
}

impl SmtpSettings {
    /// Address used in the `From` header
    pub fn sender(&self) -> String {
        self.from
            .clone()
            .or_else(|| self.username.clone())
            .unwrap_or_else(|| DEFAULT_SENDER.to_string())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_level: "info".to_string(),
            data_dir: PathBuf::from("data"),
            request_timeout_secs: 30,
            jwt_secret: None,
            superuser: None,
            smtp: None,
            google: None,
        }
    }
}

// Secrets stay out of logs
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("data_dir", &self.data_dir)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("superuser", &self.superuser.as_ref().and_then(|s| s.email.as_deref()))
            .field("smtp", &self.smtp.as_ref().map(|s| s.host.as_str()))
            .field("google", &self.google.as_ref().map(|g| g.client_id.as_str()))
            .finish()
    }
}

impl Settings {
    /// Load settings from `config.toml` and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load settings from the given TOML file (if it exists) and the environment
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings: Settings = Self::figment(path.as_ref()).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "log_level must be one of {VALID_LOG_LEVELS:?}, got {}",
                self.log_level
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if let Some(smtp) = &self.smtp {
            if smtp.host.trim().is_empty() {
                return Err(ConfigError::Invalid("smtp.host must not be empty".to_string()));
            }
        }
        Ok(())
    }

    /// Signing configuration handed to the token issuer
    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            secret: self.jwt_secret.clone(),
        }
    }

    /// True when a non-empty signing secret is present
    pub fn has_jwt_secret(&self) -> bool {
        self.jwt_secret.as_deref().is_some_and(|s| !s.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
