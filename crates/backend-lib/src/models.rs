// ============================
// crates/backend-lib/src/models.rs
// ============================
//! Persisted records: user accounts and pending one-time codes.
use chrono::{DateTime, Utc};
use lem_common::Role;
use serde::{Deserialize, Serialize};

/// Provider value used by accounts that sign in with a password
pub const LOCAL_PROVIDER: &str = "local";

/// A user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned identifier
    pub id: String,
    /// Unique across all accounts, compared case-sensitively
    pub email: String,
    /// Absent for accounts created through an identity provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub role: Role,
    /// Empty for local accounts, e.g. `"google"` otherwise
    #[serde(default)]
    pub provider: String,
    /// External identity id, unique per provider
    #[serde(default)]
    pub provider_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// True when the account signs in with a password rather than a provider
    pub fn is_local(&self) -> bool {
        self.provider.is_empty() || self.provider == LOCAL_PROVIDER
    }
}

/// Fields supplied when inserting a user directly
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub role: Role,
    pub provider: String,
    pub provider_id: String,
}

/// `(provider, provider_id)` key of an externally authenticated account
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderIdentity {
    pub provider: String,
    pub provider_id: String,
}

impl ProviderIdentity {
    pub fn new(provider: impl Into<String>, provider_id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            provider_id: provider_id.into(),
        }
    }
}

/// Outstanding password reset code. At most one per email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRecord {
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl OtpRecord {
    /// Still usable at `now`
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}
