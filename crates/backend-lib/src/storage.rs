// ============================
// crates/backend-lib/src/storage.rs
// ============================
//! Storage abstraction for users and one-time codes.
//!
//! Every mutating call is a single atomic step in the implementing store.
//! The reset and OAuth flows rely on that: replacing a pending code and
//! upserting an identity are never read-then-write sequences on the caller side.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lem_common::Role;
use thiserror::Error;

use crate::models::{NewUser, OtpRecord, ProviderIdentity, User};

mod flat_file;
mod memory;

pub use flat_file::FlatFileStore;
pub use memory::MemoryStore;

/// Store failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Trait for storage backends
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_provider_identity(
        &self,
        identity: &ProviderIdentity,
    ) -> Result<Option<User>, StoreError>;

    /// Any one user holding `role`
    async fn find_user_by_role(&self, role: Role) -> Result<Option<User>, StoreError>;

    /// Insert-or-update keyed by `identity`. A new row gets role `user` and
    /// `created_at = now`; every call sets `email` and `updated_at = now`.
    async fn upsert_user_by_provider_identity(
        &self,
        identity: &ProviderIdentity,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Returns whether a row matched `email`
    async fn update_user_password(
        &self,
        email: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Bump `updated_at`
    async fn touch_user(&self, id: &str, now: DateTime<Utc>) -> Result<(), StoreError>;

    async fn insert_user(&self, user: NewUser, now: DateTime<Utc>) -> Result<User, StoreError>;

    /// The record for `email` whose code equals `code` and that is still live at `not_expired_at`
    async fn find_otp(
        &self,
        email: &str,
        code: &str,
        not_expired_at: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, StoreError>;

    /// Replace whatever record `record.email` had
    async fn upsert_otp(&self, record: OtpRecord) -> Result<(), StoreError>;

    /// Remove the record for `email` if its code equals `code` and it is live at
    /// `not_expired_at`. Check and removal are one step; returns whether a record went.
    async fn consume_otp(
        &self,
        email: &str,
        code: &str,
        not_expired_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    async fn delete_otp(&self, email: &str) -> Result<(), StoreError>;
}
