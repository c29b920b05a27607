//! Flat-file store: a [`MemoryStore`] whose contents are written to a JSON
//! snapshot after every mutation and loaded back on open.
use std::{
    fs,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lem_common::Role;
use serde::{Deserialize, Serialize};
use tokio::{fs as tokio_fs, sync::Mutex};

use super::{MemoryStore, Store, StoreError};
use crate::models::{NewUser, OtpRecord, ProviderIdentity, User};

const SNAPSHOT_FILE: &str = "auth-store.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    otps: Vec<OtpRecord>,
}

/// Flat-file implementation of the [`Store`] trait
#[derive(Debug)]
pub struct FlatFileStore {
    root: PathBuf,
    inner: MemoryStore,
    // serializes snapshot writes so a later state never gets overwritten by an earlier one
    write_lock: Mutex<()>,
}

impl FlatFileStore {
    /// Open (or create) the store rooted at `root`
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let path = root.join(SNAPSHOT_FILE);
        let snapshot: Snapshot = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            Snapshot::default()
        };

        let inner = MemoryStore::from_records(snapshot.users, snapshot.otps)?;
        tracing::debug!(path = %path.display(), users = inner.user_count(), "opened flat-file store");

        Ok(Self {
            root,
            inner,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the snapshot file
    pub fn snapshot_path(&self) -> PathBuf {
        self.root.join(SNAPSHOT_FILE)
    }

    /// Access to the in-memory view
    pub fn memory(&self) -> &MemoryStore {
        &self.inner
    }

    /// Apply `mutate` to the in-memory view and write the result out. When the
    /// write fails the previous content is put back and the error returned.
    async fn commit<T, F>(&self, mutate: F) -> Result<T, StoreError>
    where
        T: Send,
        F: FnOnce(&MemoryStore) -> Result<T, StoreError> + Send,
    {
        let _guard = self.write_lock.lock().await;
        let (users, otps) = self.inner.records();
        let value = mutate(&self.inner)?;

        if let Err(e) = self.write_snapshot().await {
            tracing::warn!(error = %e, "snapshot write failed, rolling back");
            if let Err(restore) = self.inner.replace_records(users, otps) {
                tracing::error!(error = %restore, "failed to restore previous store content");
            }
            return Err(e);
        }
        Ok(value)
    }

    async fn write_snapshot(&self) -> Result<(), StoreError> {
        let (users, otps) = self.inner.records();
        let json = serde_json::to_string_pretty(&Snapshot { users, otps })?;

        let path = self.snapshot_path();
        let tmp = self.root.join(format!("{SNAPSHOT_FILE}.tmp"));
        tokio_fs::write(&tmp, json).await?;
        tokio_fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for FlatFileStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_email(email).await
    }

    async fn find_user_by_provider_identity(
        &self,
        identity: &ProviderIdentity,
    ) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_provider_identity(identity).await
    }

    async fn find_user_by_role(&self, role: Role) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_role(role).await
    }

    async fn upsert_user_by_provider_identity(
        &self,
        identity: &ProviderIdentity,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.commit(|m| m.upsert_identity_sync(identity, email, now)).await
    }

    async fn update_user_password(
        &self,
        email: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.commit(|m| Ok(m.update_password_sync(email, password_hash, now)))
            .await
    }

    async fn touch_user(&self, id: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.commit(|m| {
            m.touch_sync(id, now);
            Ok(())
        })
        .await
    }

    async fn insert_user(&self, user: NewUser, now: DateTime<Utc>) -> Result<User, StoreError> {
        self.commit(|m| m.insert_sync(user, now)).await
    }

    async fn find_otp(
        &self,
        email: &str,
        code: &str,
        not_expired_at: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, StoreError> {
        self.inner.find_otp(email, code, not_expired_at).await
    }

    async fn upsert_otp(&self, record: OtpRecord) -> Result<(), StoreError> {
        self.commit(|m| {
            m.upsert_otp_sync(record);
            Ok(())
        })
        .await
    }

    async fn consume_otp(
        &self,
        email: &str,
        code: &str,
        not_expired_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.commit(|m| Ok(m.consume_otp_sync(email, code, not_expired_at)))
            .await
    }

    async fn delete_otp(&self, email: &str) -> Result<(), StoreError> {
        self.commit(|m| {
            m.delete_otp_sync(email);
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempdir().unwrap();
        let now = Utc::now();
        {
            let store = FlatFileStore::open(dir.path()).unwrap();
            store
                .insert_user(
                    NewUser {
                        email: "root@x.test".to_string(),
                        password_hash: Some("hash".to_string()),
                        role: Role::SuperAdmin,
                        provider: String::new(),
                        provider_id: String::new(),
                    },
                    now,
                )
                .await
                .unwrap();
            store
                .upsert_otp(OtpRecord {
                    email: "root@x.test".to_string(),
                    code: "424242".to_string(),
                    expires_at: now + Duration::minutes(5),
                })
                .await
                .unwrap();
        }

        let reopened = FlatFileStore::open(dir.path()).unwrap();
        let user = reopened
            .find_user_by_role(Role::SuperAdmin)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.email, "root@x.test");
        assert!(reopened
            .find_otp("root@x.test", "424242", now)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn delete_is_persisted() {
        let dir = tempdir().unwrap();
        let now = Utc::now();
        let store = FlatFileStore::open(dir.path()).unwrap();
        store
            .upsert_otp(OtpRecord {
                email: "a@x.test".to_string(),
                code: "111111".to_string(),
                expires_at: now + Duration::minutes(5),
            })
            .await
            .unwrap();
        store.delete_otp("a@x.test").await.unwrap();

        let reopened = FlatFileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.memory().otp_count(), 0);
    }

    #[tokio::test]
    async fn failed_write_leaves_memory_unchanged() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("store");
        let now = Utc::now();
        let store = FlatFileStore::open(&root).unwrap();
        store
            .upsert_otp(OtpRecord {
                email: "a@x.test".to_string(),
                code: "111111".to_string(),
                expires_at: now + Duration::minutes(5),
            })
            .await
            .unwrap();

        std::fs::remove_dir_all(&root).unwrap();

        let err = store
            .upsert_otp(OtpRecord {
                email: "a@x.test".to_string(),
                code: "222222".to_string(),
                expires_at: now + Duration::minutes(5),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert_eq!(store.memory().pending_otp("a@x.test").unwrap().code, "111111");

        assert!(store.consume_otp("a@x.test", "111111", now).await.is_err());
        assert_eq!(store.memory().otp_count(), 1);

        let insert = store
            .insert_user(
                NewUser {
                    email: "b@x.test".to_string(),
                    password_hash: None,
                    role: Role::User,
                    provider: String::new(),
                    provider_id: String::new(),
                },
                now,
            )
            .await;
        assert!(insert.is_err());
        assert_eq!(store.memory().user_count(), 0);
    }

    #[tokio::test]
    async fn consumed_code_stays_consumed_after_reopen() {
        let dir = tempdir().unwrap();
        let now = Utc::now();
        let store = FlatFileStore::open(dir.path()).unwrap();
        store
            .upsert_otp(OtpRecord {
                email: "a@x.test".to_string(),
                code: "333333".to_string(),
                expires_at: now + Duration::minutes(5),
            })
            .await
            .unwrap();
        assert!(store.consume_otp("a@x.test", "333333", now).await.unwrap());

        let reopened = FlatFileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.memory().otp_count(), 0);
    }

    #[test]
    fn corrupt_snapshot_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(SNAPSHOT_FILE), "not json").unwrap();
        assert!(matches!(
            FlatFileStore::open(dir.path()),
            Err(StoreError::Json(_))
        ));
    }
}
