//! In-process store.
//!
//! Users live behind one lock so that the email, identity and super_admin
//! uniqueness checks happen in the same critical section as the write.
//! One-time codes are independent per email and sit in a `DashMap`.
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use lem_common::Role;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::models::{NewUser, OtpRecord, ProviderIdentity, User, LOCAL_PROVIDER};

#[derive(Debug, Default)]
struct UserTable {
    by_id: HashMap<String, User>,
    id_by_email: HashMap<String, String>,
    id_by_identity: HashMap<ProviderIdentity, String>,
}

impl UserTable {
    fn get_by_email(&self, email: &str) -> Option<&User> {
        self.id_by_email.get(email).and_then(|id| self.by_id.get(id))
    }

    fn get_by_identity(&self, identity: &ProviderIdentity) -> Option<&User> {
        self.id_by_identity
            .get(identity)
            .and_then(|id| self.by_id.get(id))
    }

    fn email_taken_by_other(&self, email: &str, id: &str) -> bool {
        self.id_by_email
            .get(email)
            .is_some_and(|owner| owner != id)
    }

    fn insert(&mut self, user: User) -> Result<(), StoreError> {
        if self.id_by_email.contains_key(&user.email) {
            return Err(StoreError::Conflict(format!(
                "email {} already registered",
                user.email
            )));
        }
        let identity = (!user.is_local())
            .then(|| ProviderIdentity::new(user.provider.clone(), user.provider_id.clone()));
        if let Some(identity) = &identity {
            if self.id_by_identity.contains_key(identity) {
                return Err(StoreError::Conflict(format!(
                    "identity {}/{} already linked",
                    identity.provider, identity.provider_id
                )));
            }
        }
        if user.role == Role::SuperAdmin
            && self.by_id.values().any(|u| u.role == Role::SuperAdmin)
        {
            return Err(StoreError::Conflict("a super_admin already exists".to_string()));
        }

        self.id_by_email.insert(user.email.clone(), user.id.clone());
        if let Some(identity) = identity {
            self.id_by_identity.insert(identity, user.id.clone());
        }
        self.by_id.insert(user.id.clone(), user);
        Ok(())
    }

    fn change_email(&mut self, id: &str, email: &str) -> Result<(), StoreError> {
        if self.email_taken_by_other(email, id) {
            return Err(StoreError::Conflict(format!("email {email} already registered")));
        }
        let Some(user) = self.by_id.get_mut(id) else {
            return Ok(());
        };
        if user.email != email {
            self.id_by_email.remove(&user.email);
            self.id_by_email.insert(email.to_string(), id.to_string());
            user.email = email.to_string();
        }
        Ok(())
    }
}

/// Store kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<UserTable>,
    otps: DashMap<String, OtpRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from previously saved rows
    pub fn from_records(users: Vec<User>, otps: Vec<OtpRecord>) -> Result<Self, StoreError> {
        let store = Self::new();
        {
            let mut table = store.users.write();
            for user in users {
                table.insert(user)?;
            }
        }
        for otp in otps {
            store.otps.insert(otp.email.clone(), otp);
        }
        Ok(store)
    }

    /// Copy of every row, users sorted by creation time
    pub fn records(&self) -> (Vec<User>, Vec<OtpRecord>) {
        let mut users: Vec<User> = self.users.read().by_id.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        let mut otps: Vec<OtpRecord> = self.otps.iter().map(|e| e.value().clone()).collect();
        otps.sort_by(|a, b| a.email.cmp(&b.email));
        (users, otps)
    }

    /// The record pending for `email`, expired or not
    pub fn pending_otp(&self, email: &str) -> Option<OtpRecord> {
        self.otps.get(email).map(|e| e.value().clone())
    }

    pub fn otp_count(&self) -> usize {
        self.otps.len()
    }

    pub fn user_count(&self) -> usize {
        self.users.read().by_id.len()
    }

    /// Remove a user outright. Not part of [`Store`]; exposed for tests and tooling.
    pub fn remove_user(&self, email: &str) -> Option<User> {
        let mut table = self.users.write();
        let id = table.id_by_email.remove(email)?;
        let user = table.by_id.remove(&id)?;
        if !user.is_local() {
            table
                .id_by_identity
                .remove(&ProviderIdentity::new(user.provider.clone(), user.provider_id.clone()));
        }
        Some(user)
    }

    pub(crate) fn upsert_identity_sync(
        &self,
        identity: &ProviderIdentity,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if identity.provider.is_empty() || identity.provider_id.is_empty() {
            return Err(StoreError::InvalidRecord(
                "provider identity must not be empty".to_string(),
            ));
        }
        if identity.provider == LOCAL_PROVIDER {
            return Err(StoreError::InvalidRecord(
                "local accounts have no provider identity".to_string(),
            ));
        }

        let mut table = self.users.write();
        let existing = table.id_by_identity.get(identity).cloned();
        match existing {
            Some(id) => {
                table.change_email(&id, email)?;
                if let Some(user) = table.by_id.get_mut(&id) {
                    user.updated_at = now;
                }
                Ok(())
            },
            None => table.insert(User {
                id: Uuid::new_v4().to_string(),
                email: email.to_string(),
                password_hash: None,
                role: Role::User,
                provider: identity.provider.clone(),
                provider_id: identity.provider_id.clone(),
                created_at: now,
                updated_at: now,
            }),
        }
    }

    pub(crate) fn update_password_sync(
        &self,
        email: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let mut table = self.users.write();
        let Some(id) = table.id_by_email.get(email).cloned() else {
            return false;
        };
        match table.by_id.get_mut(&id) {
            Some(user) => {
                user.password_hash = Some(password_hash.to_string());
                user.updated_at = now;
                true
            },
            None => false,
        }
    }

    pub(crate) fn touch_sync(&self, id: &str, now: DateTime<Utc>) {
        if let Some(user) = self.users.write().by_id.get_mut(id) {
            user.updated_at = now;
        }
    }

    pub(crate) fn insert_sync(&self, new: NewUser, now: DateTime<Utc>) -> Result<User, StoreError> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            provider: new.provider,
            provider_id: new.provider_id,
            created_at: now,
            updated_at: now,
        };
        self.users.write().insert(user.clone())?;
        Ok(user)
    }

    pub(crate) fn upsert_otp_sync(&self, record: OtpRecord) {
        self.otps.insert(record.email.clone(), record);
    }

    pub(crate) fn delete_otp_sync(&self, email: &str) {
        self.otps.remove(email);
    }

    pub(crate) fn consume_otp_sync(&self, email: &str, code: &str, now: DateTime<Utc>) -> bool {
        self.otps
            .remove_if(email, |_, record| record.code == code && record.is_live_at(now))
            .is_some()
    }

    /// Swap the whole content for `users` and `otps`
    pub(crate) fn replace_records(
        &self,
        users: Vec<User>,
        otps: Vec<OtpRecord>,
    ) -> Result<(), StoreError> {
        let rebuilt = Self::from_records(users, otps)?;
        *self.users.write() = rebuilt.users.into_inner();
        self.otps.clear();
        for (email, otp) in rebuilt.otps {
            self.otps.insert(email, otp);
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().get_by_email(email).cloned())
    }

    async fn find_user_by_provider_identity(
        &self,
        identity: &ProviderIdentity,
    ) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().get_by_identity(identity).cloned())
    }

    async fn find_user_by_role(&self, role: Role) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .by_id
            .values()
            .find(|u| u.role == role)
            .cloned())
    }

    async fn upsert_user_by_provider_identity(
        &self,
        identity: &ProviderIdentity,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.upsert_identity_sync(identity, email, now)
    }

    async fn update_user_password(
        &self,
        email: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(self.update_password_sync(email, password_hash, now))
    }

    async fn touch_user(&self, id: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.touch_sync(id, now);
        Ok(())
    }

    async fn insert_user(&self, user: NewUser, now: DateTime<Utc>) -> Result<User, StoreError> {
        self.insert_sync(user, now)
    }

    async fn find_otp(
        &self,
        email: &str,
        code: &str,
        not_expired_at: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, StoreError> {
        Ok(self
            .otps
            .get(email)
            .filter(|e| e.code == code && e.is_live_at(not_expired_at))
            .map(|e| e.value().clone()))
    }

    async fn upsert_otp(&self, record: OtpRecord) -> Result<(), StoreError> {
        self.upsert_otp_sync(record);
        Ok(())
    }

    async fn consume_otp(
        &self,
        email: &str,
        code: &str,
        not_expired_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(self.consume_otp_sync(email, code, not_expired_at))
    }

    async fn delete_otp(&self, email: &str) -> Result<(), StoreError> {
        self.delete_otp_sync(email);
        Ok(())
    }
}
