// ============================
// crates/backend-lib/src/auth/bootstrap.rs
// ============================
//! First-start creation of the super_admin account.
use metrics::counter;
use lem_common::Role;

use crate::auth::password::hash_password_secure;
use crate::clock::Clock;
use crate::config::SuperuserSettings;
use crate::error::AuthError;
use crate::metrics::SUPERUSER_CREATED;
use crate::models::NewUser;
use crate::storage::{Store, StoreError};

/// What [`init_superuser`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// A super_admin already exists
    AlreadyPresent,
    /// Credentials are not configured
    Skipped,
    Created,
}

/// Make sure one super_admin exists, creating it from configuration if needed
pub async fn init_superuser(
    store: &dyn Store,
    settings: Option<&SuperuserSettings>,
    clock: &dyn Clock,
) -> Result<BootstrapOutcome, AuthError> {
    if let Some(existing) = store.find_user_by_role(Role::SuperAdmin).await? {
        tracing::info!(email = %existing.email, "super_admin already exists");
        return Ok(BootstrapOutcome::AlreadyPresent);
    }

    let credentials = settings.and_then(|s| match (s.email.as_deref(), s.password.as_deref()) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
            Some((email, password))
        },
        _ => None,
    });
    let Some((email, password)) = credentials else {
        tracing::warn!("superuser email or password not configured, skipping super_admin creation");
        return Ok(BootstrapOutcome::Skipped);
    };

    let mut plain = password.to_string();
    let hash = hash_password_secure(&mut plain)
        .map_err(|e| AuthError::Config(format!("password hashing failed: {e}")))?;
    let new_user = NewUser {
        email: email.to_string(),
        password_hash: Some(hash),
        role: Role::SuperAdmin,
        provider: String::new(),
        provider_id: String::new(),
    };

    match store.insert_user(new_user, clock.now()).await {
        Ok(user) => {
            counter!(SUPERUSER_CREATED).increment(1);
            tracing::info!(email = %user.email, "super_admin created");
            Ok(BootstrapOutcome::Created)
        },
        Err(StoreError::Conflict(reason)) => {
            // another instance may have won the race
            if store.find_user_by_role(Role::SuperAdmin).await?.is_some() {
                tracing::info!(%reason, "super_admin created concurrently");
                return Ok(BootstrapOutcome::AlreadyPresent);
            }
            Err(StoreError::Conflict(reason).into())
        },
        Err(e) => Err(e.into()),
    }
}
