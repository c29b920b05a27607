// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod bootstrap;
pub mod login;
pub mod oauth;
pub mod otp;
pub mod password;
pub mod reset;
pub mod token;
pub mod token_generator;
mod service;
mod service_impl;

pub use bootstrap::{init_superuser, BootstrapOutcome};
pub use login::{LoginResult, LoginService};
pub use oauth::{ExternalProfile, GoogleProvider, IdentityProvider, OAuthResult, OAuthService};
pub use password::{hash_password, hash_password_secure, verify_password, validate_password_strength, PasswordRequirements, MIN_PASSWORD_LENGTH};
pub use reset::{PasswordResetService, ResetRequestOutcome};
pub use token::{Claims, TokenError, TokenIssuer, TokenSettings};
pub use service::AuthService;
pub use service_impl::DefaultAuth;
