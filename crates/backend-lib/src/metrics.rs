// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const LOGIN_SUCCEEDED: &str = "auth.login.succeeded";
pub const LOGIN_FAILED: &str = "auth.login.failed";
pub const OTP_ISSUED: &str = "auth.otp.issued";
pub const OTP_VERIFIED: &str = "auth.otp.verified";
pub const OTP_REJECTED: &str = "auth.otp.rejected";
pub const MAIL_FAILED: &str = "auth.mail.failed";
pub const PASSWORD_RESET: &str = "auth.password.reset";
pub const OAUTH_LOGIN: &str = "auth.oauth.login";
pub const SUPERUSER_CREATED: &str = "auth.bootstrap.superuser_created";
