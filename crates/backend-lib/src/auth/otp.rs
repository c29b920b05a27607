// ============================
// crates/backend-lib/src/auth/otp.rs
// ============================
//! One-time password reset codes.
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::models::OtpRecord;

/// How long an emailed code stays usable, in seconds (5 minutes)
pub const OTP_TTL_SECS: i64 = 5 * 60;

/// Smallest and largest code issued. Codes are always six digits.
const OTP_MIN: u32 = 100_000;
const OTP_MAX: u32 = 999_999;

/// Draw a six digit code uniformly from the OS-seeded CSPRNG
pub fn generate_otp() -> String {
    let n: u32 = rand::rng().random_range(OTP_MIN..=OTP_MAX);
    format!("{n:06}")
}

/// Record for a freshly issued code
pub fn new_otp_record(email: &str, issued_at: DateTime<Utc>) -> OtpRecord {
    OtpRecord {
        email: email.to_string(),
        code: generate_otp(),
        expires_at: issued_at + Duration::seconds(OTP_TTL_SECS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_ascii_digits_in_range() {
        for _ in 0..1_000 {
            let code = generate_otp();
            assert_eq!(code.len(), 6);
            assert!(code.bytes().all(|b| b.is_ascii_digit()));
            let n: u32 = code.parse().unwrap();
            assert!((OTP_MIN..=OTP_MAX).contains(&n));
        }
    }

    #[test]
    fn record_expires_five_minutes_after_issue() {
        let now = Utc::now();
        let record = new_otp_record("a@x.test", now);
        assert_eq!(record.email, "a@x.test");
        assert_eq!(record.expires_at - now, Duration::minutes(5));
    }
}
