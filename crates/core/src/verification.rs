//! Password-reset verification codes.
//!
//! A code is five decimal digits and expires five minutes after issue.

use rand::Rng;

use crate::types::Timestamp;

/// Lifetime of an issued code.
pub const CODE_TTL_MINUTES: i64 = 5;

/// An issued verification code and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCode {
    pub code: String,
    pub expires_at: Timestamp,
}

/// Why a submitted code was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CodeRejection {
    #[error("Verification code has expired")]
    Expired,
    #[error("Invalid verification code")]
    Mismatch,
}

/// Generate a random five-digit code (`10000..=99999`).
pub fn generate_code() -> String {
    rand::rng().random_range(10_000..=99_999u32).to_string()
}

impl VerificationCode {
    /// Issue a fresh code valid for [`CODE_TTL_MINUTES`] from `now`.
    pub fn issue(now: Timestamp) -> Self {
        Self {
            code: generate_code(),
            expires_at: now + chrono::Duration::minutes(CODE_TTL_MINUTES),
        }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }

    /// Check a submitted code. Expiry is reported before a mismatch.
    pub fn check(&self, submitted: &str, now: Timestamp) -> Result<(), CodeRejection> {
        if self.is_expired(now) {
            return Err(CodeRejection::Expired);
        }
        if self.code != submitted.trim() {
            return Err(CodeRejection::Mismatch);
        }
        Ok(())
    }
}
