//! In-memory store of outstanding password-reset codes, keyed by email.
//!
//! Codes live only in process memory; a restart invalidates them.

use std::collections::HashMap;

use tokio::sync::Mutex;
use writetalent_core::types::Timestamp;
use writetalent_core::verification::{CodeRejection, VerificationCode};

/// Why a reset request's code was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CodeCheckError {
    #[error("No verification code found for this email")]
    NotIssued,
    #[error(transparent)]
    Rejected(#[from] CodeRejection),
}

#[derive(Debug, Default)]
pub struct VerificationStore {
    codes: Mutex<HashMap<String, VerificationCode>>,
}

fn key(email: &str) -> String {
    email.trim().to_lowercase()
}

impl VerificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new code for `email`, replacing any previous one.
    ///
    /// Expired codes of other addresses are dropped on the way.
    pub async fn issue(&self, email: &str, now: Timestamp) -> VerificationCode {
        let code = VerificationCode::issue(now);
        let mut codes = self.codes.lock().await;
        codes.retain(|_, issued| !issued.is_expired(now));
        codes.insert(key(email), code.clone());
        code
    }

    pub async fn len(&self) -> usize {
        self.codes.lock().await.len()
    }

    /// Check `submitted` against the code issued for `email`.
    ///
    /// An expired code is removed. A mismatch leaves the code in place.
    pub async fn check(
        &self,
        email: &str,
        submitted: &str,
        now: Timestamp,
    ) -> Result<(), CodeCheckError> {
        let mut codes = self.codes.lock().await;
        let email = key(email);
        let issued = codes.get(&email).ok_or(CodeCheckError::NotIssued)?;
        match issued.check(submitted, now) {
            Ok(()) => Ok(()),
            Err(CodeRejection::Expired) => {
                codes.remove(&email);
                Err(CodeRejection::Expired.into())
            }
            Err(rejection) => Err(rejection.into()),
        }
    }

    /// Remove the code for `email` once it has been used.
    pub async fn consume(&self, email: &str) {
        self.codes.lock().await.remove(&key(email));
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    use super::*;

    #[tokio::test]
    async fn unknown_email_has_no_code() {
        let store = VerificationStore::new();
        assert_matches!(
            store.check("kid@example.com", "12345", Utc::now()).await,
            Err(CodeCheckError::NotIssued)
        );
    }

    #[tokio::test]
    async fn issued_code_is_accepted_case_insensitively() {
        let store = VerificationStore::new();
        let now = Utc::now();
        let code = store.issue("Kid@Example.com", now).await;
        assert_eq!(store.check("kid@example.com", &code.code, now).await, Ok(()));
    }

    #[tokio::test]
    async fn expired_code_is_removed() {
        let store = VerificationStore::new();
        let now = Utc::now();
        let code = store.issue("kid@example.com", now).await;
        let later = now + Duration::minutes(6);

        assert_matches!(
            store.check("kid@example.com", &code.code, later).await,
            Err(CodeCheckError::Rejected(CodeRejection::Expired))
        );
        assert_matches!(
            store.check("kid@example.com", &code.code, now).await,
            Err(CodeCheckError::NotIssued)
        );
    }

    #[tokio::test]
    async fn consumed_code_cannot_be_reused() {
        let store = VerificationStore::new();
        let now = Utc::now();
        let code = store.issue("kid@example.com", now).await;
        store.consume("kid@example.com").await;
        assert_matches!(
            store.check("kid@example.com", &code.code, now).await,
            Err(CodeCheckError::NotIssued)
        );
    }

    #[tokio::test]
    async fn issuing_drops_abandoned_expired_codes() {
        let store = VerificationStore::new();
        let now = Utc::now();
        store.issue("first@example.com", now).await;
        store.issue("second@example.com", now + Duration::minutes(3)).await;
        assert_eq!(store.len().await, 2);

        let later = now + Duration::minutes(7);
        let fresh = store.issue("third@example.com", later).await;

        assert_eq!(store.len().await, 2);
        assert_matches!(
            store.check("first@example.com", "00000", later).await,
            Err(CodeCheckError::NotIssued)
        );
        assert_eq!(store.check("third@example.com", &fresh.code, later).await, Ok(()));
    }
}
