//! Challenge issuance and one-shot consumption.

use std::sync::Arc;

use chrono::{Duration, Utc};

use super::codec::random_token;
use super::error::AuthError;
use crate::models::{Algorithm, Challenge};
use crate::store::{AuthStore, StoreError};

const CHALLENGE_BYTES: usize = 32;

/// Issues single-use challenges and redeems them exactly once.
///
/// Consumption is delegated to the store's atomic delete-on-read, so the
/// one-shot guarantee holds across process instances sharing the store.
pub struct ChallengeIssuer {
    store: Arc<dyn AuthStore>,
    ttl: Duration,
}

impl ChallengeIssuer {
    pub fn new(store: Arc<dyn AuthStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Create and persist a fresh challenge for `alg`.
    pub async fn create(&self, alg: Algorithm) -> Result<Challenge, AuthError> {
        let challenge = Challenge {
            value: random_token(CHALLENGE_BYTES),
            alg,
            expires_at: Utc::now() + self.ttl,
        };
        self.store
            .create_challenge(&challenge)
            .await
            .map_err(AuthError::Store)?;
        tracing::info!(alg = %alg, expires_at = %challenge.expires_at, "challenge issued");
        Ok(challenge)
    }

    /// Redeem a challenge. The value is gone after this call regardless of
    /// whether the caller's subsequent checks pass; a failed attempt cannot
    /// be retried with the same challenge.
    pub async fn consume(&self, value: &str) -> Result<Challenge, AuthError> {
        match self.store.consume_challenge(value).await {
            Ok(c) => Ok(c),
            Err(StoreError::NotFound) => Err(AuthError::ChallengeNotFound),
            Err(e) => Err(AuthError::Store(e)),
        }
    }
}
