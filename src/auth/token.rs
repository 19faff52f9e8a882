//! Bearer token issuance and validation.

use std::sync::Arc;

use chrono::{Duration, Utc};

use super::codec::random_token;
use super::error::AuthError;
use crate::models::{Token, Verified};
use crate::store::{AuthStore, StoreError};

const TOKEN_BYTES: usize = 32;

/// Mints opaque bearer tokens and validates them on each request.
///
/// A token is a capability: no introspection, no renewal in place, and no
/// revocation path. Expired tokens are rejected at read time, not deleted.
pub struct TokenAuthority {
    store: Arc<dyn AuthStore>,
    ttl: Duration,
}

impl TokenAuthority {
    pub fn new(store: Arc<dyn AuthStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Issue a fresh token bound to `(account_id, key_id)`.
    pub async fn issue(
        &self,
        account_id: Option<i64>,
        key_id: i64,
    ) -> Result<Token, AuthError> {
        let token = Token {
            value: random_token(TOKEN_BYTES),
            account_id,
            key_id,
            expires_at: Utc::now() + self.ttl,
        };
        self.store
            .create_token(&token)
            .await
            .map_err(AuthError::Store)?;
        tracing::info!(account_id = ?account_id, key_id, "token issued");
        Ok(token)
    }

    /// Validate a bearer token value.
    pub async fn authenticate(&self, value: &str) -> Result<Verified, AuthError> {
        let token = match self.store.get_token(value).await {
            Ok(t) => t,
            Err(StoreError::NotFound) => return Err(AuthError::TokenNotFound),
            Err(e) => return Err(AuthError::Store(e)),
        };
        if Utc::now() > token.expires_at {
            return Err(AuthError::TokenExpired);
        }
        Ok(Verified {
            account_id: token.account_id,
            key_id: token.key_id,
        })
    }
}
