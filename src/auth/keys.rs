//! Account-key binding, lookup, and revocation.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::error::AuthError;
use crate::models::{Account, AccountKey, Algorithm, NewAccountKey};
use crate::store::{AuthStore, StoreError};

/// Binds public keys to accounts and enforces the key-level invariants:
/// `(alg, public_key)` is globally unique, revocation is one-way, and a
/// revoked key never authenticates again.
pub struct KeyBinder {
    store: Arc<dyn AuthStore>,
}

impl KeyBinder {
    pub fn new(store: Arc<dyn AuthStore>) -> Self {
        Self { store }
    }

    /// Look up a key and its owning account, if any. `Ok(None)` means the
    /// key is unknown, which authentication treats as an unbound key rather
    /// than a failure.
    pub async fn find(
        &self,
        alg: Algorithm,
        public_key: &str,
    ) -> Result<Option<(AccountKey, Option<Account>)>, AuthError> {
        match self.store.find_account_key(alg, public_key).await {
            Ok(found) => Ok(Some(found)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(AuthError::Store(e)),
        }
    }

    /// Register a new key for an account. Uniqueness of `(alg, public_key)`
    /// is the store's constraint, surfaced here as `DuplicateKey`; the
    /// binder never does its own check-then-insert.
    pub async fn bind(&self, account_id: i64, key: &NewAccountKey) -> Result<i64, AuthError> {
        let key_id = self
            .store
            .bind_key(account_id, key)
            .await
            .map_err(AuthError::Store)?;
        tracing::info!(account_id, key_id, alg = %key.alg, "key bound");
        Ok(key_id)
    }

    /// Non-revoked keys registered to an account, for the key-management
    /// surface.
    pub async fn list(&self, account_id: i64) -> Result<Vec<AccountKey>, AuthError> {
        self.store
            .list_account_keys(account_id)
            .await
            .map_err(AuthError::Store)
    }

    /// Mark a key revoked. Fails with NotFound if the key does not exist or
    /// belongs to a different account.
    pub async fn revoke(
        &self,
        account_id: i64,
        key_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        self.store
            .revoke_key(account_id, key_id, at)
            .await
            .map_err(AuthError::Store)?;
        tracing::info!(account_id, key_id, "key revoked");
        Ok(())
    }
}
