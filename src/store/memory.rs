//! In-process store backend.
//!
//! Used by the test suite and single-process deployments. `DashMap::remove`
//! gives the same exactly-once consumption guarantee the Postgres backend
//! gets from its conditional delete; the account tables sit behind one
//! mutex so the uniqueness checks run atomically with the insert.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::{Mutex, MutexGuard};

use super::{AuthStore, StoreError};
use crate::models::{Account, AccountKey, Algorithm, Challenge, NewAccountKey, Token};

#[derive(Default)]
struct AccountTables {
    next_account_id: i64,
    next_key_id: i64,
    accounts: Vec<Account>,
    keys: Vec<AccountKey>,
}

/// Memory-backed [`AuthStore`].
#[derive(Default)]
pub struct MemoryStore {
    challenges: DashMap<String, Challenge>,
    tokens: DashMap<String, Token>,
    tables: Mutex<AccountTables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, AccountTables> {
        // A panic while holding the lock cannot leave these tables in a
        // half-written state, so a poisoned mutex is still usable.
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AuthStore for MemoryStore {
    async fn create_challenge(&self, challenge: &Challenge) -> Result<(), StoreError> {
        self.challenges
            .insert(challenge.value.clone(), challenge.clone());
        Ok(())
    }

    async fn consume_challenge(&self, value: &str) -> Result<Challenge, StoreError> {
        match self.challenges.remove(value) {
            Some((_, challenge)) => Ok(challenge),
            None => Err(StoreError::NotFound),
        }
    }

    async fn create_token(&self, token: &Token) -> Result<(), StoreError> {
        self.tokens.insert(token.value.clone(), token.clone());
        Ok(())
    }

    async fn get_token(&self, value: &str) -> Result<Token, StoreError> {
        self.tokens
            .get(value)
            .map(|t| t.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn find_account_key(
        &self,
        alg: Algorithm,
        public_key: &str,
    ) -> Result<(AccountKey, Option<Account>), StoreError> {
        let tables = self.tables();
        let key = tables
            .keys
            .iter()
            .find(|k| k.alg == alg && k.public_key == public_key)
            .cloned()
            .ok_or(StoreError::NotFound)?;
        let account = key
            .account_id
            .and_then(|id| tables.accounts.iter().find(|a| a.id == id).cloned());
        Ok((key, account))
    }

    async fn bind_key(&self, account_id: i64, key: &NewAccountKey) -> Result<i64, StoreError> {
        let mut tables = self.tables();
        if tables
            .keys
            .iter()
            .any(|k| k.alg == key.alg && k.public_key == key.public_key)
        {
            return Err(StoreError::DuplicateKey);
        }
        tables.next_key_id += 1;
        let key_id = tables.next_key_id;
        tables.keys.push(AccountKey {
            id: key_id,
            account_id: Some(account_id),
            alg: key.alg,
            public_key: key.public_key.clone(),
            created_at: key.created_at,
            revoked_at: None,
        });
        Ok(key_id)
    }

    async fn revoke_key(
        &self,
        account_id: i64,
        key_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables();
        let key = tables
            .keys
            .iter_mut()
            .find(|k| k.id == key_id && k.account_id == Some(account_id))
            .ok_or(StoreError::NotFound)?;
        key.revoked_at = Some(at);
        Ok(())
    }

    async fn create_account(
        &self,
        display_name: &str,
        key: &NewAccountKey,
    ) -> Result<(i64, i64), StoreError> {
        let mut tables = self.tables();
        if tables.accounts.iter().any(|a| a.display_name == display_name) {
            return Err(StoreError::DuplicateName);
        }
        if tables
            .keys
            .iter()
            .any(|k| k.alg == key.alg && k.public_key == key.public_key)
        {
            return Err(StoreError::DuplicateKey);
        }

        tables.next_account_id += 1;
        let account_id = tables.next_account_id;
        tables.accounts.push(Account {
            id: account_id,
            display_name: display_name.to_string(),
            created_at: Utc::now(),
        });

        tables.next_key_id += 1;
        let key_id = tables.next_key_id;
        tables.keys.push(AccountKey {
            id: key_id,
            account_id: Some(account_id),
            alg: key.alg,
            public_key: key.public_key.clone(),
            created_at: key.created_at,
            revoked_at: None,
        });
        Ok((account_id, key_id))
    }

    async fn list_account_keys(&self, account_id: i64) -> Result<Vec<AccountKey>, StoreError> {
        let tables = self.tables();
        Ok(tables
            .keys
            .iter()
            .filter(|k| k.account_id == Some(account_id) && k.revoked_at.is_none())
            .cloned()
            .collect())
    }
}
