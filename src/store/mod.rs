//! Storage collaborator for the auth core.
//!
//! [`AuthStore`] is the seam between the core and persistence. The store
//! owns the two invariants the core must not re-implement in process:
//! atomic delete-on-read of challenges, and uniqueness of
//! `(alg, public_key)` pairs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Account, AccountKey, Algorithm, Challenge, NewAccountKey, Token};

pub mod memory;
pub mod postgres;
pub mod schema;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage errors. NotFound and the duplicate variants are protocol-level
/// outcomes the core maps to its own taxonomy; `Database` passes through
/// opaque.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    /// `(alg, public_key)` already registered somewhere in the system.
    #[error("duplicate key")]
    DuplicateKey,

    /// Display name already taken.
    #[error("duplicate name")]
    DuplicateName,

    /// A stored row that no longer parses (e.g. an unknown algorithm tag).
    #[error("malformed row: {0}")]
    Malformed(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Persistence contract consumed by the auth core.
#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn create_challenge(&self, challenge: &Challenge) -> Result<(), StoreError>;

    /// Atomic delete-on-read. If two callers race on the same value,
    /// exactly one gets the challenge and the other gets `NotFound`.
    async fn consume_challenge(&self, value: &str) -> Result<Challenge, StoreError>;

    async fn create_token(&self, token: &Token) -> Result<(), StoreError>;

    async fn get_token(&self, value: &str) -> Result<Token, StoreError>;

    /// Look up a key by `(alg, public_key)` together with its owning
    /// account, if bound.
    async fn find_account_key(
        &self,
        alg: Algorithm,
        public_key: &str,
    ) -> Result<(AccountKey, Option<Account>), StoreError>;

    /// Insert a key for an account. The `(alg, public_key)` uniqueness
    /// constraint lives here; violations surface as `DuplicateKey`.
    async fn bind_key(&self, account_id: i64, key: &NewAccountKey) -> Result<i64, StoreError>;

    /// Set `revoked_at` on a key owned by `account_id`. `NotFound` if the
    /// key does not exist or belongs to someone else.
    async fn revoke_key(
        &self,
        account_id: i64,
        key_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Create an account together with its first key, atomically. Used by
    /// the account-creation collaborator after it has proven key ownership
    /// through the core. Returns `(account_id, key_id)`.
    async fn create_account(
        &self,
        display_name: &str,
        key: &NewAccountKey,
    ) -> Result<(i64, i64), StoreError>;

    /// Non-revoked keys registered to an account.
    async fn list_account_keys(&self, account_id: i64) -> Result<Vec<AccountKey>, StoreError>;
}
