//! Postgres-backed store.
//!
//! Runtime sqlx queries only, so builds never need a live database. The
//! one-shot challenge guarantee is a single `DELETE ... RETURNING`, and key
//! uniqueness is the `idx_account_keys_unique` index; neither is
//! re-implemented with in-process locking because several server instances
//! may share the pool's database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use std::time::Duration;

use super::{AuthStore, StoreError, schema};
use crate::models::{Account, AccountKey, Algorithm, Challenge, NewAccountKey, Token};

/// PostgreSQL connection pool plus the auth queries.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and apply the auth schema.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;
        tracing::info!("PostgreSQL connection pool established");

        schema::migrate(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn row_to_key(row: &PgRow) -> Result<AccountKey, StoreError> {
        let alg: String = row.try_get("alg").map_err(StoreError::Database)?;
        Ok(AccountKey {
            id: row.try_get("id")?,
            account_id: row.try_get("account_id")?,
            alg: alg
                .parse::<Algorithm>()
                .map_err(|e| StoreError::Malformed(e.to_string()))?,
            public_key: row.try_get("public_key")?,
            created_at: row.try_get("created_at")?,
            revoked_at: row.try_get("revoked_at")?,
        })
    }
}

#[async_trait]
impl AuthStore for PgStore {
    async fn create_challenge(&self, challenge: &Challenge) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO auth_challenges (challenge, alg, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&challenge.value)
        .bind(challenge.alg.as_str())
        .bind(challenge.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn consume_challenge(&self, value: &str) -> Result<Challenge, StoreError> {
        // Conditional delete: of two racing consumers exactly one sees the
        // row, the other gets no rows back.
        let row = sqlx::query(
            r#"
            DELETE FROM auth_challenges
            WHERE challenge = $1
            RETURNING challenge, alg, expires_at
            "#,
        )
        .bind(value)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        let alg: String = row.try_get("alg")?;
        Ok(Challenge {
            value: row.try_get("challenge")?,
            alg: alg
                .parse::<Algorithm>()
                .map_err(|e| StoreError::Malformed(e.to_string()))?,
            expires_at: row.try_get("expires_at")?,
        })
    }

    async fn create_token(&self, token: &Token) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO auth_tokens (token, account_id, key_id, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&token.value)
        .bind(token.account_id)
        .bind(token.key_id)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_token(&self, value: &str) -> Result<Token, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT token, account_id, key_id, expires_at
            FROM auth_tokens
            WHERE token = $1
            "#,
        )
        .bind(value)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(Token {
            value: row.try_get("token")?,
            account_id: row.try_get("account_id")?,
            key_id: row.try_get("key_id")?,
            expires_at: row.try_get("expires_at")?,
        })
    }

    async fn find_account_key(
        &self,
        alg: Algorithm,
        public_key: &str,
    ) -> Result<(AccountKey, Option<Account>), StoreError> {
        let row = sqlx::query(
            r#"
            SELECT k.id, k.account_id, k.alg, k.public_key, k.created_at, k.revoked_at,
                   a.id AS acct_id, a.display_name, a.created_at AS acct_created_at
            FROM account_keys k
            LEFT JOIN accounts a ON a.id = k.account_id
            WHERE k.alg = $1 AND k.public_key = $2
            "#,
        )
        .bind(alg.as_str())
        .bind(public_key)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        let key = Self::row_to_key(&row)?;
        let account = match row.try_get::<Option<i64>, _>("acct_id")? {
            Some(id) => Some(Account {
                id,
                display_name: row.try_get("display_name")?,
                created_at: row.try_get("acct_created_at")?,
            }),
            None => None,
        };
        Ok((key, account))
    }

    async fn bind_key(&self, account_id: i64, key: &NewAccountKey) -> Result<i64, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO account_keys (account_id, alg, public_key, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(account_id)
        .bind(key.alg.as_str())
        .bind(&key.public_key)
        .bind(key.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => StoreError::DuplicateKey,
            _ => StoreError::Database(e),
        })?;
        Ok(row.try_get("id")?)
    }

    async fn revoke_key(
        &self,
        account_id: i64,
        key_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE account_keys SET revoked_at = $1
            WHERE id = $2 AND account_id = $3
            "#,
        )
        .bind(at)
        .bind(key_id)
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn create_account(
        &self,
        display_name: &str,
        key: &NewAccountKey,
    ) -> Result<(i64, i64), StoreError> {
        let mut tx = self.pool.begin().await?;

        let account_row = sqlx::query(
            r#"
            INSERT INTO accounts (display_name)
            VALUES ($1)
            RETURNING id
            "#,
        )
        .bind(display_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => StoreError::DuplicateName,
            _ => StoreError::Database(e),
        })?;
        let account_id: i64 = account_row.try_get("id")?;

        let key_row = sqlx::query(
            r#"
            INSERT INTO account_keys (account_id, alg, public_key, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(account_id)
        .bind(key.alg.as_str())
        .bind(&key.public_key)
        .bind(key.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => StoreError::DuplicateKey,
            _ => StoreError::Database(e),
        })?;
        let key_id: i64 = key_row.try_get("id")?;

        tx.commit().await?;
        Ok((account_id, key_id))
    }

    async fn list_account_keys(&self, account_id: i64) -> Result<Vec<AccountKey>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, alg, public_key, created_at, revoked_at
            FROM account_keys
            WHERE account_id = $1 AND revoked_at IS NULL
            ORDER BY id
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(Self::row_to_key(row)?);
        }
        Ok(out)
    }
}
