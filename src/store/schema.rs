//! Postgres schema bootstrap for the auth tables.

use sqlx::PgPool;

/// Idempotent DDL, applied at startup.
pub const AUTH_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        id BIGSERIAL PRIMARY KEY,
        display_name TEXT NOT NULL UNIQUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS account_keys (
        id BIGSERIAL PRIMARY KEY,
        account_id BIGINT REFERENCES accounts(id),
        alg TEXT NOT NULL,
        public_key TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        revoked_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_account_keys_unique
        ON account_keys (alg, public_key)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS auth_challenges (
        challenge TEXT PRIMARY KEY,
        alg TEXT NOT NULL,
        expires_at TIMESTAMPTZ NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS auth_tokens (
        token TEXT PRIMARY KEY,
        account_id BIGINT,
        key_id BIGINT NOT NULL,
        expires_at TIMESTAMPTZ NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

/// Apply the auth schema. Safe to run on every startup.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    for ddl in AUTH_SCHEMA {
        sqlx::query(ddl).execute(pool).await?;
    }
    tracing::info!("auth schema ready");
    Ok(())
}
