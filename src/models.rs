//! Data models for key-based authentication
//!
//! Everything the auth core persists or hands to its callers: challenges,
//! accounts, account keys, bearer tokens.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Signature algorithm supported for key registration and authentication.
///
/// Closed set: adding an algorithm means adding a variant and one arm in
/// `auth::signature::verify_signature`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Algorithm {
    Ed25519,
    Secp256k1,
    RsaPss,
    RsaSha256,
}

impl Algorithm {
    /// Wire/storage tag for this algorithm.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ed25519 => "ed25519",
            Self::Secp256k1 => "secp256k1",
            Self::RsaPss => "rsa-pss",
            Self::RsaSha256 => "rsa-sha256",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tags are matched case-insensitively; anything else is rejected.
impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ed25519" => Ok(Self::Ed25519),
            "secp256k1" => Ok(Self::Secp256k1),
            "rsa-pss" => Ok(Self::RsaPss),
            "rsa-sha256" => Ok(Self::RsaSha256),
            _ => Err(UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Parse error carrying the rejected tag.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unsupported alg: {0}")]
pub struct UnknownAlgorithm(pub String);

impl TryFrom<String> for Algorithm {
    type Error = UnknownAlgorithm;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Algorithm> for String {
    fn from(alg: Algorithm) -> Self {
        alg.as_str().to_string()
    }
}

/// Single-use challenge a client must sign to prove key possession.
///
/// No owner: any caller holding `value` may attempt to redeem it exactly
/// once before `expires_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub value: String,
    pub alg: Algorithm,
    pub expires_at: DateTime<Utc>,
}

/// Account identity a key is bound to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// Registered public key, optionally bound to an account.
///
/// `account_id` is `None` while a key exists only to prove ownership during
/// registration. `revoked_at` is a one-way transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountKey {
    pub id: i64,
    pub account_id: Option<i64>,
    pub alg: Algorithm,
    pub public_key: String,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Insert shape for binding a new key.
#[derive(Debug, Clone)]
pub struct NewAccountKey {
    pub alg: Algorithm,
    pub public_key: String,
    pub created_at: DateTime<Utc>,
}

/// Opaque bearer token.
///
/// `account_id = None` (and `key_id = 0`) means the signature was valid but
/// no account is registered for the key yet. Tokens are never renewed in
/// place; re-authentication mints a fresh one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub value: String,
    pub account_id: Option<i64>,
    pub key_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// Result of successful bearer-token authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verified {
    pub account_id: Option<i64>,
    pub key_id: i64,
}
