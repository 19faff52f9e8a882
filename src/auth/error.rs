//! Authentication error types.
//!
//! Every variant is terminal: the core never retries a verification or a
//! challenge lookup. The HTTP collaborator collapses all of these into a
//! generic "unauthorized" at the boundary; internally they stay distinct so
//! each failure mode is testable.

use thiserror::Error;

use crate::store::StoreError;

/// Signature verification failures (pure, no storage involved).
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Algorithm tag outside the supported set.
    #[error("unsupported alg: {0}")]
    UnsupportedAlgorithm(String),

    /// Key or signature failed to decode, or decoded to a bad shape.
    /// Covers bad base64/hex, wrong byte lengths, unparsable key material.
    #[error("malformed key or signature: {0}")]
    Malformed(String),

    /// Well-formed input, cryptographically invalid signature.
    #[error("invalid {0} signature")]
    InvalidSignature(&'static str),
}

/// Authentication protocol failures.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Challenge absent: never issued, already consumed, or lost the
    /// consumption race.
    #[error("challenge not found")]
    ChallengeNotFound,

    #[error("challenge expired")]
    ChallengeExpired,

    /// Challenge was issued for a different algorithm than claimed.
    #[error("challenge alg mismatch")]
    ChallengeAlgorithmMismatch,

    /// Key is registered but revoked; valid signatures no longer count.
    #[error("key revoked")]
    KeyRevoked,

    #[error("token not found")]
    TokenNotFound,

    #[error("token expired")]
    TokenExpired,

    #[error(transparent)]
    Verify(#[from] VerifyError),

    /// Storage I/O passed through unchanged, never reinterpreted as an
    /// authentication failure.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<crate::models::UnknownAlgorithm> for AuthError {
    fn from(e: crate::models::UnknownAlgorithm) -> Self {
        AuthError::Verify(VerifyError::UnsupportedAlgorithm(e.0))
    }
}
