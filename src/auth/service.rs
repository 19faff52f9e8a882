//! Authentication service: orchestrates challenge, signature, key, and
//! token handling into the two wire protocols.
//!
//! Per attempt the state machine is linear: challenge consumed (one-shot,
//! before anything else) -> expiry -> algorithm match -> signature ->
//! key/account lookup -> token. Any failure short-circuits; no partial
//! state survives because the challenge is already gone.

use std::sync::Arc;

use chrono::{Duration, Utc};

use super::challenge::ChallengeIssuer;
use super::error::{AuthError, VerifyError};
use super::keys::KeyBinder;
use super::signature;
use super::token::TokenAuthority;
use crate::config::AuthConfig;
use crate::models::{Account, Algorithm, Challenge, Token, Verified};
use crate::store::AuthStore;

/// The authentication core. One instance per process, shared across
/// requests; all mutable state lives in the store.
pub struct AuthService {
    challenges: ChallengeIssuer,
    tokens: TokenAuthority,
    keys: KeyBinder,
}

impl AuthService {
    pub fn new(store: Arc<dyn AuthStore>, token_ttl: Duration, challenge_ttl: Duration) -> Self {
        Self {
            challenges: ChallengeIssuer::new(Arc::clone(&store), challenge_ttl),
            tokens: TokenAuthority::new(Arc::clone(&store), token_ttl),
            keys: KeyBinder::new(store),
        }
    }

    pub fn from_config(store: Arc<dyn AuthStore>, cfg: &AuthConfig) -> Self {
        Self::new(
            store,
            Duration::seconds(cfg.token_ttl_secs),
            Duration::seconds(cfg.challenge_ttl_secs),
        )
    }

    /// Issue a single-use challenge for the claimed algorithm.
    pub async fn create_challenge(&self, alg: &str) -> Result<Challenge, AuthError> {
        let alg: Algorithm = alg.parse()?;
        self.challenges.create(alg).await
    }

    /// The authentication protocol: redeem the challenge, verify the
    /// signature over it, look up the key, mint a bearer token.
    ///
    /// An unknown key is not a failure; it yields a token with no account
    /// (`key_id = 0`), used by registration flows to prove key ownership
    /// before an account exists. A revoked key is rejected even when the
    /// signature is valid.
    pub async fn verify_and_create_token(
        &self,
        alg: &str,
        public_key: &str,
        challenge: &str,
        signature: &str,
    ) -> Result<(Token, Option<Account>), AuthError> {
        let claimed: Algorithm = alg.parse()?;

        // One-shot: the challenge is consumed before any check, so a failed
        // attempt can never be replayed with the same value.
        let issued = self.challenges.consume(challenge).await?;
        if Utc::now() > issued.expires_at {
            tracing::warn!(alg, "authentication rejected: challenge expired");
            return Err(AuthError::ChallengeExpired);
        }
        if issued.alg != claimed {
            tracing::warn!(
                claimed = alg,
                issued = %issued.alg,
                "authentication rejected: challenge alg mismatch"
            );
            return Err(AuthError::ChallengeAlgorithmMismatch);
        }

        signature::verify_signature(claimed, public_key, challenge, signature).inspect_err(
            |e| tracing::warn!(alg, error = %e, "authentication rejected: bad signature"),
        )?;

        let (account_id, key_id, account) = match self.keys.find(claimed, public_key).await? {
            Some((key, _)) if key.revoked_at.is_some() => {
                tracing::warn!(alg, key_id = key.id, "authentication rejected: key revoked");
                return Err(AuthError::KeyRevoked);
            }
            Some((key, Some(account))) => (Some(account.id), key.id, Some(account)),
            // Key present but unbound, or unknown entirely: token without
            // an account identity.
            Some((_, None)) | None => (None, 0, None),
        };

        let token = self.tokens.issue(account_id, key_id).await?;
        Ok((token, account))
    }

    /// Validate a bearer token. Token expiry is the only check: key state
    /// at validation time is deliberately not consulted, so tokens minted
    /// before a revocation stay valid until their own TTL elapses.
    pub async fn authenticate(&self, bearer: &str) -> Result<Verified, AuthError> {
        self.tokens.authenticate(bearer).await
    }

    /// Standalone signature check, exposed so the account-creation and
    /// key-addition collaborators can prove key ownership without minting
    /// a token.
    pub fn verify_signature(
        &self,
        alg: &str,
        public_key: &str,
        message: &str,
        signature: &str,
    ) -> Result<(), VerifyError> {
        let alg: Algorithm = alg
            .parse()
            .map_err(|e: crate::models::UnknownAlgorithm| VerifyError::UnsupportedAlgorithm(e.0))?;
        signature::verify_signature(alg, public_key, message, signature)
    }

    /// Key management surface for the account collaborators.
    pub fn keys(&self) -> &KeyBinder {
        &self.keys
    }
}
