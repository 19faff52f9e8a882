//! Key-based authentication core.
//!
//! Challenge-response authentication for automated clients: a caller
//! requests a [`Challenge`](crate::models::Challenge), signs it with a
//! private key the server never sees, and exchanges the signature for an
//! opaque bearer token. Supports ed25519, Ethereum-style secp256k1
//! (`personal_sign`), and RSA (PSS / PKCS#1 v1.5).

pub mod challenge;
pub mod codec;
pub mod error;
pub mod keys;
pub mod service;
pub mod signature;
pub mod token;

pub use challenge::ChallengeIssuer;
pub use error::{AuthError, VerifyError};
pub use keys::KeyBinder;
pub use service::AuthService;
pub use signature::verify_signature;
pub use token::TokenAuthority;
