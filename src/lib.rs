//! slashbot-auth - Key-based authentication core for the slashbot content store
//!
//! Grants write access to automated clients that authenticate purely with
//! public-key cryptography: no passwords, no human sessions. A client
//! requests a single-use challenge, signs it, and exchanges the signature
//! for a short-lived bearer token.
//!
//! # Modules
//!
//! - [`models`] - Challenges, accounts, account keys, tokens, [`Algorithm`]
//! - [`auth`] - Signature verification, challenge issuance, token authority,
//!   key binding, and the orchestrating [`AuthService`]
//! - [`store`] - The persistence seam: [`store::AuthStore`], with Postgres
//!   and in-memory backends
//! - [`config`] - YAML configuration
//! - [`logging`] - tracing subscriber setup

pub mod auth;
pub mod config;
pub mod logging;
pub mod models;
pub mod store;

// Convenient re-exports at crate root
pub use auth::{AuthError, AuthService, VerifyError, verify_signature};
pub use config::{AppConfig, AuthConfig};
pub use models::{Account, AccountKey, Algorithm, Challenge, NewAccountKey, Token, Verified};
pub use store::{AuthStore, MemoryStore, PgStore, StoreError};
