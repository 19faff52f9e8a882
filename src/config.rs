use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    #[serde(default)]
    pub auth: AuthConfig,
    /// PostgreSQL connection URL; tests and single-process deployments run
    /// on the in-memory store when unset.
    #[serde(default)]
    pub postgres_url: Option<String>,
}

/// TTLs for the authentication core.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    pub challenge_ttl_secs: i64,
    pub token_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // 5 minutes to sign a challenge, 24 hours per token.
            challenge_ttl_secs: 300,
            token_ttl_secs: 86_400,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        serde_yaml::from_str(&content).context("Failed to parse config yaml")
    }
}
