//! Delegation engine configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the delegation engine.
///
/// The signing secret and algorithm are fixed for the process lifetime;
/// there is no key rotation mechanism.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Issuer URL placed in the `iss` claim of every delegation token.
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Shared symmetric signing secret (HS256).
    #[serde(default)]
    pub secret: Option<String>,

    /// Environment variable holding the signing secret.
    /// Takes precedence over `secret` when set and present.
    #[serde(default)]
    pub secret_env: Option<String>,

    /// Lifetime of issued delegation tokens, in seconds.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

impl EngineConfig {
    /// Resolve the signing secret from the environment or inline config.
    pub fn resolve_secret(&self) -> Option<String> {
        if let Some(env_var) = &self.secret_env {
            if let Ok(secret) = std::env::var(env_var) {
                return Some(secret);
            }
        }
        self.secret.clone()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            secret: None,
            secret_env: None,
            token_ttl_secs: default_token_ttl(),
        }
    }
}

fn default_issuer() -> String {
    "http://127.0.0.1:5001".to_string()
}

fn default_token_ttl() -> u64 {
    3600
}
