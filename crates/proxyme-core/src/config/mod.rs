//! Configuration types for the Proxyme delegation service.
//!
//! All sections live in one `ProxymeConfig` structure loaded from YAML.
//! Every field has a serde default so a minimal file (or none at all for
//! tests) produces a working configuration.

pub mod audit;
pub mod engine;
pub mod revocation;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use audit::AuditConfig;
pub use engine::EngineConfig;
pub use revocation::RevocationConfig;

/// Complete Proxyme configuration loaded from a file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProxymeConfig {
    /// Project name.
    #[serde(default)]
    pub project: Option<String>,

    /// Delegation engine settings (issuer, signing secret, TTL).
    #[serde(default)]
    pub engine: EngineConfig,

    /// Revocation ledger settings.
    #[serde(default)]
    pub revocation: RevocationConfig,

    /// Audit logging configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProxymeConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_usable() {
        let config = ProxymeConfig::default();
        assert_eq!(config.engine.token_ttl_secs, 3600);
        assert!(config.audit.enabled);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = ProxymeConfig::from_yaml("project: demo\n").unwrap();
        assert_eq!(config.project.as_deref(), Some("demo"));
        assert_eq!(config.engine.issuer, "http://127.0.0.1:5001");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
project: proxyme
engine:
  issuer: "https://auth.example.com"
  secret: "super-secret"
  token_ttl_secs: 600
revocation:
  database_url: "sqlite::memory:"
audit:
  enabled: true
  stdout: true
"#;
        let config = ProxymeConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.engine.issuer, "https://auth.example.com");
        assert_eq!(config.engine.token_ttl_secs, 600);
        assert_eq!(config.revocation.database_url, "sqlite::memory:");
        assert!(config.audit.stdout);
    }
}
