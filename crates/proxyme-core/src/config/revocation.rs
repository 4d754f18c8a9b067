//! Revocation ledger configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the durable revocation ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevocationConfig {
    /// SQLite database URL for the revoked-token table.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Maximum connections in the ledger pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for RevocationConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://auth.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}
