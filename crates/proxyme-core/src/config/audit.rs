//! Audit logging configuration.

use serde::{Deserialize, Serialize};

/// Configuration for audit logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether audit logging is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Whether to also emit events to stdout.
    #[serde(default)]
    pub stdout: bool,

    /// Directory holding the audit log file.
    #[serde(default = "default_directory")]
    pub directory: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            stdout: false,
            directory: default_directory(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_directory() -> String {
    ".".to_string()
}
