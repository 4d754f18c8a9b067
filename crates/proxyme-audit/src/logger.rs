//! Audit logger implementation.
//!
//! Wraps a sink with configuration and provides the filter type used to
//! query recorded events.

use proxyme_core::AuditConfig;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::AuditError;
use crate::event::{AuditEvent, AuditEventType, AuditStatus};
use crate::sink::{AuditSink, ConsoleSink, FileSink, NullSink};

/// The main audit logger.
pub struct AuditLogger {
    config: AuditConfig,
    sink: Arc<dyn AuditSink>,
}

impl AuditLogger {
    /// Create a new audit logger from configuration.
    pub fn new(config: AuditConfig) -> Result<Self, AuditError> {
        let sink: Arc<dyn AuditSink> = if !config.enabled {
            Arc::new(NullSink)
        } else if config.stdout {
            Arc::new(ConsoleSink)
        } else {
            Arc::new(FileSink::new(Self::resolve_log_path(&config))?)
        };

        Ok(Self { config, sink })
    }

    /// Create a logger with a custom sink.
    pub fn with_sink(config: AuditConfig, sink: Arc<dyn AuditSink>) -> Self {
        Self { config, sink }
    }

    /// Create a disabled (no-op) logger.
    pub fn disabled() -> Self {
        Self {
            config: AuditConfig {
                enabled: false,
                ..Default::default()
            },
            sink: Arc::new(NullSink),
        }
    }

    /// Create a console-only logger (useful for development).
    pub fn console_only() -> Self {
        Self {
            config: AuditConfig {
                enabled: true,
                stdout: true,
                ..Default::default()
            },
            sink: Arc::new(ConsoleSink),
        }
    }

    fn resolve_log_path(config: &AuditConfig) -> PathBuf {
        let mut path = PathBuf::from(&config.directory);
        path.push("audit.log");
        path
    }

    /// Check if logging is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Record an audit event.
    pub async fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        if !self.config.enabled {
            return Ok(());
        }

        tracing::debug!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            action = %event.action,
            status = %event.status,
            "Audit event"
        );

        self.sink.record(event).await
    }

    /// Query audit events with filters.
    pub async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        self.sink.query(filter).await
    }
}

/// Filter for querying audit events.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Filter by event type.
    pub event_type: Option<AuditEventType>,
    /// Filter by user ID.
    pub user_id: Option<String>,
    /// Filter by agent ID.
    pub agent_id: Option<String>,
    /// Filter by outcome.
    pub status: Option<AuditStatus>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl AuditFilter {
    /// Whether an event passes this filter.
    pub fn matches(&self, event: &AuditEvent) -> bool {
        if let Some(event_type) = self.event_type {
            if event.event_type != event_type {
                return false;
            }
        }
        if let Some(ref user_id) = self.user_id {
            if event.user_id.as_ref() != Some(user_id) {
                return false;
            }
        }
        if let Some(ref agent_id) = self.agent_id {
            if event.agent_id.as_ref() != Some(agent_id) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if event.status != status {
                return false;
            }
        }
        true
    }
}
