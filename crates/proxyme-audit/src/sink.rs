//! Audit sink backends.

use crate::error::AuditError;
use crate::event::AuditEvent;
use crate::logger::AuditFilter;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Trait for audit sink backends.
///
/// `record` must not drop events silently: a sink that cannot persist an
/// event returns an error and leaves the propagation decision to the
/// caller.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError>;

    /// Query recorded events with filters. Sinks without retrieval support
    /// return an empty list.
    async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError>;
}

/// Console sink (JSON lines to stdout). Does not support querying.
pub struct ConsoleSink;

#[async_trait]
impl AuditSink for ConsoleSink {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        let json = serde_json::to_string(&event)?;
        println!("{}", json);
        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        Ok(vec![])
    }
}

/// File sink: appends JSON lines and keeps an in-memory index for querying.
pub struct FileSink {
    path: PathBuf,
    events: RwLock<Vec<AuditEvent>>,
}

impl FileSink {
    /// Create a new file sink writing to `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            events: RwLock::new(Vec::new()),
        })
    }
}

#[async_trait]
impl AuditSink for FileSink {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        let json = serde_json::to_string(&event)?;

        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", json)?;

        let mut events = self
            .events
            .write()
            .map_err(|e| AuditError::RecordFailed(format!("index lock poisoned: {e}")))?;
        events.push(event);

        Ok(())
    }

    async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        let events = self
            .events
            .read()
            .map_err(|e| AuditError::QueryFailed(format!("index lock poisoned: {e}")))?;

        // Newest first, matching the original audit-log query ordering
        let mut results: Vec<_> = events
            .iter()
            .rev()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();

        if let Some(limit) = filter.limit {
            results.truncate(limit);
        }

        Ok(results)
    }
}

/// No-op sink for disabled audit logging.
pub struct NullSink;

#[async_trait]
impl AuditSink for NullSink {
    async fn record(&self, _event: AuditEvent) -> Result<(), AuditError> {
        Ok(())
    }

    async fn query(&self, _filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        Ok(vec![])
    }
}
