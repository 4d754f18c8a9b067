//! # proxyme-audit
//!
//! Audit event logging for the Proxyme delegation service.
//!
//! Every delegation operation (issue, validate, revoke) produces exactly one
//! audit event tagged with its outcome, echoing back the token identity
//! where known, so the history of any given token can be reconstructed
//! later.
//!
//! ## Event Types
//!
//! | Event Type | Emitted by |
//! |--------------------|--------------------|
//! | `token_delegation` | Issue |
//! | `token_validation` | Validate |
//! | `token_revocation` | Revoke |
//!
//! File output is JSON Lines; console output is one JSON object per line.

pub mod error;
pub mod event;
pub mod logger;
pub mod sink;

pub use error::AuditError;
pub use event::{AuditEvent, AuditEventBuilder, AuditEventType, AuditStatus};
pub use logger::{AuditFilter, AuditLogger};
pub use sink::{AuditSink, ConsoleSink, FileSink, NullSink};
