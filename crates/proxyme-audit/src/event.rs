//! Audit event types.
//!
//! Events carry the fixed fields `event_type`, `action`, and `status` plus
//! optional identity fields (`user_id`, `agent_id`, `token_id`) and a
//! free-form `details` object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type of audit event, one per delegation operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// A delegation token was requested (issue path).
    TokenDelegation,
    /// A delegation token was presented for validation.
    TokenValidation,
    /// A delegation token was revoked.
    TokenRevocation,
}

impl std::fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenDelegation => write!(f, "token_delegation"),
            Self::TokenValidation => write!(f, "token_validation"),
            Self::TokenRevocation => write!(f, "token_revocation"),
        }
    }
}

/// Outcome of the audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    /// The operation succeeded.
    Success,
    /// The operation failed.
    Error,
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// An audit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: Uuid,

    /// When the event occurred (UTC).
    pub occurred_at: DateTime<Utc>,

    /// Event type.
    pub event_type: AuditEventType,

    /// Operation name (e.g., "delegate", "validate_delegation").
    pub action: String,

    /// Outcome of the operation.
    pub status: AuditStatus,

    /// User on whose behalf the operation ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Agent involved in the operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,

    /// Structured details (error messages, scope sets, timestamps).
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,

    /// The token string the event refers to, where known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
}

impl AuditEvent {
    /// Create a new audit event with the required fields.
    pub fn new(event_type: AuditEventType, action: impl Into<String>, status: AuditStatus) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            event_type,
            action: action.into(),
            status,
            user_id: None,
            agent_id: None,
            details: serde_json::Value::Null,
            token_id: None,
        }
    }

    /// Create a builder for an audit event.
    pub fn builder(
        event_type: AuditEventType,
        action: impl Into<String>,
        status: AuditStatus,
    ) -> AuditEventBuilder {
        AuditEventBuilder::new(event_type, action, status)
    }
}

/// Builder for creating audit events.
#[derive(Debug)]
pub struct AuditEventBuilder {
    event: AuditEvent,
}

impl AuditEventBuilder {
    /// Create a new builder with required fields.
    pub fn new(
        event_type: AuditEventType,
        action: impl Into<String>,
        status: AuditStatus,
    ) -> Self {
        Self {
            event: AuditEvent::new(event_type, action, status),
        }
    }

    /// Set the user ID.
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.event.user_id = Some(user_id.into());
        self
    }

    /// Set the agent ID.
    pub fn agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.event.agent_id = Some(agent_id.into());
        self
    }

    /// Set the structured details.
    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.event.details = details;
        self
    }

    /// Set the token the event refers to.
    pub fn token_id(mut self, token: impl Into<String>) -> Self {
        self.event.token_id = Some(token.into());
        self
    }

    /// Build the audit event.
    pub fn build(self) -> AuditEvent {
        self.event
    }
}
