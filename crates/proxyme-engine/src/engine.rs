//! Delegation engine orchestration.
//!
//! Ties the codec, store, ledger, registry, and audit sink together into
//! the three public operations: issue, validate, revoke.

use chrono::{Duration, Utc};
use proxyme_audit::{AuditEvent, AuditEventType, AuditLogger, AuditStatus};
use proxyme_core::EngineConfig;
use proxyme_token::{codec, Algorithm, Claims, DecodeOptions};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::DelegationError;
use crate::ledger::{RevocationLedger, RevocationStatus};
use crate::registry::AgentRegistry;
use crate::store::{DelegationRecord, DelegationStore};

/// The claims a presented token must carry to validate.
const REQUIRED_CLAIMS: [&str; 4] = ["exp", "iss", "aud", "sub"];

/// Result of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedDelegation {
    /// User who granted the delegation.
    pub user_id: String,
    /// Agent the token was issued to.
    pub agent_id: String,
    /// Scopes carried by the delegation, sorted.
    pub scopes: Vec<String>,
}

/// The delegation engine.
///
/// Safe to share across concurrent request handlers: the store is
/// internally synchronized and the ledger serializes its own inserts.
pub struct DelegationEngine {
    issuer: String,
    secret: Vec<u8>,
    token_ttl: Duration,
    store: DelegationStore,
    registry: Arc<dyn AgentRegistry>,
    ledger: Arc<dyn RevocationLedger>,
    audit: Arc<AuditLogger>,
}

impl DelegationEngine {
    /// Build an engine from configuration and collaborator boundaries.
    ///
    /// Fails when no signing secret is configured or the TTL is zero; the
    /// secret and algorithm are fixed for the process lifetime.
    pub fn new(
        config: &EngineConfig,
        registry: Arc<dyn AgentRegistry>,
        ledger: Arc<dyn RevocationLedger>,
        audit: Arc<AuditLogger>,
    ) -> Result<Self, DelegationError> {
        let secret = config
            .resolve_secret()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                DelegationError::Internal(anyhow::anyhow!("no signing secret configured"))
            })?;
        if config.token_ttl_secs == 0 {
            return Err(DelegationError::Internal(anyhow::anyhow!(
                "token TTL must be positive"
            )));
        }

        Ok(Self {
            issuer: config.issuer.clone(),
            secret: secret.into_bytes(),
            token_ttl: Duration::seconds(config.token_ttl_secs as i64),
            store: DelegationStore::new(),
            registry,
            ledger,
            audit,
        })
    }

    /// The issuer placed in the `iss` claim.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Number of delegation records currently held in the store.
    pub fn active_delegations(&self) -> usize {
        self.store.len()
    }

    /// Issue a delegation token binding `user_id`, `agent_id`, and the
    /// requested scopes.
    ///
    /// The requested scopes must be a subset (case-sensitive, order
    /// irrelevant) of the scopes granted to the agent at registration.
    pub async fn issue(
        &self,
        user_id: &str,
        agent_id: &str,
        requested_scopes: &[String],
    ) -> Result<String, DelegationError> {
        let granted = match self.registry.granted_scopes(agent_id).await {
            Ok(granted) => granted,
            Err(err) => {
                self.record_audit(issue_error(user_id, agent_id, &err)).await;
                return Err(err);
            }
        };
        let Some(granted) = granted else {
            let err = DelegationError::UnknownAgent(agent_id.to_string());
            self.record_audit(issue_error(user_id, agent_id, &err)).await;
            return Err(err);
        };

        let requested: BTreeSet<String> = requested_scopes.iter().cloned().collect();
        if !requested.is_subset(&granted) {
            let event = AuditEvent::builder(
                AuditEventType::TokenDelegation,
                "delegate",
                AuditStatus::Error,
            )
            .user_id(user_id)
            .agent_id(agent_id)
            .details(json!({
                "error": "Invalid scope request",
                "requested_scopes": requested,
                "granted_scopes": granted,
            }))
            .build();
            self.record_audit(event).await;
            return Err(DelegationError::ScopeNotGranted {
                requested: requested.into_iter().collect(),
                granted: granted.into_iter().collect(),
            });
        }

        let now = Utc::now();
        let expires_at = now + self.token_ttl;
        let claims = Claims::new()
            .with_issuer(&self.issuer)
            .with_subject(user_id)
            .with_audience(agent_id)
            .with_issued_at(now.timestamp())
            .with_expiry(expires_at.timestamp())
            .with_agent_id(agent_id)
            .with_scopes(requested.iter())
            // jti keeps concurrently issued tokens distinct even within
            // the same second
            .with_claim("jti", Uuid::new_v4().to_string().into());

        let token = match codec::encode(&claims, &self.secret, Algorithm::Hs256) {
            Ok(token) => token,
            Err(err) => {
                let err = DelegationError::from(err);
                self.record_audit(issue_error(user_id, agent_id, &err)).await;
                return Err(err);
            }
        };

        let swept = self.store.purge_expired(now);
        if swept > 0 {
            tracing::debug!(swept, "purged expired delegation records");
        }

        self.store.insert(
            token.clone(),
            DelegationRecord {
                user_id: user_id.to_string(),
                agent_id: agent_id.to_string(),
                scopes: requested.clone(),
                issued_at: now,
                expires_at,
            },
        );

        let event = AuditEvent::builder(
            AuditEventType::TokenDelegation,
            "delegate",
            AuditStatus::Success,
        )
        .user_id(user_id)
        .agent_id(agent_id)
        .details(json!({ "scopes": requested }))
        .token_id(&token)
        .build();
        self.record_audit(event).await;

        tracing::info!(agent_id = %agent_id, "Delegation token issued");
        Ok(token)
    }

    /// Validate a presented token.
    ///
    /// Checks, in order: signature, claim expiry, audience, and required
    /// claims via the codec; then the delegation store; then the record's
    /// own expiry; then the revocation ledger. Revocation always wins over
    /// an otherwise-valid token.
    pub async fn validate(&self, token: &str) -> Result<ValidatedDelegation, DelegationError> {
        if token.is_empty() {
            let err = DelegationError::NoToken;
            let event = AuditEvent::builder(
                AuditEventType::TokenValidation,
                "validate_delegation",
                AuditStatus::Error,
            )
            .details(json!({"error": err.to_string()}))
            .build();
            self.record_audit(event).await;
            return Err(err);
        }

        let result = self.validate_inner(token).await;

        let event = match &result {
            Ok(delegation) => AuditEvent::builder(
                AuditEventType::TokenValidation,
                "validate_delegation",
                AuditStatus::Success,
            )
            .user_id(&delegation.user_id)
            .agent_id(&delegation.agent_id)
            .details(json!({"scopes": delegation.scopes}))
            .token_id(token)
            .build(),
            Err(err) => AuditEvent::builder(
                AuditEventType::TokenValidation,
                "validate_delegation",
                AuditStatus::Error,
            )
            .details(json!({"error": err.to_string()}))
            .token_id(token)
            .build(),
        };
        self.record_audit(event).await;

        result
    }

    async fn validate_inner(&self, token: &str) -> Result<ValidatedDelegation, DelegationError> {
        // Pre-read the audience without verification; the verifying decode
        // below repeats the parse authoritatively, so a failed pre-read is
        // swallowed rather than short-circuiting signature verification.
        let audience = codec::decode(token, None, &DecodeOptions::unverified())
            .ok()
            .and_then(|claims| claims.audience().map(str::to_string));

        let mut options = DecodeOptions::default().with_required(REQUIRED_CLAIMS);
        if let Some(audience) = audience {
            options = options.with_audience(audience);
        }
        codec::decode(token, Some(&self.secret), &options)?;

        let record = self
            .store
            .lookup(token)
            .ok_or(DelegationError::UnknownDelegation)?;

        // The record's expiry is checked independently of the claim's
        if !record.is_live(Utc::now()) {
            return Err(DelegationError::DelegationExpired);
        }

        if self.ledger.is_revoked(token).await? {
            return Err(DelegationError::TokenRevoked);
        }

        Ok(ValidatedDelegation {
            user_id: record.user_id,
            agent_id: record.agent_id,
            scopes: record.scopes.into_iter().collect(),
        })
    }

    /// Revoke a token.
    ///
    /// Idempotent, and deliberately permissive: any syntactically present
    /// token string may be revoked, whether or not it was issued through
    /// this engine or is still valid.
    pub async fn revoke(&self, token: &str) -> Result<RevocationStatus, DelegationError> {
        if token.is_empty() {
            let err = DelegationError::NoToken;
            let event = AuditEvent::builder(
                AuditEventType::TokenRevocation,
                "revoke_delegation",
                AuditStatus::Error,
            )
            .details(json!({"error": err.to_string()}))
            .build();
            self.record_audit(event).await;
            return Err(err);
        }

        let revoked_at = Utc::now();
        match self.ledger.revoke(token, revoked_at).await {
            Ok(status) => {
                let event = AuditEvent::builder(
                    AuditEventType::TokenRevocation,
                    "revoke_delegation",
                    AuditStatus::Success,
                )
                .details(json!({
                    "revoked_at": revoked_at.to_rfc3339(),
                    "already_revoked": status == RevocationStatus::AlreadyRevoked,
                }))
                .token_id(token)
                .build();
                self.record_audit(event).await;

                tracing::info!("Delegation token revoked");
                Ok(status)
            }
            Err(err) => {
                let event = AuditEvent::builder(
                    AuditEventType::TokenRevocation,
                    "revoke_delegation",
                    AuditStatus::Error,
                )
                .details(json!({"error": err.to_string()}))
                .token_id(token)
                .build();
                self.record_audit(event).await;
                Err(err)
            }
        }
    }

    /// Record an audit event best-effort: a sink failure is logged but
    /// never turns a completed operation into a caller-visible failure.
    async fn record_audit(&self, event: AuditEvent) {
        if let Err(err) = self.audit.record(event).await {
            tracing::warn!(error = %err, "audit event was not recorded");
        }
    }
}

fn issue_error(user_id: &str, agent_id: &str, err: &DelegationError) -> AuditEvent {
    AuditEvent::builder(
        AuditEventType::TokenDelegation,
        "delegate",
        AuditStatus::Error,
    )
    .user_id(user_id)
    .agent_id(agent_id)
    .details(json!({"error": err.to_string()}))
    .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::SqliteRevocationLedger;
    use crate::registry::InMemoryAgentRegistry;

    const SECRET: &str = "test-secret";

    async fn engine_with_registry() -> (DelegationEngine, Arc<InMemoryAgentRegistry>) {
        let config = EngineConfig {
            issuer: "http://127.0.0.1:5001".to_string(),
            secret: Some(SECRET.to_string()),
            secret_env: None,
            token_ttl_secs: 3600,
        };
        let registry = Arc::new(InMemoryAgentRegistry::new());
        let ledger = Arc::new(SqliteRevocationLedger::in_memory().await.unwrap());
        let engine = DelegationEngine::new(
            &config,
            Arc::clone(&registry) as Arc<dyn AgentRegistry>,
            ledger,
            Arc::new(AuditLogger::disabled()),
        )
        .unwrap();
        (engine, registry)
    }

    #[tokio::test]
    async fn engine_requires_a_secret() {
        let config = EngineConfig::default();
        let registry = Arc::new(InMemoryAgentRegistry::new());
        let ledger = Arc::new(SqliteRevocationLedger::in_memory().await.unwrap());
        let result = DelegationEngine::new(
            &config,
            registry,
            ledger,
            Arc::new(AuditLogger::disabled()),
        );
        assert!(matches!(result, Err(DelegationError::Internal(_))));
    }

    #[tokio::test]
    async fn well_signed_but_unissued_token_is_unknown() {
        let (engine, registry) = engine_with_registry().await;
        let creds = registry.register(["read"]);

        let now = Utc::now();
        let claims = Claims::new()
            .with_issuer("http://127.0.0.1:5001")
            .with_subject("u1")
            .with_audience(&creds.client_id)
            .with_issued_at(now.timestamp())
            .with_expiry(now.timestamp() + 3600)
            .with_agent_id(&creds.client_id)
            .with_scopes(["read"]);
        let token = codec::encode(&claims, SECRET.as_bytes(), Algorithm::Hs256).unwrap();

        let err = engine.validate(&token).await.unwrap_err();
        assert!(matches!(err, DelegationError::UnknownDelegation));
    }

    #[tokio::test]
    async fn record_expiry_is_checked_independently_of_the_claim() {
        let (engine, registry) = engine_with_registry().await;
        let creds = registry.register(["read"]);

        // Claim says the token is live; the stored record disagrees
        let now = Utc::now();
        let claims = Claims::new()
            .with_issuer("http://127.0.0.1:5001")
            .with_subject("u1")
            .with_audience(&creds.client_id)
            .with_issued_at(now.timestamp())
            .with_expiry(now.timestamp() + 3600)
            .with_agent_id(&creds.client_id)
            .with_scopes(["read"]);
        let token = codec::encode(&claims, SECRET.as_bytes(), Algorithm::Hs256).unwrap();

        engine.store.insert(
            token.clone(),
            DelegationRecord {
                user_id: "u1".to_string(),
                agent_id: creds.client_id.clone(),
                scopes: ["read".to_string()].into(),
                issued_at: now - Duration::hours(2),
                expires_at: now - Duration::hours(1),
            },
        );

        let err = engine.validate(&token).await.unwrap_err();
        assert!(matches!(err, DelegationError::DelegationExpired));
    }

    #[tokio::test]
    async fn issuing_sweeps_expired_records() {
        let (engine, registry) = engine_with_registry().await;
        let creds = registry.register(["read"]);

        let now = Utc::now();
        engine.store.insert(
            "stale-token".to_string(),
            DelegationRecord {
                user_id: "u0".to_string(),
                agent_id: creds.client_id.clone(),
                scopes: ["read".to_string()].into(),
                issued_at: now - Duration::hours(2),
                expires_at: now - Duration::hours(1),
            },
        );
        assert_eq!(engine.active_delegations(), 1);

        let scopes = vec!["read".to_string()];
        engine.issue("u1", &creds.client_id, &scopes).await.unwrap();

        // The stale record is gone; only the fresh issuance remains
        assert_eq!(engine.active_delegations(), 1);
        assert!(engine.store.lookup("stale-token").is_none());
    }
}
