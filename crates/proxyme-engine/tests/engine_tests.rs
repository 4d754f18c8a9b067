//! Integration tests for the delegation engine.
//!
//! Exercises the full lifecycle (issue, validate, revoke) against the
//! in-memory registry, a SQLite revocation ledger, and a capturing audit
//! sink.

use async_trait::async_trait;
use proxyme_audit::{
    AuditError, AuditEvent, AuditEventType, AuditFilter, AuditLogger, AuditSink, AuditStatus,
};
use proxyme_core::{AuditConfig, EngineConfig, ProxymeConfig};
use proxyme_engine::{
    AgentRegistry, DelegationEngine, DelegationError, InMemoryAgentRegistry, RevocationStatus,
    SqliteRevocationLedger,
};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// Sink that keeps every event in memory so tests can count outcomes.
#[derive(Default)]
struct MemorySink {
    events: RwLock<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditSink for MemorySink {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        self.events.write().unwrap().push(event);
        Ok(())
    }

    async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        let events = self.events.read().unwrap();
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

struct Harness {
    engine: Arc<DelegationEngine>,
    registry: Arc<InMemoryAgentRegistry>,
    sink: Arc<MemorySink>,
}

async fn harness() -> Harness {
    let config = EngineConfig {
        issuer: "http://127.0.0.1:5001".to_string(),
        secret: Some("development-secret-key".to_string()),
        secret_env: None,
        token_ttl_secs: 3600,
    };
    let registry = Arc::new(InMemoryAgentRegistry::new());
    let ledger = Arc::new(SqliteRevocationLedger::in_memory().await.unwrap());
    let sink = Arc::new(MemorySink::default());
    let audit = Arc::new(AuditLogger::with_sink(
        AuditConfig::default(),
        Arc::clone(&sink) as Arc<dyn AuditSink>,
    ));

    let engine = DelegationEngine::new(
        &config,
        Arc::clone(&registry) as Arc<dyn AgentRegistry>,
        ledger,
        audit,
    )
    .unwrap();

    Harness {
        engine: Arc::new(engine),
        registry,
        sink,
    }
}

fn scopes(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn end_to_end_delegation_lifecycle() {
    let h = harness().await;
    let creds = h.registry.register(["read", "write"]);

    // Issue a delegation for a subset of the granted scopes
    let token = h
        .engine
        .issue("u1", &creds.client_id, &scopes(&["read"]))
        .await
        .unwrap();
    assert_eq!(token.split('.').count(), 3);

    // Validate returns the bound identity and scopes
    let delegation = h.engine.validate(&token).await.unwrap();
    assert_eq!(delegation.user_id, "u1");
    assert_eq!(delegation.agent_id, creds.client_id);
    assert_eq!(delegation.scopes, vec!["read".to_string()]);

    // Revoke, then validation must fail with the revocation error
    let status = h.engine.revoke(&token).await.unwrap();
    assert_eq!(status, RevocationStatus::Revoked);

    let err = h.engine.validate(&token).await.unwrap_err();
    assert!(matches!(err, DelegationError::TokenRevoked));
}

#[tokio::test]
async fn unknown_agent_is_rejected_and_leaves_no_record() {
    let h = harness().await;

    let err = h
        .engine
        .issue("u1", "not-registered", &scopes(&["read"]))
        .await
        .unwrap_err();
    assert!(matches!(err, DelegationError::UnknownAgent(_)));
    assert_eq!(h.engine.active_delegations(), 0);
}

#[tokio::test]
async fn scope_subset_is_enforced_regardless_of_order() {
    let h = harness().await;
    let creds = h.registry.register(["read", "write"]);

    // Ordering within the grant never matters
    h.engine
        .issue("u1", &creds.client_id, &scopes(&["write", "read"]))
        .await
        .unwrap();

    for requested in [&["read", "admin"][..], &["admin", "read"][..]] {
        let err = h
            .engine
            .issue("u1", &creds.client_id, &scopes(requested))
            .await
            .unwrap_err();
        assert!(matches!(err, DelegationError::ScopeNotGranted { .. }));
    }
}

#[tokio::test]
async fn revocation_is_idempotent() {
    let h = harness().await;
    let creds = h.registry.register(["read"]);
    let token = h
        .engine
        .issue("u1", &creds.client_id, &scopes(&["read"]))
        .await
        .unwrap();

    assert_eq!(
        h.engine.revoke(&token).await.unwrap(),
        RevocationStatus::Revoked
    );
    assert_eq!(
        h.engine.revoke(&token).await.unwrap(),
        RevocationStatus::AlreadyRevoked
    );
}

#[tokio::test]
async fn revocation_does_not_require_prior_issuance() {
    let h = harness().await;

    // Defense in depth: any token string may be revoked
    let status = h.engine.revoke("never.issued.token").await.unwrap();
    assert_eq!(status, RevocationStatus::Revoked);
}

#[tokio::test]
async fn tampered_token_fails_signature_verification() {
    let h = harness().await;
    let creds = h.registry.register(["read"]);
    let token = h
        .engine
        .issue("u1", &creds.client_id, &scopes(&["read"]))
        .await
        .unwrap();

    let parts: Vec<&str> = token.split('.').collect();
    let first = parts[2].chars().next().unwrap();
    let flipped = if first == 'A' { 'B' } else { 'A' };
    let tampered = format!("{}.{}.{}{}", parts[0], parts[1], flipped, &parts[2][1..]);

    let err = h.engine.validate(&tampered).await.unwrap_err();
    assert!(matches!(err, DelegationError::SignatureInvalid));
}

#[tokio::test]
async fn empty_token_is_rejected_everywhere() {
    let h = harness().await;

    let err = h.engine.validate("").await.unwrap_err();
    assert!(matches!(err, DelegationError::NoToken));

    let err = h.engine.revoke("").await.unwrap_err();
    assert!(matches!(err, DelegationError::NoToken));
}

#[tokio::test]
async fn malformed_token_is_rejected() {
    let h = harness().await;

    let err = h.engine.validate("not-a-token").await.unwrap_err();
    assert!(matches!(err, DelegationError::MalformedToken(_)));
}

#[tokio::test]
async fn concurrent_issuance_produces_distinct_valid_tokens() {
    let h = harness().await;
    let creds = h.registry.register(["read", "write"]);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let engine = Arc::clone(&h.engine);
        let agent_id = creds.client_id.clone();
        handles.push(tokio::spawn(async move {
            engine.issue("u1", &agent_id, &scopes(&["read"])).await
        }));
    }

    let mut tokens = HashSet::new();
    for handle in handles {
        let token = handle.await.unwrap().unwrap();
        tokens.insert(token);
    }
    assert_eq!(tokens.len(), 16);

    for token in &tokens {
        h.engine.validate(token).await.unwrap();
    }
}

#[tokio::test]
async fn every_outcome_emits_exactly_one_audit_event() {
    let h = harness().await;
    let creds = h.registry.register(["read"]);

    let token = h
        .engine
        .issue("u1", &creds.client_id, &scopes(&["read"]))
        .await
        .unwrap();
    h.engine.validate(&token).await.unwrap();
    h.engine.validate("").await.unwrap_err();
    h.engine.revoke(&token).await.unwrap();
    h.engine.validate(&token).await.unwrap_err();

    let delegation_events = h
        .sink
        .query(AuditFilter {
            event_type: Some(AuditEventType::TokenDelegation),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(delegation_events.len(), 1);
    assert_eq!(delegation_events[0].status, AuditStatus::Success);
    assert_eq!(delegation_events[0].token_id.as_deref(), Some(token.as_str()));

    let validation_events = h
        .sink
        .query(AuditFilter {
            event_type: Some(AuditEventType::TokenValidation),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(validation_events.len(), 3);

    let failures: Vec<_> = validation_events
        .iter()
        .filter(|e| e.status == AuditStatus::Error)
        .collect();
    assert_eq!(failures.len(), 2);

    let revocation_events = h
        .sink
        .query(AuditFilter {
            event_type: Some(AuditEventType::TokenRevocation),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(revocation_events.len(), 1);
    assert_eq!(revocation_events[0].token_id.as_deref(), Some(token.as_str()));
}

#[tokio::test]
async fn failed_issue_emits_exactly_one_audit_event() {
    let h = harness().await;
    let creds = h.registry.register(["read"]);

    h.engine
        .issue("u1", "not-registered", &scopes(&["read"]))
        .await
        .unwrap_err();
    h.engine
        .issue("u1", &creds.client_id, &scopes(&["admin"]))
        .await
        .unwrap_err();

    let failures = h
        .sink
        .query(AuditFilter {
            event_type: Some(AuditEventType::TokenDelegation),
            status: Some(AuditStatus::Error),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(failures.len(), 2);
}

#[tokio::test]
async fn engine_builds_from_yaml_config() {
    let yaml = r#"
project: proxyme
engine:
  issuer: "https://auth.example.com"
  secret: "yaml-secret"
  token_ttl_secs: 900
revocation:
  database_url: "sqlite::memory:"
"#;
    let config = ProxymeConfig::from_yaml(yaml).unwrap();

    let registry = Arc::new(InMemoryAgentRegistry::new());
    let ledger = Arc::new(SqliteRevocationLedger::in_memory().await.unwrap());
    let engine = DelegationEngine::new(
        &config.engine,
        Arc::clone(&registry) as Arc<dyn AgentRegistry>,
        ledger,
        Arc::new(AuditLogger::disabled()),
    )
    .unwrap();
    assert_eq!(engine.issuer(), "https://auth.example.com");

    let creds = registry.register(["read"]);
    let token = engine
        .issue("u1", &creds.client_id, &scopes(&["read"]))
        .await
        .unwrap();
    engine.validate(&token).await.unwrap();
}
