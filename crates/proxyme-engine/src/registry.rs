//! Agent registry boundary.
//!
//! The engine only needs one thing from agent registration: resolving an
//! agent identifier to its granted scope set. The trait keeps that seam
//! narrow; the in-memory implementation also covers registration for
//! wiring and tests.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};

use crate::error::DelegationError;

/// Credentials returned once at registration. The secret is not stored in
/// clear anywhere; only its hash is kept.
#[derive(Debug, Clone)]
pub struct AgentCredentials {
    /// Public client identifier.
    pub client_id: String,
    /// Client secret, shown only at registration time.
    pub client_secret: String,
}

/// Trait boundary for resolving an agent's granted scopes.
#[async_trait]
pub trait AgentRegistry: Send + Sync {
    /// The scope set granted to an agent at registration, or `None` when
    /// the agent is not registered.
    async fn granted_scopes(
        &self,
        agent_id: &str,
    ) -> Result<Option<BTreeSet<String>>, DelegationError>;
}

struct AgentGrant {
    secret_hash: String,
    scopes: BTreeSet<String>,
}

/// In-memory agent registry.
#[derive(Default)]
pub struct InMemoryAgentRegistry {
    agents: RwLock<HashMap<String, AgentGrant>>,
}

impl InMemoryAgentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent with a granted scope set, returning its generated
    /// credentials.
    pub fn register<I, S>(&self, scopes: I) -> AgentCredentials
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client_id = hex::encode(rand::random::<[u8; 16]>());
        let client_secret = hex::encode(rand::random::<[u8; 32]>());

        let grant = AgentGrant {
            secret_hash: hash_secret(&client_secret),
            scopes: scopes.into_iter().map(Into::into).collect(),
        };

        let mut agents = self
            .agents
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        agents.insert(client_id.clone(), grant);

        tracing::info!(client_id = %client_id, "Agent registered");

        AgentCredentials {
            client_id,
            client_secret,
        }
    }

    /// Check a client secret against the stored hash.
    pub fn verify_secret(&self, client_id: &str, client_secret: &str) -> bool {
        let agents = self
            .agents
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        agents
            .get(client_id)
            .is_some_and(|grant| grant.secret_hash == hash_secret(client_secret))
    }
}

#[async_trait]
impl AgentRegistry for InMemoryAgentRegistry {
    async fn granted_scopes(
        &self,
        agent_id: &str,
    ) -> Result<Option<BTreeSet<String>>, DelegationError> {
        let agents = self
            .agents
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(agents.get(agent_id).map(|grant| grant.scopes.clone()))
    }
}

fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}
