//! # proxyme-engine
//!
//! The delegation token lifecycle: issue, validate, revoke.
//!
//! A delegation token binds a user, a registered agent, and a bounded scope
//! set into a signed, time-limited credential. The engine orchestrates four
//! collaborators:
//!
//! - the token codec (`proxyme-token`) for the signed wire format,
//! - the in-memory [`DelegationStore`] of issued tokens,
//! - the durable [`RevocationLedger`], which survives restarts,
//! - the [`AgentRegistry`] boundary resolving an agent to its granted scopes.
//!
//! Each token moves through one lifecycle: issued, valid while unexpired and
//! unrevoked, then terminally expired or revoked. There is no path back out
//! of a terminal state. Every operation emits exactly one audit event
//! tagged with its outcome.

pub mod engine;
pub mod error;
pub mod ledger;
pub mod registry;
pub mod store;

pub use engine::{DelegationEngine, ValidatedDelegation};
pub use error::DelegationError;
pub use ledger::{RevocationLedger, RevocationStatus, SqliteRevocationLedger};
pub use registry::{AgentCredentials, AgentRegistry, InMemoryAgentRegistry};
pub use store::{DelegationRecord, DelegationStore};
