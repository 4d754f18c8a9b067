//! # proxyme-core
//!
//! Configuration types shared across the Proxyme crates.
//!
//! Configuration is loaded from a single YAML file (proxyme.yaml) and split
//! into sections for the delegation engine, the revocation store, and audit
//! logging.

pub mod config;

pub use config::{
    AuditConfig, ConfigError, EngineConfig, ProxymeConfig, RevocationConfig,
};
