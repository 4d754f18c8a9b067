//! Durable revocation ledger.
//!
//! An append-only set of revoked token strings. Unlike the delegation
//! store, the ledger survives process restarts: once the in-memory
//! issuance record is gone, revocation is the only remaining defense, so
//! it must be consulted on every validation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use proxyme_core::RevocationConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use crate::error::DelegationError;

/// Outcome of a revocation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationStatus {
    /// The token was newly revoked.
    Revoked,
    /// The token was already in the ledger; the request was a no-op.
    AlreadyRevoked,
}

/// Trait boundary for the revocation ledger.
#[async_trait]
pub trait RevocationLedger: Send + Sync {
    /// Insert a revocation record. Idempotent: revoking an already-revoked
    /// token reports [`RevocationStatus::AlreadyRevoked`] without error,
    /// and concurrent duplicate inserts never both report `Revoked`.
    async fn revoke(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<RevocationStatus, DelegationError>;

    /// Whether a token appears in the ledger.
    async fn is_revoked(&self, token: &str) -> Result<bool, DelegationError>;
}

/// SQLite-backed revocation ledger.
///
/// One table, `revoked_tokens (token TEXT PRIMARY KEY, revoked_at TEXT)`,
/// with the primary key making the check-and-insert atomic per token.
/// `revoked_at` is stored as an ISO-8601 UTC string.
pub struct SqliteRevocationLedger {
    pool: SqlitePool,
}

impl SqliteRevocationLedger {
    /// Connect to the configured database, creating the file and schema if
    /// missing.
    pub async fn connect(config: &RevocationConfig) -> Result<Self, DelegationError> {
        let options =
            SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;
        Self::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Open an in-memory ledger, for tests and ephemeral deployments.
    pub async fn in_memory() -> Result<Self, DelegationError> {
        // A single connection: every SQLite :memory: connection is its own
        // database
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Self::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn init_schema(pool: &SqlitePool) -> Result<(), DelegationError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS revoked_tokens (
                token TEXT PRIMARY KEY,
                revoked_at TEXT NOT NULL
            )",
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Number of revocation records, for diagnostics.
    pub async fn len(&self) -> Result<u64, DelegationError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM revoked_tokens")
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.try_get("n")?;
        Ok(n as u64)
    }

    /// Close the underlying pool, flushing outstanding work.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl RevocationLedger for SqliteRevocationLedger {
    async fn revoke(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<RevocationStatus, DelegationError> {
        let result = sqlx::query(
            "INSERT INTO revoked_tokens (token, revoked_at) VALUES (?, ?)
             ON CONFLICT(token) DO NOTHING",
        )
        .bind(token)
        .bind(revoked_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            Ok(RevocationStatus::Revoked)
        } else {
            Ok(RevocationStatus::AlreadyRevoked)
        }
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, DelegationError> {
        let row = sqlx::query("SELECT 1 FROM revoked_tokens WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}
