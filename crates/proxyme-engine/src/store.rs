//! In-memory index of issued delegation tokens.

use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};

/// A delegation record, created once at issuance and read-only thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationRecord {
    /// User who granted the delegation.
    pub user_id: String,
    /// Agent the delegation was granted to.
    pub agent_id: String,
    /// Scopes carried by the delegation.
    pub scopes: BTreeSet<String>,
    /// When the token was issued.
    pub issued_at: DateTime<Utc>,
    /// When the delegation lapses. Always after `issued_at`.
    pub expires_at: DateTime<Utc>,
}

impl DelegationRecord {
    /// Whether the delegation is still live at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Process-lifetime index of issued tokens, keyed by the literal token
/// string. Records are lost on restart; the revocation ledger is the only
/// durable defense after that.
///
/// Safe for concurrent issue/validate: all access goes through the lock,
/// and the map is never exposed for external iteration or mutation.
#[derive(Default)]
pub struct DelegationStore {
    records: RwLock<HashMap<String, DelegationRecord>>,
}

impl DelegationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under its token string.
    pub fn insert(&self, token: String, record: DelegationRecord) {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        records.insert(token, record);
    }

    /// Look up the record for a token.
    pub fn lookup(&self, token: &str) -> Option<DelegationRecord> {
        let records = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        records.get(token).cloned()
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        let records = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove records whose `expires_at` has passed, returning how many
    /// were dropped. Uses the same liveness invariant as validation, so a
    /// swept token later reports "no delegation found" rather than
    /// "delegation expired".
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = records.len();
        records.retain(|_, record| record.is_live(now));
        before - records.len()
    }
}
