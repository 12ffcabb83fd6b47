use super::balance::Balance;
use super::key::EntityKey;
use super::record::{TransactionKind, TransactionRecord};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Current balance per entity. Each call is atomic on its own; nothing
/// more is promised, so a read followed by an upsert can race.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Returns a zero balance for keys never written.
    async fn read(&self, key: EntityKey) -> Result<Balance>;
    /// Replaces the stored amount and refreshes the timestamp.
    async fn upsert(&self, key: EntityKey, amount: u64) -> Result<Balance>;
}

/// Append-only transaction history per entity.
#[async_trait]
pub trait HistoryLedger: Send + Sync {
    /// Appends a record under a freshly assigned unique id.
    async fn append(
        &self,
        key: EntityKey,
        delta: i64,
        kind: TransactionKind,
        at: DateTime<Utc>,
    ) -> Result<TransactionRecord>;
    /// All records of `key` in insertion order; empty if none.
    async fn read_all(&self, key: EntityKey) -> Result<Vec<TransactionRecord>>;
}

pub type BalanceStoreRef = Arc<dyn BalanceStore>;
pub type HistoryLedgerRef = Arc<dyn HistoryLedger>;
