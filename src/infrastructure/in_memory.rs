use super::simulate_latency;
use crate::domain::balance::Balance;
use crate::domain::key::EntityKey;
use crate::domain::ports::{BalanceStore, HistoryLedger};
use crate::domain::record::{TransactionKind, TransactionRecord};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// A thread-safe in-memory balance store.
///
/// Uses `Arc<RwLock<HashMap<EntityKey, Balance>>>` to allow shared concurrent access.
/// Each call is atomic on its own, but a read followed by an upsert is not.
/// With [`with_latency`](Self::with_latency) every call first sleeps for a
/// random duration, which widens that window the way a remote table would.
#[derive(Default, Clone)]
pub struct InMemoryBalanceStore {
    balances: Arc<RwLock<HashMap<EntityKey, Balance>>>,
    latency: Option<Duration>,
}

impl InMemoryBalanceStore {
    /// Creates a new, empty in-memory balance store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(max: Duration) -> Self {
        Self {
            latency: Some(max),
            ..Self::default()
        }
    }
}

#[async_trait]
impl BalanceStore for InMemoryBalanceStore {
    async fn read(&self, key: EntityKey) -> Result<Balance> {
        simulate_latency(self.latency).await;
        let balances = self.balances.read().await;
        Ok(balances
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Balance::zero(key)))
    }

    async fn upsert(&self, key: EntityKey, amount: u64) -> Result<Balance> {
        simulate_latency(self.latency).await;
        let balance = Balance {
            key,
            amount,
            updated_at: Utc::now(),
        };
        let mut balances = self.balances.write().await;
        balances.insert(key, balance.clone());
        Ok(balance)
    }
}

/// A thread-safe in-memory history ledger.
///
/// Records are kept in one append-only vector, so filtering by key preserves
/// insertion order. Ids come from a cursor starting at 1.
#[derive(Clone)]
pub struct InMemoryHistoryLedger {
    records: Arc<RwLock<Vec<TransactionRecord>>>,
    cursor: Arc<AtomicU64>,
    latency: Option<Duration>,
}

impl Default for InMemoryHistoryLedger {
    fn default() -> Self {
        Self {
            records: Arc::default(),
            cursor: Arc::new(AtomicU64::new(1)),
            latency: None,
        }
    }
}

impl InMemoryHistoryLedger {
    /// Creates a new, empty in-memory history ledger.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(max: Duration) -> Self {
        Self {
            latency: Some(max),
            ..Self::default()
        }
    }
}

#[async_trait]
impl HistoryLedger for InMemoryHistoryLedger {
    async fn append(
        &self,
        key: EntityKey,
        delta: i64,
        kind: TransactionKind,
        at: DateTime<Utc>,
    ) -> Result<TransactionRecord> {
        simulate_latency(self.latency).await;
        let mut records = self.records.write().await;
        let record = TransactionRecord {
            id: self.cursor.fetch_add(1, Ordering::Relaxed),
            key,
            delta,
            kind,
            timestamp: at,
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn read_all(&self, key: EntityKey) -> Result<Vec<TransactionRecord>> {
        simulate_latency(self.latency).await;
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| r.key == key).cloned().collect())
    }
}
