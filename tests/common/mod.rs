#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pointledger::application::orchestrator::TransactionOrchestrator;
use pointledger::domain::balance::Balance;
use pointledger::domain::key::EntityKey;
use pointledger::domain::ports::{BalanceStore, HistoryLedger};
use pointledger::domain::record::{TransactionKind, TransactionRecord};
use pointledger::error::{LedgerError, Result};
use pointledger::infrastructure::in_memory::{InMemoryBalanceStore, InMemoryHistoryLedger};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub fn orchestrator() -> TransactionOrchestrator {
    TransactionOrchestrator::new(
        Arc::new(InMemoryBalanceStore::new()),
        Arc::new(InMemoryHistoryLedger::new()),
    )
}

/// Stores that sleep a random 0..=`max_ms` on every call.
pub fn racy_orchestrator(max_ms: u64) -> TransactionOrchestrator {
    let max = Duration::from_millis(max_ms);
    TransactionOrchestrator::new(
        Arc::new(InMemoryBalanceStore::with_latency(max)),
        Arc::new(InMemoryHistoryLedger::with_latency(max)),
    )
}

pub fn key(value: i64) -> EntityKey {
    EntityKey::new(value).unwrap()
}

/// Balance store with a fixed delay per key.
#[derive(Default)]
pub struct SlowBalanceStore {
    inner: InMemoryBalanceStore,
    delays: HashMap<EntityKey, Duration>,
}

impl SlowBalanceStore {
    pub fn new(delays: impl IntoIterator<Item = (i64, Duration)>) -> Self {
        Self {
            inner: InMemoryBalanceStore::new(),
            delays: delays.into_iter().map(|(k, d)| (key(k), d)).collect(),
        }
    }

    async fn pause(&self, key: EntityKey) {
        if let Some(delay) = self.delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }
    }
}

#[async_trait]
impl BalanceStore for SlowBalanceStore {
    async fn read(&self, key: EntityKey) -> Result<Balance> {
        self.pause(key).await;
        self.inner.read(key).await
    }

    async fn upsert(&self, key: EntityKey, amount: u64) -> Result<Balance> {
        self.pause(key).await;
        self.inner.upsert(key, amount).await
    }
}

/// Balance store whose next `n` upserts fail.
#[derive(Default)]
pub struct FlakyBalanceStore {
    inner: InMemoryBalanceStore,
    failures: AtomicUsize,
}

impl FlakyBalanceStore {
    pub fn failing_next(n: usize) -> Self {
        Self {
            inner: InMemoryBalanceStore::new(),
            failures: AtomicUsize::new(n),
        }
    }
}

#[async_trait]
impl BalanceStore for FlakyBalanceStore {
    async fn read(&self, key: EntityKey) -> Result<Balance> {
        self.inner.read(key).await
    }

    async fn upsert(&self, key: EntityKey, amount: u64) -> Result<Balance> {
        let remaining = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if remaining.is_ok() {
            return Err(LedgerError::storage("balance table unavailable"));
        }
        self.inner.upsert(key, amount).await
    }
}

/// Balance store whose first read of one key panics.
pub struct PanickingBalanceStore {
    inner: InMemoryBalanceStore,
    key: EntityKey,
    armed: AtomicBool,
}

impl PanickingBalanceStore {
    pub fn panicking_once_for(value: i64) -> Self {
        Self {
            inner: InMemoryBalanceStore::new(),
            key: key(value),
            armed: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl BalanceStore for PanickingBalanceStore {
    async fn read(&self, key: EntityKey) -> Result<Balance> {
        if key == self.key && self.armed.swap(false, Ordering::SeqCst) {
            panic!("balance read for {key} panicked");
        }
        self.inner.read(key).await
    }

    async fn upsert(&self, key: EntityKey, amount: u64) -> Result<Balance> {
        self.inner.upsert(key, amount).await
    }
}

/// History ledger that rejects every append.
#[derive(Default)]
pub struct BrokenHistoryLedger;

#[async_trait]
impl HistoryLedger for BrokenHistoryLedger {
    async fn append(
        &self,
        _key: EntityKey,
        _delta: i64,
        _kind: TransactionKind,
        _at: DateTime<Utc>,
    ) -> Result<TransactionRecord> {
        Err(LedgerError::storage("history table unavailable"))
    }

    async fn read_all(&self, _key: EntityKey) -> Result<Vec<TransactionRecord>> {
        Ok(Vec::new())
    }
}
