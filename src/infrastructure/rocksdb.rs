use super::simulate_latency;
use crate::domain::balance::Balance;
use crate::domain::key::EntityKey;
use crate::domain::ports::{BalanceStore, HistoryLedger};
use crate::domain::record::{TransactionKind, TransactionRecord};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Column Family for storing current balances.
pub const CF_BALANCES: &str = "balances";
/// Column Family for storing transaction history.
pub const CF_HISTORY: &str = "history";

/// A persistent store implementation using RocksDB.
///
/// Implements both [`BalanceStore`] and [`HistoryLedger`] using separate Column
/// Families. History rows are keyed by entity key then record id (both big
/// endian), so a prefix scan returns a key's records in insertion order.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    cursor: Arc<AtomicU64>,
    latency: Option<Duration>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families exist and resumes record ids
    /// after the largest one already stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_balances = ColumnFamilyDescriptor::new(CF_BALANCES, Options::default());
        let cf_history = ColumnFamilyDescriptor::new(CF_HISTORY, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_balances, cf_history])?;
        let store = Self {
            db: Arc::new(db),
            cursor: Arc::new(AtomicU64::new(1)),
            latency: None,
        };
        let next_id = store.max_record_id()? + 1;
        store.cursor.store(next_id, Ordering::SeqCst);

        Ok(store)
    }

    pub fn with_latency(mut self, max: Duration) -> Self {
        self.latency = Some(max);
        self
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            LedgerError::storage(format!("{name} column family not found"))
        })
    }

    fn max_record_id(&self) -> Result<u64> {
        let cf = self.cf(CF_HISTORY)?;
        let mut max = 0;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (row_key, _value) = item?;
            max = max.max(record_id(&row_key)?);
        }
        Ok(max)
    }
}

/// Record id encoded in the last 8 bytes of a history row key.
fn record_id(row_key: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = row_key
        .get(8..16)
        .and_then(|id| id.try_into().ok())
        .ok_or_else(|| {
            LedgerError::storage(format!("malformed history key of {} bytes", row_key.len()))
        })?;
    Ok(u64::from_be_bytes(bytes))
}

fn history_key(key: EntityKey, id: u64) -> [u8; 16] {
    let mut bytes = [0u8; 16];
    bytes[..8].copy_from_slice(&key.value().to_be_bytes());
    bytes[8..].copy_from_slice(&id.to_be_bytes());
    bytes
}

#[async_trait]
impl BalanceStore for RocksDbStore {
    async fn read(&self, key: EntityKey) -> Result<Balance> {
        simulate_latency(self.latency).await;
        let cf = self.cf(CF_BALANCES)?;
        match self.db.get_cf(cf, key.value().to_be_bytes())? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(LedgerError::storage),
            None => Ok(Balance::zero(key)),
        }
    }

    async fn upsert(&self, key: EntityKey, amount: u64) -> Result<Balance> {
        simulate_latency(self.latency).await;
        let cf = self.cf(CF_BALANCES)?;
        let balance = Balance {
            key,
            amount,
            updated_at: Utc::now(),
        };
        let value = serde_json::to_vec(&balance).map_err(LedgerError::storage)?;
        self.db.put_cf(cf, key.value().to_be_bytes(), value)?;
        Ok(balance)
    }
}

#[async_trait]
impl HistoryLedger for RocksDbStore {
    async fn append(
        &self,
        key: EntityKey,
        delta: i64,
        kind: TransactionKind,
        at: DateTime<Utc>,
    ) -> Result<TransactionRecord> {
        simulate_latency(self.latency).await;
        let cf = self.cf(CF_HISTORY)?;
        let record = TransactionRecord {
            id: self.cursor.fetch_add(1, Ordering::SeqCst),
            key,
            delta,
            kind,
            timestamp: at,
        };
        let value = serde_json::to_vec(&record).map_err(LedgerError::storage)?;
        self.db.put_cf(cf, history_key(key, record.id), value)?;
        Ok(record)
    }

    async fn read_all(&self, key: EntityKey) -> Result<Vec<TransactionRecord>> {
        simulate_latency(self.latency).await;
        let cf = self.cf(CF_HISTORY)?;
        let prefix = key.value().to_be_bytes();

        let mut records = Vec::new();
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&prefix, Direction::Forward));
        for item in iter {
            let (row_key, value) = item?;
            if !row_key.starts_with(&prefix) {
                break;
            }
            records.push(serde_json::from_slice(&value).map_err(LedgerError::storage)?);
        }
        Ok(records)
    }
}
