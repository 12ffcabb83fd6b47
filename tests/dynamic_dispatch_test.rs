use chrono::Utc;
use pointledger::domain::key::EntityKey;
use pointledger::domain::ports::{BalanceStoreRef, HistoryLedgerRef};
use pointledger::domain::record::TransactionKind;
use pointledger::infrastructure::in_memory::{InMemoryBalanceStore, InMemoryHistoryLedger};
use std::sync::Arc;

#[tokio::test]
async fn test_stores_as_trait_objects() {
    let balance_store: BalanceStoreRef = Arc::new(InMemoryBalanceStore::new());
    let history_ledger: HistoryLedgerRef = Arc::new(InMemoryHistoryLedger::new());
    let key = EntityKey::new(1).unwrap();

    // Verify Send + Sync by spawning tasks
    let bs_handle = tokio::spawn(async move {
        balance_store.upsert(key, 100).await.unwrap();
        balance_store.read(key).await.unwrap()
    });

    let hl_handle = tokio::spawn(async move {
        history_ledger
            .append(key, 100, TransactionKind::Charge, Utc::now())
            .await
            .unwrap();
        history_ledger.read_all(key).await.unwrap()
    });

    let balance = bs_handle.await.unwrap();
    assert_eq!(balance.amount, 100);

    let history = hl_handle.await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].key, key);
}
