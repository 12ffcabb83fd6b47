use super::balance::BalanceMutationService;
use super::history::LedgerRecordingService;
use super::sequencer::KeyedSequencer;
use crate::domain::balance::{Balance, RawAmount};
use crate::domain::key::EntityKey;
use crate::domain::ports::{BalanceStoreRef, HistoryLedgerRef};
use crate::domain::record::{TransactionKind, TransactionRecord};
use crate::error::{LedgerError, Result};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Public entry point for balance mutations and reads.
///
/// Every charge or use is one unit of work on the [`KeyedSequencer`]: the
/// balance read-modify-write followed by the history append. Mutations of the
/// same key therefore never interleave, while different keys proceed in
/// parallel. Reads bypass the sequencer and see whatever is stored at call time.
///
/// A failed history append after a successful balance write is returned as a
/// `StorageFailure`; the balance write is not rolled back.
pub struct TransactionOrchestrator {
    sequencer: KeyedSequencer<EntityKey>,
    balances: Arc<BalanceMutationService>,
    recorder: Arc<LedgerRecordingService>,
}

impl TransactionOrchestrator {
    /// Creates a new `TransactionOrchestrator` instance.
    ///
    /// # Arguments
    ///
    /// * `store` - The store holding current balances.
    /// * `ledger` - The append-only transaction history.
    pub fn new(store: BalanceStoreRef, ledger: HistoryLedgerRef) -> Self {
        Self {
            sequencer: KeyedSequencer::new(),
            balances: Arc::new(BalanceMutationService::new(store)),
            recorder: Arc::new(LedgerRecordingService::new(ledger)),
        }
    }

    /// Credits `amount` to `key`.
    ///
    /// The key is validated and the operation queued before this returns, so
    /// the call order of `charge`/`use_balance` fixes the execution order per
    /// key even if the returned futures are awaited later or not at all.
    pub fn charge(&self, key: i64, amount: impl Into<RawAmount>) -> PendingMutation {
        self.submit(key, TransactionKind::Charge, amount.into())
    }

    /// Debits `amount` from `key`. Queues like [`charge`](Self::charge).
    pub fn use_balance(&self, key: i64, amount: impl Into<RawAmount>) -> PendingMutation {
        self.submit(key, TransactionKind::Use, amount.into())
    }

    pub async fn get_balance(&self, key: i64) -> Result<Balance> {
        let key = EntityKey::new(key)?;
        self.balances.balance(key).await
    }

    pub async fn get_history(&self, key: i64) -> Result<Vec<TransactionRecord>> {
        let key = EntityKey::new(key)?;
        self.recorder.history(key).await
    }

    fn submit(&self, key: i64, kind: TransactionKind, amount: RawAmount) -> PendingMutation {
        let key = match EntityKey::new(key) {
            Ok(key) => key,
            Err(e) => {
                return PendingMutation {
                    state: PendingState::Rejected(Some(e)),
                };
            }
        };
        let balances = Arc::clone(&self.balances);
        let recorder = Arc::clone(&self.recorder);
        let handle = self.sequencer.enqueue(key, move || async move {
            let outcome = settle(&balances, &recorder, key, kind, amount).await;
            match &outcome {
                Ok(balance) => {
                    info!(%key, ?kind, ?amount, balance = balance.amount, "mutation settled")
                }
                Err(e) => warn!(%key, ?kind, ?amount, error = %e, "mutation failed"),
            }
            outcome
        });
        PendingMutation {
            state: PendingState::Queued(handle),
        }
    }
}

/// A charge or use that has been queued, or rejected before queueing.
///
/// Resolves with the balance after the mutation, or the error it failed with.
pub struct PendingMutation {
    state: PendingState,
}

enum PendingState {
    Queued(JoinHandle<Result<Balance>>),
    Rejected(Option<LedgerError>),
}

impl Future for PendingMutation {
    type Output = Result<Balance>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            PendingState::Queued(handle) => Pin::new(handle).poll(cx).map(|joined| match joined {
                Ok(outcome) => outcome,
                Err(e) => Err(LedgerError::WorkerFailure(e.to_string())),
            }),
            PendingState::Rejected(error) => Poll::Ready(Err(error.take().unwrap_or_else(|| {
                LedgerError::WorkerFailure("mutation polled after completion".to_string())
            }))),
        }
    }
}

async fn settle(
    balances: &BalanceMutationService,
    recorder: &LedgerRecordingService,
    key: EntityKey,
    kind: TransactionKind,
    amount: RawAmount,
) -> Result<Balance> {
    let mutation = balances.apply(key, kind, amount).await?;
    if let Err(e) = recorder.record(&mutation).await {
        warn!(
            %key,
            balance = mutation.balance.amount,
            error = %e,
            "balance committed but history append failed"
        );
        return Err(e);
    }
    Ok(mutation.balance)
}
