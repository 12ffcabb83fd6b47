use crate::domain::balance::{Amount, Balance, RawAmount};
use crate::domain::key::EntityKey;
use crate::domain::ports::BalanceStoreRef;
use crate::domain::record::TransactionKind;
use crate::error::Result;

/// A balance change that has been persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub balance: Balance,
    pub kind: TransactionKind,
    pub amount: Amount,
}

impl Mutation {
    pub fn delta(&self) -> i64 {
        self.kind.delta(self.amount)
    }
}

/// Applies charges and uses to a key's balance as read-modify-write steps.
///
/// The store offers no compare-and-swap, so callers must serialize calls for
/// the same key; the orchestrator does so through the
/// [`KeyedSequencer`](super::sequencer::KeyedSequencer).
pub struct BalanceMutationService {
    store: BalanceStoreRef,
}

impl BalanceMutationService {
    pub fn new(store: BalanceStoreRef) -> Self {
        Self { store }
    }

    pub async fn balance(&self, key: EntityKey) -> Result<Balance> {
        self.store.read(key).await
    }

    /// Adds `amount` to the balance of `key`.
    pub async fn charge(&self, key: EntityKey, amount: impl Into<RawAmount>) -> Result<Mutation> {
        let amount = Amount::validate(amount)?;
        let current = self.store.read(key).await?;
        let updated = current.credited(amount)?;
        let balance = self.store.upsert(key, updated).await?;
        Ok(Mutation {
            balance,
            kind: TransactionKind::Charge,
            amount,
        })
    }

    /// Subtracts `amount` from the balance of `key`, failing with
    /// `InsufficientBalance` rather than going below zero.
    pub async fn use_balance(
        &self,
        key: EntityKey,
        amount: impl Into<RawAmount>,
    ) -> Result<Mutation> {
        let amount = Amount::validate(amount)?;
        let current = self.store.read(key).await?;
        let updated = current.debited(amount)?;
        let balance = self.store.upsert(key, updated).await?;
        Ok(Mutation {
            balance,
            kind: TransactionKind::Use,
            amount,
        })
    }

    pub async fn apply(
        &self,
        key: EntityKey,
        kind: TransactionKind,
        amount: RawAmount,
    ) -> Result<Mutation> {
        match kind {
            TransactionKind::Charge => self.charge(key, amount).await,
            TransactionKind::Use => self.use_balance(key, amount).await,
        }
    }
}
