use super::balance::Amount;
use super::key::EntityKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Charge,
    Use,
}

impl TransactionKind {
    /// Signed ledger delta for a settled mutation of `amount`.
    pub fn delta(&self, amount: Amount) -> i64 {
        let value = amount.value() as i64;
        match self {
            TransactionKind::Charge => value,
            TransactionKind::Use => -value,
        }
    }
}

/// One immutable entry in an entity's history.
///
/// Records of a key are returned in insertion order, which is also the order
/// the corresponding mutations settled in.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TransactionRecord {
    pub id: u64,
    pub key: EntityKey,
    /// Positive for credits, negative for debits; never zero.
    pub delta: i64,
    pub kind: TransactionKind,
    pub timestamp: DateTime<Utc>,
}
