use super::balance::Mutation;
use crate::domain::key::EntityKey;
use crate::domain::ports::HistoryLedgerRef;
use crate::domain::record::TransactionRecord;
use crate::error::Result;
use chrono::Utc;

/// Appends one history record per settled mutation.
pub struct LedgerRecordingService {
    ledger: HistoryLedgerRef,
}

impl LedgerRecordingService {
    pub fn new(ledger: HistoryLedgerRef) -> Self {
        Self { ledger }
    }

    /// Records `mutation`, timestamped now. Only call after it was persisted.
    pub async fn record(&self, mutation: &Mutation) -> Result<TransactionRecord> {
        self.ledger
            .append(mutation.balance.key, mutation.delta(), mutation.kind, Utc::now())
            .await
    }

    pub async fn history(&self, key: EntityKey) -> Result<Vec<TransactionRecord>> {
        self.ledger.read_all(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::balance::{Amount, Balance};
    use crate::domain::record::TransactionKind;
    use crate::infrastructure::in_memory::InMemoryHistoryLedger;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_record_uses_signed_delta() {
        let service = LedgerRecordingService::new(Arc::new(InMemoryHistoryLedger::new()));
        let key = EntityKey::new(3).unwrap();

        let charge = Mutation {
            balance: Balance::zero(key),
            kind: TransactionKind::Charge,
            amount: Amount::validate(1000).unwrap(),
        };
        let spend = Mutation {
            kind: TransactionKind::Use,
            amount: Amount::validate(250).unwrap(),
            ..charge.clone()
        };
        service.record(&charge).await.unwrap();
        service.record(&spend).await.unwrap();

        let history = service.history(key).await.unwrap();
        let deltas: Vec<i64> = history.iter().map(|r| r.delta).collect();
        assert_eq!(deltas, vec![1000, -250]);
        assert!(history[0].id < history[1].id);
        assert!(service.history(EntityKey::new(4).unwrap()).await.unwrap().is_empty());
    }
}
