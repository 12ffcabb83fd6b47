use crate::domain::balance::Balance;
use crate::domain::key::EntityKey;
use crate::domain::record::{TransactionKind, TransactionRecord};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct BalanceRow {
    key: EntityKey,
    amount: u64,
}

#[derive(Serialize)]
struct HistoryRow {
    id: u64,
    key: EntityKey,
    delta: i64,
    kind: TransactionKind,
}

/// Writes balances and history as CSV sections.
pub struct BalanceWriter<W: Write> {
    out: W,
}

impl<W: Write> BalanceWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Writes a `key,amount` section in the order given.
    pub fn write_balances(&mut self, balances: &[Balance]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(&mut self.out);
        for balance in balances {
            writer.serialize(BalanceRow {
                key: balance.key,
                amount: balance.amount,
            })?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Writes an `id,key,delta,kind` section, preceded by a blank line.
    pub fn write_history(&mut self, records: &[TransactionRecord]) -> Result<()> {
        writeln!(self.out)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(&mut self.out);
        writer.write_record(["id", "key", "delta", "kind"])?;
        for record in records {
            writer.serialize(HistoryRow {
                id: record.id,
                key: record.key,
                delta: record.delta,
                kind: record.kind,
            })?;
        }
        writer.flush()?;
        Ok(())
    }
}
