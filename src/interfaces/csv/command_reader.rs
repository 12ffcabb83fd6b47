use crate::domain::balance::RawAmount;
use crate::domain::record::TransactionKind;
use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Charge,
    Use,
}

impl From<Operation> for TransactionKind {
    fn from(op: Operation) -> Self {
        match op {
            Operation::Charge => TransactionKind::Charge,
            Operation::Use => TransactionKind::Use,
        }
    }
}

/// One `op, key, amount` row.
///
/// Key and amount stay as text so that malformed values are rejected by domain
/// validation with `InvalidKey`/`InvalidAmount` rather than as CSV errors.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Command {
    pub op: Operation,
    pub key: String,
    pub amount: String,
}

impl Command {
    pub fn key(&self) -> Result<i64> {
        self.key
            .trim()
            .parse()
            .map_err(|_| LedgerError::InvalidKey(format!("{:?} is not an integer", self.key)))
    }

    pub fn amount(&self) -> Result<RawAmount> {
        self.amount.parse()
    }
}

/// Reads commands from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over `Result<Command>`.
/// It handles whitespace trimming and flexible record lengths automatically.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes commands.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_valid_stream() {
        let data = "op, key, amount\ncharge, 1, 1000\nuse, 1, 250";
        let reader = CommandReader::new(data.as_bytes());
        let results: Vec<Result<Command>> = reader.commands().collect();

        assert_eq!(results.len(), 2);
        let first = results[0].as_ref().unwrap();
        assert_eq!(first.op, Operation::Charge);
        assert_eq!(first.key().unwrap(), 1);
        assert_eq!(first.amount().unwrap(), RawAmount::Integer(1000));
        assert_eq!(results[1].as_ref().unwrap().op, Operation::Use);
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "op, key, amount\nrefund, 1, 10";
        let reader = CommandReader::new(data.as_bytes());
        let results: Vec<Result<Command>> = reader.commands().collect();

        assert!(matches!(results[0], Err(LedgerError::CsvError(_))));
    }

    #[test]
    fn test_invalid_values_surface_as_domain_errors() {
        let data = "op, key, amount\ncharge, abc, ten";
        let command = CommandReader::new(data.as_bytes())
            .commands()
            .next()
            .unwrap()
            .unwrap();

        assert!(matches!(command.key(), Err(LedgerError::InvalidKey(_))));
        assert!(matches!(command.amount(), Err(LedgerError::InvalidAmount(_))));
    }
}
