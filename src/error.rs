use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid entity key: {0}")]
    InvalidKey(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u64, available: u64 },
    #[error("balance overflow: {current} + {amount} exceeds the maximum balance")]
    BalanceOverflow { current: u64, amount: u64 },
    #[error("storage failure: {0}")]
    StorageFailure(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("unit of work did not settle: {0}")]
    WorkerFailure(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl LedgerError {
    /// Wraps any backend error as a `StorageFailure`.
    pub fn storage<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::StorageFailure(err.into())
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for LedgerError {
    fn from(err: rocksdb::Error) -> Self {
        Self::StorageFailure(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
