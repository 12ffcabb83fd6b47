//! Domain layer: entity keys, validated amounts, balances, ledger records,
//! and the storage ports the application layer is written against.

pub mod balance;
pub mod key;
pub mod ports;
pub mod record;
