use clap::Parser;
use miette::{IntoDiagnostic, Result};
use pointledger::application::orchestrator::{PendingMutation, TransactionOrchestrator};
use pointledger::domain::key::EntityKey;
use pointledger::domain::ports::{BalanceStoreRef, HistoryLedgerRef};
use pointledger::domain::record::TransactionKind;
use pointledger::error::Result as LedgerResult;
use pointledger::infrastructure::in_memory::{InMemoryBalanceStore, InMemoryHistoryLedger};
use pointledger::interfaces::csv::balance_writer::BalanceWriter;
use pointledger::interfaces::csv::command_reader::{Command, CommandReader};
use pointledger::logging;
use std::collections::BTreeSet;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input commands CSV file (`op, key, amount`)
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Simulated store latency: each store call sleeps a random 0..=N ms
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,

    /// Also print the full history of every key
    #[arg(long)]
    history: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let latency = (cli.latency_ms > 0).then(|| Duration::from_millis(cli.latency_ms));
    let (store, ledger) = open_stores(cli.db_path, latency)?;
    let orchestrator = TransactionOrchestrator::new(store, ledger);

    // Queue every command before awaiting any, so per-key order comes from the sequencer.
    let file = File::open(cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    let mut pending: Vec<(usize, PendingMutation)> = Vec::new();
    let mut keys = BTreeSet::new();
    for (row, command) in reader.commands().enumerate() {
        let submitted = command.and_then(|command| {
            let key = command_key(&command)?;
            // A valid key is listed even when the rest of its row is rejected.
            keys.insert(key);
            submit(&orchestrator, &command, key)
        });
        match submitted {
            Ok(mutation) => pending.push((row, mutation)),
            Err(e) => error!(row, error = %e, "Error reading command"),
        }
    }

    for (row, mutation) in pending {
        if let Err(e) = mutation.await {
            warn!(row, error = %e, "Error processing command");
        }
    }

    let mut balances = Vec::with_capacity(keys.len());
    let mut records = Vec::new();
    for key in keys {
        balances.push(orchestrator.get_balance(key).await.into_diagnostic()?);
        if cli.history {
            records.extend(orchestrator.get_history(key).await.into_diagnostic()?);
        }
    }

    let stdout = io::stdout();
    let mut writer = BalanceWriter::new(stdout.lock());
    writer.write_balances(&balances).into_diagnostic()?;
    if cli.history {
        writer.write_history(&records).into_diagnostic()?;
    }

    Ok(())
}

fn command_key(command: &Command) -> LedgerResult<i64> {
    let key = command.key()?;
    EntityKey::new(key)?;
    Ok(key)
}

fn submit(
    orchestrator: &TransactionOrchestrator,
    command: &Command,
    key: i64,
) -> LedgerResult<PendingMutation> {
    let amount = command.amount()?;
    let mutation = match TransactionKind::from(command.op) {
        TransactionKind::Charge => orchestrator.charge(key, amount),
        TransactionKind::Use => orchestrator.use_balance(key, amount),
    };
    Ok(mutation)
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(
    db_path: Option<PathBuf>,
    latency: Option<Duration>,
) -> Result<(BalanceStoreRef, HistoryLedgerRef)> {
    use pointledger::infrastructure::rocksdb::RocksDbStore;

    if let Some(db_path) = db_path {
        let mut store = RocksDbStore::open(db_path).into_diagnostic()?;
        if let Some(latency) = latency {
            store = store.with_latency(latency);
        }
        let store = Arc::new(store);
        let balances: BalanceStoreRef = store.clone();
        let ledger: HistoryLedgerRef = store;
        return Ok((balances, ledger));
    }
    Ok(in_memory_stores(latency))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(
    db_path: Option<PathBuf>,
    latency: Option<Duration>,
) -> Result<(BalanceStoreRef, HistoryLedgerRef)> {
    if db_path.is_some() {
        warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(in_memory_stores(latency))
}

fn in_memory_stores(latency: Option<Duration>) -> (BalanceStoreRef, HistoryLedgerRef) {
    let (balances, ledger) = match latency {
        Some(max) => (
            InMemoryBalanceStore::with_latency(max),
            InMemoryHistoryLedger::with_latency(max),
        ),
        None => (InMemoryBalanceStore::new(), InMemoryHistoryLedger::new()),
    };
    let balances: BalanceStoreRef = Arc::new(balances);
    let ledger: HistoryLedgerRef = Arc::new(ledger);
    (balances, ledger)
}
