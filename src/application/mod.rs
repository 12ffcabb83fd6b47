//! Application layer containing the core business logic orchestration.
//!
//! [`orchestrator::TransactionOrchestrator`] is the entry point. It queues each
//! mutation on a [`sequencer::KeyedSequencer`] so that the non-atomic
//! read-then-write against the balance store behaves as a single transaction
//! per key.

pub mod balance;
pub mod history;
pub mod orchestrator;
pub mod sequencer;
