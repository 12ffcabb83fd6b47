//! Outer adapters that feed commands into the orchestrator and render results.

pub mod csv;
