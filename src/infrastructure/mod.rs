//! Storage adapters implementing the domain ports.

pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;

use rand::Rng;
use std::time::Duration;

/// Sleeps for a random duration in `0..=max`, mimicking a slow remote store.
pub(crate) async fn simulate_latency(max: Option<Duration>) {
    if let Some(max) = max {
        let millis = max.as_millis() as u64;
        let delay = rand::thread_rng().gen_range(0..=millis);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}
