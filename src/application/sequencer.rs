use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

/// Completion signal of the most recently queued unit of work for a key.
struct Tail {
    seq: u64,
    done: oneshot::Receiver<()>,
}

struct Chains<K> {
    next_seq: u64,
    tails: HashMap<K, Tail>,
}

/// Serializes asynchronous units of work per key.
///
/// For a given key, units run one at a time in the order they were enqueued.
/// Units for different keys never wait on each other. Each unit waits only on
/// its predecessor's completion signal, never on its result, so one unit's
/// failure (or panic) is observed by its own caller alone and the next unit
/// still runs.
///
/// Work is spawned onto the tokio runtime, so `enqueue` must be called from
/// within one. Once enqueued, a unit runs to settlement even if the returned
/// handle is dropped.
pub struct KeyedSequencer<K> {
    chains: Arc<Mutex<Chains<K>>>,
}

impl<K> Default for KeyedSequencer<K>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> KeyedSequencer<K>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            chains: Arc::new(Mutex::new(Chains {
                next_seq: 0,
                tails: HashMap::new(),
            })),
        }
    }

    /// Queues `work` behind everything already enqueued for `key`.
    ///
    /// The queue position is taken before this returns, so call order is
    /// execution order. The handle resolves with the work's own output.
    pub fn enqueue<F, Fut, T>(&self, key: K, work: F) -> JoinHandle<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (signal, done) = oneshot::channel();
        let (seq, previous) = {
            let mut chains = lock(&self.chains);
            chains.next_seq += 1;
            let seq = chains.next_seq;
            let previous = chains.tails.insert(key.clone(), Tail { seq, done });
            (seq, previous.map(|tail| tail.done))
        };
        debug!(?key, seq, queued_behind = previous.is_some(), "unit of work enqueued");

        let settle = Settle {
            chains: Arc::clone(&self.chains),
            key,
            seq,
            signal: Some(signal),
        };
        tokio::spawn(async move {
            if let Some(previous) = previous {
                // Err means the predecessor's signal was dropped, which also marks it settled.
                let _ = previous.await;
            }
            debug!(key = ?settle.key, seq, "unit of work started");
            let output = work().await;
            drop(settle);
            output
        })
    }

    /// Number of keys with queued or running work.
    pub fn tracked_keys(&self) -> usize {
        lock(&self.chains).tails.len()
    }
}

fn lock<K>(chains: &Mutex<Chains<K>>) -> MutexGuard<'_, Chains<K>> {
    chains.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases a unit's queue position when dropped, whether the work returned,
/// panicked, or the task was aborted.
struct Settle<K: Eq + Hash> {
    chains: Arc<Mutex<Chains<K>>>,
    key: K,
    seq: u64,
    signal: Option<oneshot::Sender<()>>,
}

impl<K: Eq + Hash> Drop for Settle<K> {
    fn drop(&mut self) {
        {
            let mut chains = lock(&self.chains);
            if chains.tails.get(&self.key).map(|tail| tail.seq) == Some(self.seq) {
                chains.tails.remove(&self.key);
            }
        }
        if let Some(signal) = self.signal.take() {
            let _ = signal.send(());
        }
    }
}
