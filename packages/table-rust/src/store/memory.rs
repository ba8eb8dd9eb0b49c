//! In-memory [`DocumentStore`] implementation backed by [`DashMap`].
//!
//! Besides serving as an ephemeral backend, [`MemoryStore`] records every
//! request it receives and can be told to fail or stall specific keys, which
//! is how the table layer's partial-failure behavior is exercised.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::store::DocumentStore;

/// A request received by a [`MemoryStore`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Get(String),
    Set(String),
    Delete(String),
}

impl StoreOp {
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Get(key) | Self::Set(key) | Self::Delete(key) => key,
        }
    }
}

/// In-memory text store with request logging and fault injection.
///
/// Concurrent access goes through `DashMap`'s sharded locks; no external
/// locking is needed.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
    operations: Mutex<Vec<StoreOp>>,
    unreachable: AtomicBool,
    failing_writes: DashMap<String, ()>,
    delays: DashMap<String, Duration>,
}

impl MemoryStore {
    /// Creates a new, empty `MemoryStore`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every request fails with [`StoreError::Transport`].
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Makes `set` and `delete` on `key` fail with [`StoreError::Transport`].
    pub fn fail_writes_to(&self, key: &str) {
        self.failing_writes.insert(key.to_string(), ());
    }

    /// Stalls every request on `key` for `delay` before serving it.
    pub fn delay_key(&self, key: &str, delay: Duration) {
        self.delays.insert(key.to_string(), delay);
    }

    /// Removes all injected failures and delays.
    pub fn clear_failures(&self) {
        self.unreachable.store(false, Ordering::SeqCst);
        self.failing_writes.clear();
        self.delays.clear();
    }

    /// Snapshot of every request received so far, in arrival order.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp> {
        self.operations.lock().clone()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.operations.lock().len()
    }

    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    /// Reads stored text directly, bypassing logging and fault injection.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.clone())
    }

    /// Writes text directly, bypassing logging and fault injection.
    pub fn insert_raw(&self, key: &str, text: impl Into<String>) {
        self.entries.insert(key.to_string(), text.into());
    }

    /// Removes a key directly, bypassing logging and fault injection.
    pub fn remove_raw(&self, key: &str) -> Option<String> {
        self.entries.remove(key).map(|(_, v)| v)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    async fn admit(&self, op: StoreOp) -> StoreResult<()> {
        let delay = self.delays.get(op.key()).map(|d| *d);
        let is_write = !matches!(op, StoreOp::Get(_));
        let write_fails = is_write && self.failing_writes.contains_key(op.key());
        let key = op.key().to_string();
        self.operations.lock().push(op);

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("memory store is unreachable".to_string()));
        }
        if write_fails {
            return Err(StoreError::Transport(format!("write to `{key}` rejected")));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.admit(StoreOp::Get(key.to_string())).await?;
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: String) -> StoreResult<()> {
        self.admit(StoreOp::Set(key.to_string())).await?;
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<u64> {
        self.admit(StoreOp::Delete(key.to_string())).await?;
        Ok(u64::from(self.entries.remove(key).is_some()))
    }
}
