//! Explicit connection handle to the document store.
//!
//! A [`StoreConnection`] is opened once and cloned into every table or value
//! that needs it. Clones share one backend; closing any clone closes them all.
//! The backend is released when the last clone is dropped.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use docstore_core::Document;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::store::{DocumentStore, MemoryStore};

struct Inner {
    config: StoreConfig,
    backend: Arc<dyn DocumentStore>,
    closed: AtomicBool,
}

impl Drop for Inner {
    fn drop(&mut self) {
        debug!("store connection released");
    }
}

/// Cloneable handle over a [`DocumentStore`] backend, speaking [`Document`]s.
///
/// Every request is bounded by [`StoreConfig::request_timeout`] and issued at
/// most once.
#[derive(Clone)]
pub struct StoreConnection {
    inner: Arc<Inner>,
}

impl StoreConnection {
    /// Wraps an already-connected backend.
    #[must_use]
    pub fn open(config: StoreConfig, backend: Arc<dyn DocumentStore>) -> Self {
        info!(timeout_ms = config.timeout_ms(), "store connection opened");
        Self {
            inner: Arc::new(Inner {
                config,
                backend,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Opens a connection over a fresh [`MemoryStore`] with default settings.
    ///
    /// The store is returned alongside so callers can inspect or manipulate
    /// it out-of-band.
    #[must_use]
    pub fn memory() -> (Self, Arc<MemoryStore>) {
        Self::memory_with_config(StoreConfig::default())
    }

    #[must_use]
    pub fn memory_with_config(config: StoreConfig) -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let backend: Arc<dyn DocumentStore> = store.clone();
        (Self::open(config, backend), store)
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Fetch and decode the document stored under `key`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the key is absent or holds empty text,
    /// [`StoreError::Decode`] if the text is not a JSON object, and a
    /// transport error if the request itself fails.
    pub async fn get(&self, key: &str) -> StoreResult<Document> {
        debug!(key, "store get");
        let text = self.request(key, self.inner.backend.get(key)).await?;
        match text {
            Some(text) if !text.is_empty() => {
                Document::from_json_str(&text).map_err(|source| StoreError::Decode {
                    key: key.to_string(),
                    source,
                })
            }
            _ => Err(StoreError::NotFound {
                key: key.to_string(),
            }),
        }
    }

    /// Overwrite `key` with `document`. Returns the document as written.
    ///
    /// # Errors
    ///
    /// Fails only on transport errors, timeouts, or a closed connection.
    pub async fn set(&self, key: &str, document: &Document) -> StoreResult<Document> {
        debug!(key, "store set");
        let text = document.to_json_string();
        self.request(key, self.inner.backend.set(key, text)).await?;
        Ok(document.clone())
    }

    /// Remove `key`. Returns the number of keys removed; absence is `Ok(0)`.
    ///
    /// # Errors
    ///
    /// Fails only on transport errors, timeouts, or a closed connection.
    pub async fn delete(&self, key: &str) -> StoreResult<u64> {
        debug!(key, "store delete");
        self.request(key, self.inner.backend.delete(key)).await
    }

    /// Closes the connection for every clone and closes the backend.
    ///
    /// Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if closing it fails.
    pub async fn close(&self) -> StoreResult<()> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!("store connection closed");
        self.inner.backend.close().await
    }

    async fn request<T>(
        &self,
        key: &str,
        fut: impl Future<Output = StoreResult<T>>,
    ) -> StoreResult<T> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        let timeout = self.inner.config.request_timeout;
        match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                key: key.to_string(),
                timeout_ms: self.inner.config.timeout_ms(),
            }),
        }
    }
}

impl std::fmt::Debug for StoreConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConnection")
            .field("timeout_ms", &self.inner.config.timeout_ms())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
