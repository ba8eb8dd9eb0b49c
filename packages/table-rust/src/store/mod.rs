//! Raw key-value backend for the document store.
//!
//! [`DocumentStore`] is the text-level primitive a [`StoreConnection`](crate::StoreConnection)
//! sits on: string keys mapped to string values, in the manner of a Redis
//! `GET`/`SET`/`DEL` command set. Decoding text into documents happens one
//! layer up, in the connection.

use async_trait::async_trait;

use crate::error::StoreResult;

mod memory;

pub use memory::{MemoryStore, StoreOp};

/// Pluggable text key-value backend.
///
/// Each call issues exactly one request to the backend; implementations must
/// not retry. Used as `Arc<dyn DocumentStore>`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load the text stored under `key`, or `None` if the key does not exist.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, overwriting any previous value.
    async fn set(&self, key: &str, value: String) -> StoreResult<()>;

    /// Remove `key`. Returns the number of keys removed (0 if it was absent).
    async fn delete(&self, key: &str) -> StoreResult<u64>;

    /// Release resources and close connections.
    async fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}
