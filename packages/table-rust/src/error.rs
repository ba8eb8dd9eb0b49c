use docstore_core::DocumentError;

/// Errors returned by every store-facing operation.
///
/// Not-found, decode failures and transport failures are kept apart so a
/// caller can tell an absent key from a corrupt document or an unreachable
/// store. Nothing is retried: each failure is reported once.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("no document stored under key `{key}`")]
    NotFound { key: String },
    #[error("document under key `{key}` could not be decoded: {source}")]
    Decode {
        key: String,
        #[source]
        source: DocumentError,
    },
    #[error("store request failed: {0}")]
    Transport(String),
    #[error("store request for key `{key}` timed out after {timeout_ms}ms")]
    Timeout { key: String, timeout_ms: u64 },
    #[error("store connection is closed")]
    Closed,
}

impl StoreError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// True for failures of the store itself rather than of the data in it.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout { .. } | Self::Closed)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
