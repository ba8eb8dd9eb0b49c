//! Connection configuration for the document store.

use std::time::Duration;

/// Settings applied by a [`StoreConnection`](crate::StoreConnection) to every
/// request it issues.
///
/// Reaching and authenticating against a particular store is the backend's
/// business; environment and command-line parsing live in the binary.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Upper bound on a single request. Expiry is reported, never retried.
    pub request_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_millis(5000),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub fn with_timeout(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }

    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}
