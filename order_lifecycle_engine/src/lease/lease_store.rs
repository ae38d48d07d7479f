use std::{future::Future, time::Duration};

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum LeaseStoreError {
    #[error("Could not connect to the lease store: {0}")]
    ConnectionError(String),
    #[error("Lease store command failed: {0}")]
    CommandError(String),
}

/// The two primitives a shared key-value store must offer to back a [`crate::lease::LeaseLock`].
pub trait LeaseStore: Clone + Send + Sync {
    /// Atomically stores `value` under `key` with the given time-to-live, but only if the key is absent (or has
    /// expired). Returns `true` if the value was written.
    fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<bool, LeaseStoreError>> + Send;

    /// Removes `key`. Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), LeaseStoreError>> + Send;
}
