use std::time::Duration;

use log::*;
use thiserror::Error;
use tokio::time::Instant;

use super::{LeaseStore, LeaseStoreError};
use crate::db_types::OrderId;

pub const LEASE_KEY_PREFIX: &str = "order_lock:";
/// The marker written under every lease key. Leases carry no owner.
const LEASE_VALUE: &str = "1";

pub const DEFAULT_LEASE_TTL: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 50;
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// The lease key for the given order.
pub fn lease_key(order_id: &OrderId) -> String {
    format!("{LEASE_KEY_PREFIX}{}", order_id.as_str())
}

#[derive(Debug, Error)]
pub enum LeaseError {
    #[error("Could not acquire lease {key} after {attempts} attempts")]
    NotAcquired { key: String, attempts: u32 },
    #[error("Lease store error. {0}")]
    Store(#[from] LeaseStoreError),
}

/// How leases are acquired: a fixed TTL, and a bounded busy-poll with a fixed sleep between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquirePolicy {
    pub ttl: Duration,
    pub max_attempts: u32,
    pub retry_interval: Duration,
}

impl Default for AcquirePolicy {
    fn default() -> Self {
        Self { ttl: DEFAULT_LEASE_TTL, max_attempts: DEFAULT_MAX_ATTEMPTS, retry_interval: DEFAULT_RETRY_INTERVAL }
    }
}

impl AcquirePolicy {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// The longest time `acquire` can spend sleeping before giving up.
    pub fn worst_case_wait(&self) -> Duration {
        self.retry_interval * self.max_attempts.saturating_sub(1)
    }
}

/// A successfully acquired lease. Hand it back to [`LeaseLock::release`] when the protected work is done.
#[derive(Debug)]
pub struct Lease {
    key: String,
    ttl: Duration,
    acquired_at: Instant,
}

impl Lease {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }

    /// True once the lease has been held for longer than its TTL. At that point the backing key has expired and the
    /// lease may already have been granted to somebody else.
    pub fn outlived_ttl(&self) -> bool {
        self.held_for() >= self.ttl
    }
}

#[derive(Clone)]
pub struct LeaseLock<L> {
    store: L,
    policy: AcquirePolicy,
}

impl<L> LeaseLock<L>
where L: LeaseStore
{
    pub fn new(store: L, policy: AcquirePolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &L {
        &self.store
    }

    pub fn policy(&self) -> &AcquirePolicy {
        &self.policy
    }

    /// Makes a single attempt to acquire the lease under `key`.
    pub async fn try_acquire(&self, key: &str) -> Result<Option<Lease>, LeaseError> {
        let acquired = self.store.set_if_absent(key, LEASE_VALUE, self.policy.ttl).await?;
        Ok(acquired.then(|| Lease { key: key.to_string(), ttl: self.policy.ttl, acquired_at: Instant::now() }))
    }

    /// Polls for the lease under `key` until it is acquired or the attempt budget is spent. There is no sleep after
    /// the final attempt. Store errors end the loop immediately.
    pub async fn acquire(&self, key: &str) -> Result<Lease, LeaseError> {
        let attempts = self.policy.max_attempts.max(1);
        for attempt in 1..=attempts {
            if let Some(lease) = self.try_acquire(key).await? {
                debug!("🔒️ Lease {key} acquired on attempt {attempt} (TTL={:?})", self.policy.ttl);
                return Ok(lease);
            }
            if attempt < attempts {
                trace!("🔒️ Lease {key} is held elsewhere. Retrying in {:?}", self.policy.retry_interval);
                tokio::time::sleep(self.policy.retry_interval).await;
            }
        }
        warn!("🔒️ Gave up on lease {key} after {attempts} attempts");
        Err(LeaseError::NotAcquired { key: key.to_string(), attempts })
    }

    /// Deletes the lease key unconditionally. If the lease has already expired and been re-acquired by another caller,
    /// that caller's lease is deleted too.
    pub async fn release(&self, lease: Lease) -> Result<(), LeaseError> {
        if lease.outlived_ttl() {
            warn!(
                "🔒️ Lease {} was held for {:?}, longer than its TTL of {:?}. It may have been acquired by another \
                 caller in the meantime.",
                lease.key,
                lease.held_for(),
                lease.ttl
            );
        }
        self.store.delete(&lease.key).await?;
        debug!("🔒️ Lease {} released", lease.key);
        Ok(())
    }
}
