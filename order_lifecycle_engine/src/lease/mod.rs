//! Lease-based mutual exclusion over order identifiers.
//!
//! A lease is a key in a shared key-value store, written with "set if absent" and a fixed time-to-live. While the key
//! exists, nobody else can acquire the lease. When the TTL elapses the key disappears on its own, whether or not the
//! holder has finished its work.
//!
//! Leases carry **no ownership token**. [`LeaseLock::release`] deletes the key unconditionally, so a holder whose lease
//! has already expired will happily delete a lease that now belongs to somebody else. This is a known gap: the
//! [`crate::OrderFlowError::LockExpired`] error kind is reserved for an ownership check that does not exist yet.
//!
//! The backing store is abstracted behind [`LeaseStore`]. [`MemoryLeaseStore`] keeps leases in-process and tracks
//! expiry against `tokio`'s clock, which makes it possible to drive expiry deterministically in tests with
//! `tokio::time::pause`. The Redis-backed store is available with the `redis` feature.
mod any_store;
mod lease_lock;
mod lease_store;
mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use any_store::AnyLeaseStore;
pub use lease_lock::{lease_key, AcquirePolicy, Lease, LeaseError, LeaseLock, LEASE_KEY_PREFIX};
pub use lease_store::{LeaseStore, LeaseStoreError};
pub use memory::MemoryLeaseStore;
#[cfg(feature = "redis")]
pub use redis::RedisLeaseStore;
