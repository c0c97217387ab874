//! Instance Pool: pre-warmed, reusable instances checked out and returned by key.
//!
//! # Invariants
//! - An instance sits in at most one idle collection at a time.
//! - Checkout and return never panic; misses degrade to `None` / `false`.
//! - Only instances checked out from a pool can be returned to it.

mod manifest;
mod pool;
mod poolable;

pub use manifest::{DEFAULT_POOL_SIZE, PoolDefinition, PoolError, PoolManifest};
pub use pool::{InstancePool, PoolStats, SpawnParams};
pub use poolable::{Poolable, Pooled};

pub fn crate_info() -> &'static str {
    "tickpool-pool v0.1.0"
}
