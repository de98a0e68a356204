//! Concurrent pool storage with per-pool fine-grained locking.
//!
//! [`PoolRegistry`] stores all pools in a `HashMap` where each entry is
//! individually protected by a [`tokio::sync::RwLock`]. Every membership
//! mutation of a pool runs under that pool's write lock, so mutations of the
//! same pool are serialized while different pools proceed concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::PoolId;
use super::pool::{Pool, PoolSummary};
use crate::error::GatewayError;

/// Shared handle to one pool behind its own lock.
pub type PoolHandle = Arc<RwLock<Pool>>;

#[derive(Debug, Default)]
struct Inner {
    pools: HashMap<PoolId, PoolHandle>,
    names: HashMap<String, PoolId>,
}

/// Central store for all pools.
///
/// Uses a `RwLock` for the outer map and per-entry `Arc<RwLock<Pool>>` for
/// fine-grained per-pool locking.
///
/// # Concurrency
///
/// - Multiple tasks may read the same pool concurrently.
/// - Writes to different pools are concurrent.
/// - Writes to the same pool are serialized.
#[derive(Debug, Default)]
pub struct PoolRegistry {
    inner: RwLock<Inner>,
}

impl PoolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new pool into the registry.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DuplicateName`] if a pool with the same name
    /// exists, or [`GatewayError::InvalidRequest`] if the ID is taken.
    pub async fn insert(&self, pool: Pool) -> Result<PoolId, GatewayError> {
        let pool_id = pool.pool_id;
        let mut inner = self.inner.write().await;
        if inner.pools.contains_key(&pool_id) {
            return Err(GatewayError::InvalidRequest(format!(
                "pool {pool_id} already exists"
            )));
        }
        if inner.names.contains_key(pool.name()) {
            return Err(GatewayError::DuplicateName(pool.name().to_string()));
        }
        inner.names.insert(pool.name().to_string(), pool_id);
        inner.pools.insert(pool_id, Arc::new(RwLock::new(pool)));
        Ok(pool_id)
    }

    /// Returns the lock-protected handle of a pool.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PoolNotFound`] if no pool with the given ID
    /// exists.
    pub async fn get(&self, pool_id: PoolId) -> Result<PoolHandle, GatewayError> {
        let inner = self.inner.read().await;
        inner
            .pools
            .get(&pool_id)
            .cloned()
            .ok_or(GatewayError::PoolNotFound(pool_id))
    }

    /// Moves the unique-name index entry of `pool_id` from `old` to `new`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DuplicateName`] if `new` belongs to another
    /// pool.
    pub async fn rename(&self, pool_id: PoolId, old: &str, new: &str) -> Result<(), GatewayError> {
        if old == new {
            return Ok(());
        }
        let mut inner = self.inner.write().await;
        if inner.names.contains_key(new) {
            return Err(GatewayError::DuplicateName(new.to_string()));
        }
        inner.names.remove(old);
        inner.names.insert(new.to_string(), pool_id);
        Ok(())
    }

    /// Removes a pool from the registry and returns its final state.
    ///
    /// Waits for in-flight mutations of the pool to finish.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PoolNotFound`] if no pool with the given ID
    /// exists.
    pub async fn remove(&self, pool_id: PoolId) -> Result<Pool, GatewayError> {
        let handle = {
            let mut inner = self.inner.write().await;
            let handle = inner
                .pools
                .remove(&pool_id)
                .ok_or(GatewayError::PoolNotFound(pool_id))?;
            inner.names.retain(|_, id| *id != pool_id);
            handle
        };
        let pool = handle.read().await.clone();
        Ok(pool)
    }

    /// Returns the handles of every pool, ordered by pool ID.
    pub async fn handles(&self) -> Vec<(PoolId, PoolHandle)> {
        let inner = self.inner.read().await;
        let mut handles: Vec<_> = inner
            .pools
            .iter()
            .map(|(id, handle)| (*id, Arc::clone(handle)))
            .collect();
        handles.sort_by_key(|(id, _)| *id);
        handles
    }

    /// Returns summaries of all pools, optionally only static or dynamic ones.
    pub async fn list(&self, static_filter: Option<bool>) -> Vec<PoolSummary> {
        let handles = self.handles().await;
        let mut summaries = Vec::with_capacity(handles.len());
        for (_, handle) in handles {
            let pool = handle.read().await;
            if pool.removed {
                continue;
            }
            if let Some(flag) = static_filter
                && pool.is_static() != flag
            {
                continue;
            }
            summaries.push(PoolSummary::from(&*pool));
        }
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    /// Returns the number of pools in the registry.
    pub async fn len(&self) -> usize {
        self.inner.read().await.pools.len()
    }

    /// Returns `true` if the registry contains no pools.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.pools.is_empty()
    }
}
