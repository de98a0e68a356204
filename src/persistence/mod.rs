//! Persistence layer: the transactional pool and membership store and the
//! event log.
//!
//! Every membership mutation of the engine goes through
//! [`MembershipStore`]. An implementation must apply each call atomically:
//! on error nothing is written, and the engine keeps the previous in-memory
//! membership. [`InMemoryMembershipStore`] backs tests and single-node
//! deployments; [`postgres::PostgresPersistence`] uses `sqlx` transactions.

pub mod event_log;
pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Membership, ObjectClass, ObjectId, Pool, PoolEvent, PoolId};
use crate::error::GatewayError;

pub use memory::InMemoryMembershipStore;
pub use models::StoredEvent;
pub use postgres::PostgresPersistence;

/// Durable pool definitions, the Pool↔Object relation and the pool event
/// log.
#[async_trait]
pub trait MembershipStore: fmt::Debug + Send + Sync {
    /// Atomically stores a pool's definition together with its full
    /// membership, creating or overwriting the pool.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] if the commit fails; the
    /// stored pool is then unchanged.
    async fn save_pool(&self, pool: &Pool) -> Result<(), GatewayError>;

    /// Loads every stored pool with its membership.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure or an
    /// undecodable definition.
    async fn load_pools(&self) -> Result<Vec<Pool>, GatewayError>;

    /// Atomically replaces the full membership of a pool.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] if the commit fails; the
    /// stored membership is then unchanged.
    async fn replace_membership(
        &self,
        pool_id: PoolId,
        membership: &Membership,
    ) -> Result<(), GatewayError>;

    /// Adds one object to a pool.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] if the commit fails.
    async fn add_member(
        &self,
        pool_id: PoolId,
        class: ObjectClass,
        object_id: ObjectId,
    ) -> Result<(), GatewayError>;

    /// Removes one object from a pool.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] if the commit fails.
    async fn remove_member(
        &self,
        pool_id: PoolId,
        class: ObjectClass,
        object_id: ObjectId,
    ) -> Result<(), GatewayError>;

    /// Deletes a pool's definition and every membership edge.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] if the commit fails.
    async fn delete_pool(&self, pool_id: PoolId) -> Result<(), GatewayError>;

    /// Loads the stored membership of a pool.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn load_membership(&self, pool_id: PoolId) -> Result<Membership, GatewayError>;

    /// Appends an event to the event log.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn record_event(&self, event: &PoolEvent) -> Result<(), GatewayError>;

    /// Loads logged events after `after`, optionally for one pool only.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn events_after(
        &self,
        after: DateTime<Utc>,
        pool_id: Option<PoolId>,
    ) -> Result<Vec<StoredEvent>, GatewayError>;

    /// Deletes logged events older than `days` days; returns how many.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] on storage failure.
    async fn prune_events(&self, days: u64) -> Result<u64, GatewayError>;
}

/// Returns the cutoff timestamp `days` days before now.
pub(crate) fn retention_cutoff(days: u64) -> DateTime<Utc> {
    Utc::now() - chrono::Duration::days(i64::try_from(days).unwrap_or(i64::MAX).min(36_500))
}
