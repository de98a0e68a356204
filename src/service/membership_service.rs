//! Membership engine: full and incremental recomputation of pool membership.
//!
//! Every mutation of a pool follows the same protocol: acquire the pool's
//! write lock → evaluate → commit through the [`MembershipStore`] → apply to
//! the in-memory pool → release → publish events. A failed commit leaves the
//! in-memory pool untouched, and a pool marked removed is never written.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::{StreamExt, stream};
use serde::Serialize;
use utoipa::ToSchema;

use super::UpdateTrigger;
use crate::domain::{
    CompiledRules, EventBus, Membership, MembershipChangeReason, NetworkObject, ObjectClass,
    ObjectId, ObjectRegistry, Pool, PoolDefinition, PoolEvent, PoolHandle, PoolId, PoolRegistry,
    PoolSummary, PropertyCatalog, PropertyLookup, RuleSet,
};
use crate::error::{GatewayError, PoolFailure};
use crate::persistence::MembershipStore;

/// Tuning for [`MembershipService::recompute_all`].
#[derive(Debug, Clone, Copy)]
pub struct RecomputeSettings {
    /// Maximum number of pools recomputed at the same time.
    pub concurrency: usize,
    /// Time limit for one pool's recomputation.
    pub timeout: Duration,
}

impl Default for RecomputeSettings {
    fn default() -> Self {
        Self {
            concurrency: 4,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Per-pool outcome of [`MembershipService::recompute_all`].
pub type RecomputeOutcomes = BTreeMap<PoolId, Result<(), GatewayError>>;

/// Administrative view of a full recompute: which pools succeeded and which
/// failed with what.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct RecomputeReport {
    /// Pools whose membership was recomputed (or left alone, if static).
    pub succeeded: Vec<PoolId>,
    /// Pools that kept their previous membership.
    pub failed: Vec<PoolFailure>,
}

impl From<&RecomputeOutcomes> for RecomputeReport {
    fn from(outcomes: &RecomputeOutcomes) -> Self {
        let mut report = Self::default();
        for (pool_id, outcome) in outcomes {
            match outcome {
                Ok(()) => report.succeeded.push(*pool_id),
                Err(e) => report.failed.push(PoolFailure {
                    pool_id: *pool_id,
                    message: e.to_string(),
                }),
            }
        }
        report
    }
}

/// Orchestration layer for pools and their membership.
///
/// Owns references to the [`PoolRegistry`] for pool state, the
/// [`ObjectRegistry`] for inventory snapshots, the [`MembershipStore`] for
/// commits and the [`EventBus`] for notifications.
#[derive(Debug, Clone)]
pub struct MembershipService {
    pools: Arc<PoolRegistry>,
    objects: Arc<dyn ObjectRegistry>,
    store: Arc<dyn MembershipStore>,
    catalog: Arc<PropertyCatalog>,
    event_bus: EventBus,
    settings: RecomputeSettings,
}

impl MembershipService {
    /// Creates a new `MembershipService`.
    #[must_use]
    pub fn new(
        pools: Arc<PoolRegistry>,
        objects: Arc<dyn ObjectRegistry>,
        store: Arc<dyn MembershipStore>,
        catalog: Arc<PropertyCatalog>,
        event_bus: EventBus,
        settings: RecomputeSettings,
    ) -> Self {
        Self {
            pools,
            objects,
            store,
            catalog,
            event_bus,
            settings,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the inner [`PoolRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<PoolRegistry> {
        &self.pools
    }

    /// Returns the matchable property catalog.
    #[must_use]
    pub fn catalog(&self) -> &PropertyCatalog {
        &self.catalog
    }

    /// Returns the membership store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn MembershipStore> {
        &self.store
    }

    /// Loads the pools kept by the store into the registry and returns how
    /// many were restored. Called once at startup, before serving requests.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the store cannot be read or two stored
    /// pools share a name.
    pub async fn restore(&self) -> Result<usize, GatewayError> {
        let pools = self.store.load_pools().await?;
        let count = pools.len();
        for pool in pools {
            let pool_id = pool.pool_id;
            self.pools.insert(pool).await?;
            tracing::debug!(%pool_id, "pool restored");
        }
        tracing::info!(pools = count, "restored pools from store");
        Ok(count)
    }

    /// Creates a pool and, unless it is static, populates its membership.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the definition is invalid, the name is
    /// taken, or the initial commit fails (the pool is then discarded).
    pub async fn create_pool(&self, definition: PoolDefinition) -> Result<PoolId, GatewayError> {
        self.validate_definition(&definition)?;
        let pool_id = self.pools.insert(Pool::new(definition)).await?;
        let handle = self.pools.get(pool_id).await?;
        let mut pool = handle.write().await;

        let definition = pool.definition.clone();
        if let Err(e) = self.commit_definition(&mut pool, definition).await {
            pool.removed = true;
            drop(pool);
            let _ = self.pools.remove(pool_id).await;
            tracing::warn!(%pool_id, error = %e, "initial commit failed; pool discarded");
            return Err(e);
        }
        let (name, is_static) = (pool.name().to_string(), pool.is_static());
        let membership = pool.membership.clone();
        drop(pool);

        let _ = self.event_bus.publish(PoolEvent::PoolCreated {
            pool_id,
            name: name.clone(),
            is_static,
            timestamp: Utc::now(),
        });
        if !is_static {
            self.publish_recomputed(pool_id, &membership);
        }
        tracing::info!(%pool_id, name, is_static, "pool created");
        Ok(pool_id)
    }

    /// Replaces a pool's definition and recomputes it unless it is static.
    ///
    /// The new definition and its membership are committed together. On
    /// error the pool keeps its previous definition, name and membership.
    /// Turning a dynamic pool static keeps its current membership as the
    /// starting point for manual curation.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the pool is missing, the definition is
    /// invalid, the new name is taken, or the commit fails.
    pub async fn update_pool(
        &self,
        pool_id: PoolId,
        definition: PoolDefinition,
    ) -> Result<(), GatewayError> {
        self.validate_definition(&definition)?;
        let handle = self.pools.get(pool_id).await?;
        let mut pool = handle.write().await;
        if pool.removed {
            return Err(GatewayError::PoolNotFound(pool_id));
        }

        let previous_name = pool.name().to_string();
        let new_name = definition.name.clone();
        self.pools
            .rename(pool_id, &previous_name, &new_name)
            .await?;
        if let Err(e) = self.commit_definition(&mut pool, definition).await {
            if let Err(undo) = self.pools.rename(pool_id, &new_name, &previous_name).await {
                tracing::warn!(%pool_id, error = %undo, "could not restore pool name");
            }
            drop(pool);
            self.publish_failure(pool_id, &e);
            return Err(e);
        }
        let is_static = pool.is_static();
        let membership = pool.membership.clone();
        drop(pool);

        let _ = self.event_bus.publish(PoolEvent::PoolUpdated {
            pool_id,
            name: new_name,
            timestamp: Utc::now(),
        });
        if !is_static {
            self.publish_recomputed(pool_id, &membership);
        }
        tracing::info!(%pool_id, "pool updated");
        Ok(())
    }

    /// Removes a pool together with its stored definition and membership.
    ///
    /// The pool is marked removed under its write lock before it leaves the
    /// registry, so a mutation that fetched the handle earlier finds the
    /// mark and writes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PoolNotFound`] if the pool does not exist, or
    /// a persistence error (the pool then stays in place).
    pub async fn remove_pool(&self, pool_id: PoolId) -> Result<(), GatewayError> {
        let handle = self.pools.get(pool_id).await?;
        let mut pool = handle.write().await;
        if pool.removed {
            return Err(GatewayError::PoolNotFound(pool_id));
        }
        if let Err(e) = self.store.delete_pool(pool_id).await {
            tracing::warn!(%pool_id, error = %e, "failed to delete pool; kept");
            return Err(e);
        }
        pool.removed = true;
        drop(pool);
        self.pools.remove(pool_id).await?;

        let _ = self.event_bus.publish(PoolEvent::PoolRemoved {
            pool_id,
            timestamp: Utc::now(),
        });
        tracing::info!(%pool_id, "pool removed");
        Ok(())
    }

    /// Returns a snapshot of a pool.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PoolNotFound`] if the pool does not exist.
    pub async fn get_pool(&self, pool_id: PoolId) -> Result<Pool, GatewayError> {
        let handle = self.pools.get(pool_id).await?;
        let pool = handle.read().await;
        if pool.removed {
            return Err(GatewayError::PoolNotFound(pool_id));
        }
        Ok(pool.clone())
    }

    /// Returns summaries of all pools, optionally only static or dynamic
    /// ones.
    pub async fn list_pools(&self, static_filter: Option<bool>) -> Vec<PoolSummary> {
        self.pools.list(static_filter).await
    }

    /// Returns the current membership of a pool.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PoolNotFound`] if the pool does not exist.
    pub async fn get_membership(&self, pool_id: PoolId) -> Result<Membership, GatewayError> {
        Ok(self.get_pool(pool_id).await?.membership)
    }

    /// Returns `"<N> devices - <M> links"` for a pool.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PoolNotFound`] if the pool does not exist.
    pub async fn summary(&self, pool_id: PoolId) -> Result<String, GatewayError> {
        Ok(self.get_membership(pool_id).await?.summary())
    }

    /// Re-derives a dynamic pool's membership from all current objects.
    /// Static pools are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidFilterPattern`] or
    /// [`GatewayError::UnknownProperty`] for broken rules and
    /// [`GatewayError::PersistenceError`] when the commit fails. The
    /// previous membership is kept in every error case.
    pub async fn recompute_pool(&self, pool_id: PoolId) -> Result<(), GatewayError> {
        let handle = self.pools.get(pool_id).await?;
        self.recompute_handle(pool_id, handle).await
    }

    /// Recomputes every pool. Pools run concurrently, each under its own
    /// lock and time limit; one pool's failure never affects another.
    pub async fn recompute_all(&self) -> RecomputeOutcomes {
        let handles = self.pools.handles().await;
        let timeout = self.settings.timeout;
        let outcomes: RecomputeOutcomes = stream::iter(handles)
            .map(|(pool_id, handle)| async move {
                let outcome =
                    match tokio::time::timeout(timeout, self.recompute_handle(pool_id, handle))
                        .await
                    {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            let e = GatewayError::RecomputeTimeout {
                                pool_id,
                                timeout_secs: timeout.as_secs(),
                            };
                            self.publish_failure(pool_id, &e);
                            Err(e)
                        }
                    };
                (pool_id, outcome)
            })
            .buffer_unordered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let failed = outcomes.values().filter(|o| o.is_err()).count();
        tracing::info!(pools = outcomes.len(), failed, "recomputed all pools");
        outcomes
    }

    async fn recompute_handle(&self, pool_id: PoolId, handle: PoolHandle) -> Result<(), GatewayError> {
        let mut pool = handle.write().await;
        if pool.removed {
            return Err(GatewayError::PoolNotFound(pool_id));
        }
        if pool.is_static() {
            return Ok(());
        }

        let membership = match self.derive_membership(&pool.definition.rules).await {
            Ok(membership) => membership,
            Err(e) => {
                drop(pool);
                self.publish_failure(pool_id, &e);
                return Err(e);
            }
        };
        if let Err(e) = self.store.replace_membership(pool_id, &membership).await {
            drop(pool);
            self.publish_failure(pool_id, &e);
            return Err(e);
        }

        pool.replace_membership(membership.clone());
        pool.last_recomputed_at = Some(Utc::now());
        drop(pool);

        self.publish_recomputed(pool_id, &membership);
        tracing::debug!(%pool_id, summary = membership.summary(), "pool recomputed");
        Ok(())
    }

    /// Stores `definition` together with the membership it yields and then
    /// applies both to `pool`. Static pools keep their current members.
    /// `pool` is left untouched on error.
    async fn commit_definition(
        &self,
        pool: &mut Pool,
        definition: PoolDefinition,
    ) -> Result<(), GatewayError> {
        let membership = if definition.is_static {
            pool.membership.clone()
        } else {
            self.derive_membership(&definition.rules).await?
        };
        let mut next = pool.clone();
        next.definition = definition;
        next.membership = membership;
        next.last_modified_at = Utc::now();
        if !next.is_static() {
            next.last_recomputed_at = Some(next.last_modified_at);
        }
        self.store.save_pool(&next).await?;
        *pool = next;
        Ok(())
    }

    /// Evaluates `rules` against a fresh inventory snapshot. Runs under the
    /// pool's write lock.
    async fn derive_membership(&self, rules: &RuleSet) -> Result<Membership, GatewayError> {
        let rules = CompiledRules::compile(rules, &self.catalog)?;
        let devices = self.objects.fetch_all(ObjectClass::Device).await?;
        let links = self.objects.fetch_all(ObjectClass::Link).await?;
        Ok(Membership {
            devices: matching_ids(&rules, &devices),
            links: matching_ids(&rules, &links),
        })
    }

    fn publish_recomputed(&self, pool_id: PoolId, membership: &Membership) {
        let _ = self.event_bus.publish(PoolEvent::MembershipRecomputed {
            pool_id,
            devices: membership.devices.len(),
            links: membership.links.len(),
            timestamp: Utc::now(),
        });
    }

    fn publish_failure(&self, pool_id: PoolId, error: &GatewayError) {
        tracing::warn!(%pool_id, error = %error, "pool recompute failed; membership kept");
        let _ = self.event_bus.publish(PoolEvent::RecomputeFailed {
            pool_id,
            error: error.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// Re-evaluates one object against every dynamic pool.
    ///
    /// Returns immediately when `suppress` is set.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ObjectNotFound`] for unknown objects and
    /// [`GatewayError::SyncFailed`] listing the pools that could not be
    /// updated; all other pools are still updated.
    pub async fn update_object_membership(
        &self,
        object_id: ObjectId,
        suppress: bool,
    ) -> Result<(), GatewayError> {
        if suppress {
            return Ok(());
        }
        let object = match self.objects.fetch(ObjectClass::Device, object_id).await {
            Ok(device) => device,
            Err(GatewayError::ObjectNotFound(_)) => {
                self.objects.fetch(ObjectClass::Link, object_id).await?
            }
            Err(e) => return Err(e),
        };
        self.sync_object(&object).await
    }

    /// Adds `object` to or removes it from each dynamic pool according to
    /// the pool rules. Other members are never re-evaluated.
    ///
    /// Only the identity of `object` is used: each pool matches the object
    /// as currently stored, read under that pool's lock, so a late or
    /// reordered notification cannot resurrect an older state. An object
    /// that no longer exists is removed.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SyncFailed`] listing the pools that could not
    /// be updated.
    pub async fn sync_object(&self, object: &NetworkObject) -> Result<(), GatewayError> {
        let mut events = Vec::new();
        let mut failures = Vec::new();
        for (pool_id, handle) in self.pools.handles().await {
            match self.sync_object_in_pool(pool_id, &handle, object).await {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(%pool_id, object_id = %object.id(), error = %e, "pool sync failed");
                    failures.push(PoolFailure {
                        pool_id,
                        message: e.to_string(),
                    });
                }
            }
        }
        tracing::debug!(object_id = %object.id(), changes = events.len(), "object synced");
        self.event_bus.publish_all(events);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::SyncFailed { failures })
        }
    }

    async fn sync_object_in_pool(
        &self,
        pool_id: PoolId,
        handle: &PoolHandle,
        object: &NetworkObject,
    ) -> Result<Option<PoolEvent>, GatewayError> {
        let mut pool = handle.write().await;
        if pool.removed || pool.is_static() {
            return Ok(None);
        }
        let rules = CompiledRules::compile(&pool.definition.rules, &self.catalog)?;
        let (class, object_id) = (object.class(), object.id());
        let current = match self.objects.fetch(class, object_id).await {
            Ok(current) => Some(current),
            Err(GatewayError::ObjectNotFound(_)) => None,
            Err(e) => return Err(e),
        };
        let matched = current.as_ref().is_some_and(|o| rules.matches(o));
        let present = pool.membership.contains(class, object_id);

        let event = match (matched, present) {
            (true, false) => {
                self.store.add_member(pool_id, class, object_id).await?;
                pool.membership.members_mut(class).insert(object_id);
                PoolEvent::MemberAdded {
                    pool_id,
                    class,
                    object_id,
                    timestamp: Utc::now(),
                }
            }
            (false, true) => {
                self.store.remove_member(pool_id, class, object_id).await?;
                pool.membership.members_mut(class).remove(&object_id);
                PoolEvent::MemberRemoved {
                    pool_id,
                    class,
                    object_id,
                    reason: if current.is_some() {
                        MembershipChangeReason::ObjectUpdated
                    } else {
                        MembershipChangeReason::ObjectDeleted
                    },
                    timestamp: Utc::now(),
                }
            }
            _ => return Ok(None),
        };
        pool.last_modified_at = Utc::now();
        Ok(Some(event))
    }

    /// Removes a deleted object from every pool, static ones included.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SyncFailed`] listing the pools whose edge
    /// could not be deleted.
    pub async fn remove_object(
        &self,
        class: ObjectClass,
        object_id: ObjectId,
    ) -> Result<(), GatewayError> {
        let mut events = Vec::new();
        let mut failures = Vec::new();
        for (pool_id, handle) in self.pools.handles().await {
            let mut pool = handle.write().await;
            if pool.removed || !pool.membership.contains(class, object_id) {
                continue;
            }
            match self.store.remove_member(pool_id, class, object_id).await {
                Ok(()) => {
                    pool.membership.members_mut(class).remove(&object_id);
                    pool.last_modified_at = Utc::now();
                    events.push(PoolEvent::MemberRemoved {
                        pool_id,
                        class,
                        object_id,
                        reason: MembershipChangeReason::ObjectDeleted,
                        timestamp: Utc::now(),
                    });
                }
                Err(e) => failures.push(PoolFailure {
                    pool_id,
                    message: e.to_string(),
                }),
            }
        }
        self.event_bus.publish_all(events);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::SyncFailed { failures })
        }
    }

    /// Sets a static pool's membership explicitly, bypassing the matcher.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PoolNotStatic`] for dynamic pools,
    /// [`GatewayError::ObjectNotFound`] if an ID does not name an object of
    /// the expected class, or a persistence error.
    pub async fn set_membership(
        &self,
        pool_id: PoolId,
        device_ids: BTreeSet<ObjectId>,
        link_ids: BTreeSet<ObjectId>,
    ) -> Result<Membership, GatewayError> {
        for id in &device_ids {
            self.objects.fetch(ObjectClass::Device, *id).await?;
        }
        for id in &link_ids {
            self.objects.fetch(ObjectClass::Link, *id).await?;
        }
        let membership = Membership {
            devices: device_ids,
            links: link_ids,
        };

        let handle = self.pools.get(pool_id).await?;
        let mut pool = handle.write().await;
        if pool.removed {
            return Err(GatewayError::PoolNotFound(pool_id));
        }
        if !pool.is_static() {
            return Err(GatewayError::PoolNotStatic(pool_id));
        }
        self.store.replace_membership(pool_id, &membership).await?;
        pool.replace_membership(membership.clone());
        drop(pool);

        let _ = self.event_bus.publish(PoolEvent::MembershipAssigned {
            pool_id,
            devices: membership.devices.len(),
            links: membership.links.len(),
            timestamp: Utc::now(),
        });
        tracing::info!(%pool_id, summary = membership.summary(), "static membership assigned");
        Ok(membership)
    }

    fn validate_definition(&self, definition: &PoolDefinition) -> Result<(), GatewayError> {
        if definition.name.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "pool name must not be empty".to_string(),
            ));
        }
        CompiledRules::compile(&definition.rules, &self.catalog).map(|_| ())
    }
}

fn matching_ids(rules: &CompiledRules, objects: &[NetworkObject]) -> BTreeSet<ObjectId> {
    objects
        .iter()
        .filter(|o| rules.matches(*o))
        .map(NetworkObject::id)
        .collect()
}

#[async_trait]
impl UpdateTrigger for MembershipService {
    async fn object_changed(
        &self,
        object: &NetworkObject,
        suppress: bool,
    ) -> Result<(), GatewayError> {
        if suppress {
            return Ok(());
        }
        self.sync_object(object).await
    }

    async fn object_deleted(&self, object: &NetworkObject) -> Result<(), GatewayError> {
        self.remove_object(object.class(), object.id()).await
    }

    async fn resync_all(&self) -> RecomputeReport {
        RecomputeReport::from(&self.recompute_all().await)
    }
}
