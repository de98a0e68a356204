//! In-memory membership store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{MembershipStore, StoredEvent, retention_cutoff};
use crate::domain::{Membership, ObjectClass, ObjectId, Pool, PoolDefinition, PoolEvent, PoolId};
use crate::error::GatewayError;

#[derive(Debug, Default)]
struct State {
    definitions: HashMap<PoolId, (PoolDefinition, DateTime<Utc>)>,
    memberships: HashMap<PoolId, Membership>,
    events: Vec<StoredEvent>,
    next_event_id: i64,
}

/// Process-local [`MembershipStore`]. Each call is applied under one mutex,
/// which makes it trivially atomic.
#[derive(Debug, Default)]
pub struct InMemoryMembershipStore {
    state: Mutex<State>,
}

impl InMemoryMembershipStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MembershipStore for InMemoryMembershipStore {
    async fn save_pool(&self, pool: &Pool) -> Result<(), GatewayError> {
        let mut state = self.state.lock().await;
        state
            .definitions
            .insert(pool.pool_id, (pool.definition.clone(), pool.created_at));
        state
            .memberships
            .insert(pool.pool_id, pool.membership.clone());
        Ok(())
    }

    async fn load_pools(&self) -> Result<Vec<Pool>, GatewayError> {
        let state = self.state.lock().await;
        Ok(state
            .definitions
            .iter()
            .map(|(pool_id, (definition, created_at))| {
                let membership = state.memberships.get(pool_id).cloned().unwrap_or_default();
                Pool::restored(*pool_id, definition.clone(), membership, *created_at)
            })
            .collect())
    }

    async fn replace_membership(
        &self,
        pool_id: PoolId,
        membership: &Membership,
    ) -> Result<(), GatewayError> {
        self.state
            .lock()
            .await
            .memberships
            .insert(pool_id, membership.clone());
        Ok(())
    }

    async fn add_member(
        &self,
        pool_id: PoolId,
        class: ObjectClass,
        object_id: ObjectId,
    ) -> Result<(), GatewayError> {
        self.state
            .lock()
            .await
            .memberships
            .entry(pool_id)
            .or_default()
            .members_mut(class)
            .insert(object_id);
        Ok(())
    }

    async fn remove_member(
        &self,
        pool_id: PoolId,
        class: ObjectClass,
        object_id: ObjectId,
    ) -> Result<(), GatewayError> {
        if let Some(membership) = self.state.lock().await.memberships.get_mut(&pool_id) {
            membership.members_mut(class).remove(&object_id);
        }
        Ok(())
    }

    async fn delete_pool(&self, pool_id: PoolId) -> Result<(), GatewayError> {
        let mut state = self.state.lock().await;
        state.definitions.remove(&pool_id);
        state.memberships.remove(&pool_id);
        Ok(())
    }

    async fn load_membership(&self, pool_id: PoolId) -> Result<Membership, GatewayError> {
        Ok(self
            .state
            .lock()
            .await
            .memberships
            .get(&pool_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn record_event(&self, event: &PoolEvent) -> Result<(), GatewayError> {
        let payload = serde_json::to_value(event)
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;
        let mut state = self.state.lock().await;
        state.next_event_id = state.next_event_id.saturating_add(1);
        let id = state.next_event_id;
        state.events.push(StoredEvent {
            id,
            pool_id: *event.pool_id().as_uuid(),
            event_type: event.event_type_str().to_string(),
            payload,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn events_after(
        &self,
        after: DateTime<Utc>,
        pool_id: Option<PoolId>,
    ) -> Result<Vec<StoredEvent>, GatewayError> {
        let state = self.state.lock().await;
        Ok(state
            .events
            .iter()
            .filter(|e| e.created_at > after)
            .filter(|e| pool_id.is_none_or(|id| *id.as_uuid() == e.pool_id))
            .cloned()
            .collect())
    }

    async fn prune_events(&self, days: u64) -> Result<u64, GatewayError> {
        let cutoff = retention_cutoff(days);
        let mut state = self.state.lock().await;
        let before = state.events.len();
        state.events.retain(|e| e.created_at >= cutoff);
        Ok(u64::try_from(before.saturating_sub(state.events.len())).unwrap_or(u64::MAX))
    }
}
