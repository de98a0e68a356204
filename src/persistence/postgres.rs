//! PostgreSQL implementation of the membership store.
//!
//! Schema lives in `migrations/`; [`PostgresPersistence::migrate`] applies
//! it at startup.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::models::StoredEvent;
use super::{MembershipStore, retention_cutoff};
use crate::domain::{Membership, ObjectClass, ObjectId, Pool, PoolDefinition, PoolEvent, PoolId};
use crate::error::GatewayError;

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the SQL migrations found in `dir`.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if the migrations cannot
    /// be read or applied.
    pub async fn migrate(&self, dir: &Path) -> Result<(), GatewayError> {
        let migrator = Migrator::new(dir)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;
        migrator
            .run(&self.pool)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;
        Ok(())
    }
}

const fn insert_sql(class: ObjectClass) -> &'static str {
    match class {
        ObjectClass::Device => {
            "INSERT INTO pool_devices (pool_id, device_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
        }
        ObjectClass::Link => {
            "INSERT INTO pool_links (pool_id, link_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
        }
    }
}

const fn delete_sql(class: ObjectClass) -> &'static str {
    match class {
        ObjectClass::Device => "DELETE FROM pool_devices WHERE pool_id = $1 AND device_id = $2",
        ObjectClass::Link => "DELETE FROM pool_links WHERE pool_id = $1 AND link_id = $2",
    }
}

fn uuids<'a>(ids: impl IntoIterator<Item = &'a ObjectId>) -> Vec<Uuid> {
    ids.into_iter().map(|id| *id.as_uuid()).collect()
}

/// Replaces the stored edges of one pool inside `tx`.
async fn write_membership(
    tx: &mut Transaction<'_, Postgres>,
    pid: Uuid,
    membership: &Membership,
) -> Result<(), GatewayError> {
    sqlx::query("DELETE FROM pool_devices WHERE pool_id = $1")
        .bind(pid)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM pool_links WHERE pool_id = $1")
        .bind(pid)
        .execute(&mut **tx)
        .await?;
    sqlx::query("INSERT INTO pool_devices (pool_id, device_id) SELECT $1, UNNEST($2::uuid[])")
        .bind(pid)
        .bind(uuids(&membership.devices))
        .execute(&mut **tx)
        .await?;
    sqlx::query("INSERT INTO pool_links (pool_id, link_id) SELECT $1, UNNEST($2::uuid[])")
        .bind(pid)
        .bind(uuids(&membership.links))
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[async_trait]
impl MembershipStore for PostgresPersistence {
    async fn save_pool(&self, pool: &Pool) -> Result<(), GatewayError> {
        let pid = *pool.pool_id.as_uuid();
        let definition = serde_json::to_value(&pool.definition)
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO pools (pool_id, definition, created_at) VALUES ($1, $2, $3) \
             ON CONFLICT (pool_id) DO UPDATE SET definition = EXCLUDED.definition, updated_at = now()",
        )
        .bind(pid)
        .bind(definition)
        .bind(pool.created_at)
        .execute(&mut *tx)
        .await?;
        write_membership(&mut tx, pid, &pool.membership).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn load_pools(&self) -> Result<Vec<Pool>, GatewayError> {
        let rows = sqlx::query_as::<_, (Uuid, serde_json::Value, DateTime<Utc>)>(
            "SELECT pool_id, definition, created_at FROM pools ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut pools = Vec::with_capacity(rows.len());
        for (pid, definition, created_at) in rows {
            let pool_id = PoolId::from_uuid(pid);
            let definition: PoolDefinition = serde_json::from_value(definition).map_err(|e| {
                GatewayError::PersistenceError(format!("pool {pool_id} definition: {e}"))
            })?;
            let membership = self.load_membership(pool_id).await?;
            pools.push(Pool::restored(pool_id, definition, membership, created_at));
        }
        Ok(pools)
    }

    async fn replace_membership(
        &self,
        pool_id: PoolId,
        membership: &Membership,
    ) -> Result<(), GatewayError> {
        // Dropping `tx` without commit rolls back.
        let mut tx = self.pool.begin().await?;
        write_membership(&mut tx, *pool_id.as_uuid(), membership).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn add_member(
        &self,
        pool_id: PoolId,
        class: ObjectClass,
        object_id: ObjectId,
    ) -> Result<(), GatewayError> {
        sqlx::query(insert_sql(class))
            .bind(*pool_id.as_uuid())
            .bind(*object_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove_member(
        &self,
        pool_id: PoolId,
        class: ObjectClass,
        object_id: ObjectId,
    ) -> Result<(), GatewayError> {
        sqlx::query(delete_sql(class))
            .bind(*pool_id.as_uuid())
            .bind(*object_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_pool(&self, pool_id: PoolId) -> Result<(), GatewayError> {
        let pid = *pool_id.as_uuid();
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM pool_devices WHERE pool_id = $1")
            .bind(pid)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM pool_links WHERE pool_id = $1")
            .bind(pid)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM pools WHERE pool_id = $1")
            .bind(pid)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn load_membership(&self, pool_id: PoolId) -> Result<Membership, GatewayError> {
        let pid = *pool_id.as_uuid();
        let devices =
            sqlx::query_scalar::<_, Uuid>("SELECT device_id FROM pool_devices WHERE pool_id = $1")
                .bind(pid)
                .fetch_all(&self.pool)
                .await?;
        let links =
            sqlx::query_scalar::<_, Uuid>("SELECT link_id FROM pool_links WHERE pool_id = $1")
                .bind(pid)
                .fetch_all(&self.pool)
                .await?;
        Ok(Membership {
            devices: devices.into_iter().map(ObjectId::from_uuid).collect(),
            links: links.into_iter().map(ObjectId::from_uuid).collect(),
        })
    }

    async fn record_event(&self, event: &PoolEvent) -> Result<(), GatewayError> {
        let payload = serde_json::to_value(event)
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;
        sqlx::query(
            "INSERT INTO membership_events (pool_id, event_type, payload) VALUES ($1, $2, $3)",
        )
        .bind(*event.pool_id().as_uuid())
        .bind(event.event_type_str())
        .bind(payload)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn events_after(
        &self,
        after: DateTime<Utc>,
        pool_id: Option<PoolId>,
    ) -> Result<Vec<StoredEvent>, GatewayError> {
        let rows = if let Some(pid) = pool_id {
            sqlx::query_as::<_, (i64, Uuid, String, serde_json::Value, DateTime<Utc>)>(
                "SELECT id, pool_id, event_type, payload, created_at FROM membership_events \
                 WHERE created_at > $1 AND pool_id = $2 ORDER BY created_at ASC",
            )
            .bind(after)
            .bind(*pid.as_uuid())
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, (i64, Uuid, String, serde_json::Value, DateTime<Utc>)>(
                "SELECT id, pool_id, event_type, payload, created_at FROM membership_events \
                 WHERE created_at > $1 ORDER BY created_at ASC",
            )
            .bind(after)
            .fetch_all(&self.pool)
            .await
        }?;

        Ok(rows
            .into_iter()
            .map(
                |(id, pool_id, event_type, payload, created_at)| StoredEvent {
                    id,
                    pool_id,
                    event_type,
                    payload,
                    created_at,
                },
            )
            .collect())
    }

    async fn prune_events(&self, days: u64) -> Result<u64, GatewayError> {
        let result = sqlx::query("DELETE FROM membership_events WHERE created_at < $1")
            .bind(retention_cutoff(days))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_target_the_class_table() {
        assert!(insert_sql(ObjectClass::Device).contains("pool_devices"));
        assert!(insert_sql(ObjectClass::Link).contains("pool_links"));
        assert!(delete_sql(ObjectClass::Link).contains("link_id"));
    }

    #[test]
    fn uuids_preserve_ids() {
        let a = ObjectId::new();
        assert_eq!(uuids([&a]), vec![*a.as_uuid()]);
    }
}
