//! Pool aggregate: identity, rules and current membership.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::network_object::ObjectClass;
use super::rule_set::RuleSet;
use super::{ObjectId, PoolId};

/// Editable part of a pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PoolDefinition {
    /// Unique pool name.
    pub name: String,
    /// Free text description.
    #[serde(default)]
    pub description: String,
    /// When `true`, membership is curated by hand and never derived.
    #[serde(default, rename = "static")]
    pub is_static: bool,
    /// Match rules.
    #[serde(default)]
    pub rules: RuleSet,
}

/// Devices and links belonging to a pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Membership {
    /// Member devices.
    pub devices: BTreeSet<ObjectId>,
    /// Member links.
    pub links: BTreeSet<ObjectId>,
}

impl Membership {
    /// Returns the member set for `class`.
    #[must_use]
    pub fn members(&self, class: ObjectClass) -> &BTreeSet<ObjectId> {
        match class {
            ObjectClass::Device => &self.devices,
            ObjectClass::Link => &self.links,
        }
    }

    /// Returns the mutable member set for `class`.
    pub fn members_mut(&mut self, class: ObjectClass) -> &mut BTreeSet<ObjectId> {
        match class {
            ObjectClass::Device => &mut self.devices,
            ObjectClass::Link => &mut self.links,
        }
    }

    /// Returns `true` if `object` of `class` is a member.
    #[must_use]
    pub fn contains(&self, class: ObjectClass, object: ObjectId) -> bool {
        self.members(class).contains(&object)
    }

    /// Renders `"<N> devices - <M> links"`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} devices - {} links", self.devices.len(), self.links.len())
    }
}

/// A pool as held in the [`super::PoolRegistry`].
#[derive(Debug, Clone)]
pub struct Pool {
    /// Unique pool identifier (immutable after creation).
    pub pool_id: PoolId,
    /// Name, description, static flag and rules.
    pub definition: PoolDefinition,
    /// Current membership.
    pub membership: Membership,
    /// Creation timestamp (immutable after creation).
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last definition or membership change.
    pub last_modified_at: DateTime<Utc>,
    /// Timestamp of the last successful full recomputation.
    pub last_recomputed_at: Option<DateTime<Utc>>,
    /// Set under the write lock once the pool is deleted. Mutators that
    /// obtained the handle earlier must leave a removed pool alone.
    pub removed: bool,
}

impl Pool {
    /// Creates a pool with empty membership.
    #[must_use]
    pub fn new(definition: PoolDefinition) -> Self {
        let now = Utc::now();
        Self {
            pool_id: PoolId::new(),
            definition,
            membership: Membership::default(),
            created_at: now,
            last_modified_at: now,
            last_recomputed_at: None,
            removed: false,
        }
    }

    /// Rebuilds a pool from its stored definition and membership.
    #[must_use]
    pub fn restored(
        pool_id: PoolId,
        definition: PoolDefinition,
        membership: Membership,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            pool_id,
            definition,
            membership,
            created_at,
            last_modified_at: created_at,
            last_recomputed_at: None,
            removed: false,
        }
    }

    /// Returns the pool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Returns `true` for hand-curated pools.
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.definition.is_static
    }

    /// Replaces the membership and bumps the modification time.
    pub fn replace_membership(&mut self, membership: Membership) {
        self.membership = membership;
        self.last_modified_at = Utc::now();
    }
}

/// Lightweight summary of a pool for list endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PoolSummary {
    /// Pool identifier.
    pub pool_id: PoolId,
    /// Pool name.
    pub name: String,
    /// Static flag.
    #[serde(rename = "static")]
    pub is_static: bool,
    /// `"<N> devices - <M> links"`.
    pub summary: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub last_modified_at: DateTime<Utc>,
}

impl From<&Pool> for PoolSummary {
    fn from(pool: &Pool) -> Self {
        Self {
            pool_id: pool.pool_id,
            name: pool.definition.name.clone(),
            is_static: pool.definition.is_static,
            summary: pool.membership.summary(),
            created_at: pool.created_at,
            last_modified_at: pool.last_modified_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_devices_and_links() {
        let mut membership = Membership::default();
        membership.devices.insert(ObjectId::new());
        membership.devices.insert(ObjectId::new());
        membership.links.insert(ObjectId::new());
        assert_eq!(membership.summary(), "2 devices - 1 links");
        assert_eq!(Membership::default().summary(), "0 devices - 0 links");
    }

    #[test]
    fn members_are_scoped_by_class() {
        let id = ObjectId::new();
        let mut membership = Membership::default();
        membership.members_mut(ObjectClass::Link).insert(id);
        assert!(membership.contains(ObjectClass::Link, id));
        assert!(!membership.contains(ObjectClass::Device, id));
    }

    #[test]
    fn definition_uses_static_key() {
        let json = r#"{"name":"core","static":true}"#;
        let def: PoolDefinition = serde_json::from_str(json).unwrap_or_default();
        assert!(def.is_static);
        assert_eq!(def.name, "core");

        let pool = Pool::new(def);
        assert!(pool.is_static());
        assert!(pool.last_recomputed_at.is_none());
        assert_eq!(PoolSummary::from(&pool).summary, "0 devices - 0 links");
    }
}
