//! Domain events reflecting pool definition and membership changes.
//!
//! Every committed change emits a [`PoolEvent`] through the
//! [`super::EventBus`]. Events are broadcast to WebSocket subscribers and
//! optionally appended to the persistent event log.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::network_object::ObjectClass;
use super::{ObjectId, PoolId};

/// Why a single object entered or left a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MembershipChangeReason {
    /// The object was created or updated and re-evaluated.
    ObjectUpdated,
    /// The object was deleted from the inventory.
    ObjectDeleted,
}

/// Domain event emitted after every committed mutation.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum PoolEvent {
    /// Emitted when a new pool is created.
    PoolCreated {
        /// Pool identifier.
        pool_id: PoolId,
        /// Pool name.
        name: String,
        /// Static flag.
        is_static: bool,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a pool's name, description, flag or rules change.
    PoolUpdated {
        /// Pool identifier.
        pool_id: PoolId,
        /// Pool name after the update.
        name: String,
        /// Update timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a pool is removed.
    PoolRemoved {
        /// Pool identifier.
        pool_id: PoolId,
        /// Removal timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a full recomputation committed new membership.
    MembershipRecomputed {
        /// Pool identifier.
        pool_id: PoolId,
        /// Number of member devices.
        devices: usize,
        /// Number of member links.
        links: usize,
        /// Commit timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a full recomputation failed and membership was kept.
    RecomputeFailed {
        /// Pool identifier.
        pool_id: PoolId,
        /// Rendered error.
        error: String,
        /// Failure timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a static pool's membership was assigned by hand.
    MembershipAssigned {
        /// Pool identifier.
        pool_id: PoolId,
        /// Number of member devices.
        devices: usize,
        /// Number of member links.
        links: usize,
        /// Commit timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when an object joined a pool.
    MemberAdded {
        /// Pool identifier.
        pool_id: PoolId,
        /// Object class.
        class: ObjectClass,
        /// Object identifier.
        object_id: ObjectId,
        /// Commit timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when an object left a pool.
    MemberRemoved {
        /// Pool identifier.
        pool_id: PoolId,
        /// Object class.
        class: ObjectClass,
        /// Object identifier.
        object_id: ObjectId,
        /// Why the object left.
        reason: MembershipChangeReason,
        /// Commit timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl PoolEvent {
    /// Returns the pool ID associated with this event.
    #[must_use]
    pub fn pool_id(&self) -> PoolId {
        match self {
            Self::PoolCreated { pool_id, .. }
            | Self::PoolUpdated { pool_id, .. }
            | Self::PoolRemoved { pool_id, .. }
            | Self::MembershipRecomputed { pool_id, .. }
            | Self::RecomputeFailed { pool_id, .. }
            | Self::MembershipAssigned { pool_id, .. }
            | Self::MemberAdded { pool_id, .. }
            | Self::MemberRemoved { pool_id, .. } => *pool_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::PoolCreated { .. } => "pool_created",
            Self::PoolUpdated { .. } => "pool_updated",
            Self::PoolRemoved { .. } => "pool_removed",
            Self::MembershipRecomputed { .. } => "membership_recomputed",
            Self::RecomputeFailed { .. } => "recompute_failed",
            Self::MembershipAssigned { .. } => "membership_assigned",
            Self::MemberAdded { .. } => "member_added",
            Self::MemberRemoved { .. } => "member_removed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_matches_serialized_tag() {
        let event = PoolEvent::MemberAdded {
            pool_id: PoolId::new(),
            class: ObjectClass::Device,
            object_id: ObjectId::new(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains(r#""event_type":"member_added""#));
        assert!(json.contains(r#""class":"device""#));
        assert_eq!(event.event_type_str(), "member_added");
    }

    #[test]
    fn pool_id_accessor() {
        let id = PoolId::new();
        let event = PoolEvent::RecomputeFailed {
            pool_id: id,
            error: "invalid filter pattern".to_string(),
            timestamp: Utc::now(),
        };
        assert_eq!(event.pool_id(), id);
        assert_eq!(event.event_type_str(), "recompute_failed");
    }
}
