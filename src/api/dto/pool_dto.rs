//! Pool-related DTOs for definition, membership and event endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::PaginationMeta;
use crate::domain::{Membership, ObjectId, Pool, PoolDefinition, PoolId, PoolSummary};
use crate::persistence::StoredEvent;

/// Response body for `POST /pools` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatePoolResponse {
    /// Unique pool identifier.
    pub pool_id: PoolId,
    /// Pool name echoed from request.
    pub name: String,
    /// Static flag echoed from request.
    #[serde(rename = "static")]
    pub is_static: bool,
    /// Initial membership summary.
    pub summary: String,
    /// Server creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Single pool detail for `GET /pools/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PoolDetailResponse {
    /// Pool identifier.
    pub pool_id: PoolId,
    /// Name, description, static flag and rules.
    #[serde(flatten)]
    pub definition: PoolDefinition,
    /// `"<N> devices - <M> links"`.
    pub summary: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last definition or membership change.
    pub last_modified_at: DateTime<Utc>,
    /// Last successful full recompute.
    pub last_recomputed_at: Option<DateTime<Utc>>,
}

impl From<Pool> for PoolDetailResponse {
    fn from(pool: Pool) -> Self {
        Self {
            pool_id: pool.pool_id,
            summary: pool.membership.summary(),
            definition: pool.definition,
            created_at: pool.created_at,
            last_modified_at: pool.last_modified_at,
            last_recomputed_at: pool.last_recomputed_at,
        }
    }
}

/// Query parameters for `GET /pools`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PoolListParams {
    /// Page number (1-indexed).
    #[serde(default)]
    pub page: Option<u32>,
    /// Items per page (max 100).
    #[serde(default)]
    pub per_page: Option<u32>,
    /// Only static (`true`) or only dynamic (`false`) pools.
    #[serde(default, rename = "static")]
    pub is_static: Option<bool>,
}

/// Paginated list response for `GET /pools`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PoolListResponse {
    /// Pool summaries ordered by name.
    pub data: Vec<PoolSummary>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Response body for the membership endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct MembershipResponse {
    /// Pool identifier.
    pub pool_id: PoolId,
    /// Member device IDs.
    pub devices: Vec<ObjectId>,
    /// Member link IDs.
    pub links: Vec<ObjectId>,
    /// `"<N> devices - <M> links"`.
    pub summary: String,
}

impl MembershipResponse {
    /// Builds the response for `membership` of `pool_id`.
    #[must_use]
    pub fn new(pool_id: PoolId, membership: Membership) -> Self {
        Self {
            pool_id,
            summary: membership.summary(),
            devices: membership.devices.into_iter().collect(),
            links: membership.links.into_iter().collect(),
        }
    }
}

/// Request body for `PUT /pools/{id}/membership`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SetMembershipRequest {
    /// Device IDs; duplicates are ignored.
    #[serde(default)]
    pub devices: Vec<ObjectId>,
    /// Link IDs; duplicates are ignored.
    #[serde(default)]
    pub links: Vec<ObjectId>,
}

/// Query parameters for `GET /pools/{id}/events`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct EventQueryParams {
    /// Only events strictly after this instant. Defaults to the last 24h.
    #[serde(default)]
    pub after: Option<DateTime<Utc>>,
}

/// Response body for `GET /pools/{id}/events`.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventListResponse {
    /// Logged events, oldest first.
    pub data: Vec<StoredEvent>,
}
