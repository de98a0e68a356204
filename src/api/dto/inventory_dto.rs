//! Device and link DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::{PaginationMeta, PoolSyncStatus};
use crate::domain::{Device, Link, NetworkObject};
use crate::service::{DeviceSpec, LinkSpec};

/// Response body for device create and update.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceResponse {
    /// The device as stored.
    pub device: Device,
    /// Outcome of the triggered membership update.
    pub pool_sync: PoolSyncStatus,
}

/// Response body for link create and update.
#[derive(Debug, Serialize, ToSchema)]
pub struct LinkResponse {
    /// The link as stored.
    pub link: Link,
    /// Outcome of the triggered membership update.
    pub pool_sync: PoolSyncStatus,
}

/// Response body for device and link deletion.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteObjectResponse {
    /// The deleted object.
    pub object: NetworkObject,
    /// Outcome of removing it from every pool.
    pub pool_sync: PoolSyncStatus,
}

/// Paginated list of devices or links.
#[derive(Debug, Serialize, ToSchema)]
pub struct ObjectListResponse {
    /// Objects ordered by name.
    pub data: Vec<NetworkObject>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Request body for `POST /inventory/import`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ImportRequest {
    /// Devices to create or update by name.
    #[serde(default)]
    pub devices: Vec<DeviceSpec>,
    /// Links to create or update by name; imported after all devices.
    #[serde(default)]
    pub links: Vec<LinkSpec>,
}
