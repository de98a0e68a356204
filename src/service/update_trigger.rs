//! Hook invoked by inventory lifecycle management.

use std::fmt;

use async_trait::async_trait;

use super::RecomputeReport;
use crate::domain::NetworkObject;
use crate::error::GatewayError;

/// Receives inventory changes right after they are stored.
///
/// The inventory service calls every registered trigger synchronously after
/// each create, update or delete. A trigger error is reported to the caller
/// of the inventory operation; the stored object change stands.
#[async_trait]
pub trait UpdateTrigger: fmt::Debug + Send + Sync {
    /// Called after `object` was created or had a property changed.
    ///
    /// `suppress` is set by bulk operations that run [`Self::resync_all`]
    /// once at the end instead.
    ///
    /// # Errors
    ///
    /// Returns the failure of the membership update for this object.
    async fn object_changed(&self, object: &NetworkObject, suppress: bool)
    -> Result<(), GatewayError>;

    /// Called after `object` was deleted from the inventory.
    ///
    /// # Errors
    ///
    /// Returns the failure of removing the object's memberships.
    async fn object_deleted(&self, object: &NetworkObject) -> Result<(), GatewayError>;

    /// Called once after a suppressed bulk operation.
    async fn resync_all(&self) -> RecomputeReport;
}
