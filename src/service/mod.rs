//! Service layer: business logic orchestration.
//!
//! [`MembershipService`] owns pool definitions and derives their membership;
//! [`InventoryService`] owns device and link lifecycle and notifies the
//! membership engine through the [`UpdateTrigger`] seam.

pub mod inventory_service;
pub mod membership_service;
pub mod update_trigger;

pub use inventory_service::{
    DeviceSpec, ImportRejection, ImportReport, InventoryService, LinkPatch, LinkSpec,
    PropertyPatch, Synced,
};
pub use membership_service::{
    MembershipService, RecomputeOutcomes, RecomputeReport, RecomputeSettings,
};
pub use update_trigger::UpdateTrigger;
