//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::persistence::MembershipStore;
use crate::service::{InventoryService, MembershipService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Pool definitions and membership.
    pub membership_service: Arc<MembershipService>,
    /// Device and link lifecycle.
    pub inventory_service: Arc<InventoryService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Membership store, also serving the event log.
    pub store: Arc<dyn MembershipStore>,
}
