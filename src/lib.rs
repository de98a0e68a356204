//! # netpool-gateway
//!
//! Pool membership engine for a network inventory, served over REST and
//! WebSocket.
//!
//! A pool is a named grouping of devices and links. Static pools are
//! curated by hand; dynamic pools derive their members from property
//! filters evaluated against the inventory. Membership is kept current
//! incrementally as single objects change, and fully when a pool's rules
//! change or a recompute is requested.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── InventoryService ──UpdateTrigger──▶ MembershipService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── PoolRegistry, ObjectRegistry, matcher (domain/)
//!     │
//!     └── MembershipStore: PostgreSQL or in-memory (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
