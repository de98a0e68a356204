//! Database models for the event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A stored row from the `membership_events` table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredEvent {
    /// Auto-increment row ID.
    pub id: i64,
    /// Pool that generated the event.
    pub pool_id: Uuid,
    /// Event type discriminator (e.g. `"member_added"`).
    pub event_type: String,
    /// JSONB payload with the serialized event.
    pub payload: serde_json::Value,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}
