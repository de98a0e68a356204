//! Type-safe identifiers for pools and inventory objects.
//!
//! [`PoolId`] and [`ObjectId`] wrap [`uuid::Uuid`] (v4) so that a pool
//! identifier can never be passed where an object identifier is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Creates a new random identifier (UUID v4).
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Creates an identifier from an existing [`uuid::Uuid`].
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner [`uuid::Uuid`].
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a pool.
    ///
    /// Generated once at pool creation and used as the key in
    /// [`super::PoolRegistry`], in events and in WebSocket subscriptions.
    PoolId
);

uuid_id!(
    /// Unique identifier for a device or link in the inventory.
    ObjectId
);

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_unique_ids() {
        assert_ne!(PoolId::new(), PoolId::new());
        assert_ne!(ObjectId::new(), ObjectId::new());
    }

    #[test]
    fn display_and_parse_agree() {
        let id = ObjectId::new();
        let s = id.to_string();
        assert_eq!(s.len(), 36);
        let Ok(parsed) = s.parse::<ObjectId>() else {
            panic!("parse failed");
        };
        assert_eq!(parsed, id);
    }

    #[test]
    fn serializes_as_bare_uuid() {
        let uuid = uuid::Uuid::new_v4();
        let id = PoolId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, format!("\"{uuid}\""));
        assert_eq!(*id.as_uuid(), uuid);
    }

    #[test]
    fn garbage_does_not_parse() {
        assert!("not-a-uuid".parse::<PoolId>().is_err());
    }
}
