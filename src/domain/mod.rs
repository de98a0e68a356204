//! Domain layer: inventory objects, pool rules, the matcher, registries and
//! the event system.
//!
//! Everything here is independent of HTTP and storage. The service layer
//! composes these pieces into the membership engine.

pub mod event_bus;
pub mod ids;
pub mod matcher;
pub mod network_object;
pub mod object_registry;
pub mod pool;
pub mod pool_event;
pub mod pool_registry;
pub mod property;
pub mod rule_set;

pub use event_bus::EventBus;
pub use ids::{ObjectId, PoolId};
pub use matcher::{CompiledRules, object_match, property_match};
pub use network_object::{Device, Link, NetworkObject, ObjectClass, PropertyLookup};
pub use object_registry::{InMemoryObjectRegistry, ObjectRegistry};
pub use pool::{Membership, Pool, PoolDefinition, PoolSummary};
pub use pool_event::{MembershipChangeReason, PoolEvent};
pub use pool_registry::{PoolHandle, PoolRegistry};
pub use property::{CustomProperty, PropertyCatalog, PropertyKind, PropertyValue};
pub use rule_set::{MatchMode, Operator, PropertyFilter, RuleSet};
