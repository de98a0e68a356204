//! Inventory object storage.
//!
//! The membership engine only reads objects, through the narrow
//! [`ObjectRegistry`] trait. [`InMemoryObjectRegistry`] is the store used by
//! the inventory service; it also offers the write operations the service
//! needs.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::ObjectId;
use super::network_object::{Link, NetworkObject, ObjectClass, PropertyLookup};
use crate::error::GatewayError;

/// Read access to the current inventory.
#[async_trait]
pub trait ObjectRegistry: fmt::Debug + Send + Sync {
    /// Fetches one object of `class` by ID.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ObjectNotFound`] if no object of that class
    /// has the ID.
    async fn fetch(&self, class: ObjectClass, id: ObjectId) -> Result<NetworkObject, GatewayError>;

    /// Fetches a snapshot of every object of `class`.
    ///
    /// # Errors
    ///
    /// Implementations backed by external storage may fail.
    async fn fetch_all(&self, class: ObjectClass) -> Result<Vec<NetworkObject>, GatewayError>;
}

/// In-memory inventory with per-class unique names.
#[derive(Debug, Default)]
pub struct InMemoryObjectRegistry {
    objects: RwLock<HashMap<ObjectId, NetworkObject>>,
}

impl InMemoryObjectRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new object.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DuplicateName`] if another object of the same
    /// class already uses the name.
    pub async fn insert(&self, object: NetworkObject) -> Result<(), GatewayError> {
        let mut objects = self.objects.write().await;
        ensure_unique_name(&objects, &object)?;
        objects.insert(object.id(), object);
        Ok(())
    }

    /// Replaces an existing object, keeping names unique.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ObjectNotFound`] if the object does not exist
    /// and [`GatewayError::DuplicateName`] on a name collision.
    pub async fn replace(&self, object: NetworkObject) -> Result<(), GatewayError> {
        let mut objects = self.objects.write().await;
        if !objects.contains_key(&object.id()) {
            return Err(GatewayError::ObjectNotFound(object.id()));
        }
        ensure_unique_name(&objects, &object)?;
        objects.insert(object.id(), object);
        Ok(())
    }

    /// Removes an object and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ObjectNotFound`] if the object does not exist.
    pub async fn remove(&self, id: ObjectId) -> Result<NetworkObject, GatewayError> {
        self.objects
            .write()
            .await
            .remove(&id)
            .ok_or(GatewayError::ObjectNotFound(id))
    }

    /// Returns any object by ID, whatever its class.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ObjectNotFound`] if the object does not exist.
    pub async fn get(&self, id: ObjectId) -> Result<NetworkObject, GatewayError> {
        self.objects
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(GatewayError::ObjectNotFound(id))
    }

    /// Looks up an object of `class` by name.
    pub async fn find_by_name(&self, class: ObjectClass, name: &str) -> Option<NetworkObject> {
        self.objects
            .read()
            .await
            .values()
            .find(|o| o.class() == class && o.name() == name)
            .cloned()
    }

    /// Returns every link attached to `device`.
    pub async fn links_touching(&self, device: ObjectId) -> Vec<Link> {
        self.objects
            .read()
            .await
            .values()
            .filter_map(NetworkObject::as_link)
            .filter(|l| l.touches(device))
            .cloned()
            .collect()
    }

    /// Returns the number of stored objects of `class`.
    pub async fn count(&self, class: ObjectClass) -> usize {
        self.objects
            .read()
            .await
            .values()
            .filter(|o| o.class() == class)
            .count()
    }
}

#[async_trait]
impl ObjectRegistry for InMemoryObjectRegistry {
    async fn fetch(&self, class: ObjectClass, id: ObjectId) -> Result<NetworkObject, GatewayError> {
        self.objects
            .read()
            .await
            .get(&id)
            .filter(|o| o.class() == class)
            .cloned()
            .ok_or(GatewayError::ObjectNotFound(id))
    }

    async fn fetch_all(&self, class: ObjectClass) -> Result<Vec<NetworkObject>, GatewayError> {
        let objects = self.objects.read().await;
        let mut all: Vec<_> = objects
            .values()
            .filter(|o| o.class() == class)
            .cloned()
            .collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(all)
    }
}

fn ensure_unique_name(
    objects: &HashMap<ObjectId, NetworkObject>,
    candidate: &NetworkObject,
) -> Result<(), GatewayError> {
    let taken = objects.values().any(|o| {
        o.id() != candidate.id() && o.class() == candidate.class() && o.name() == candidate.name()
    });
    if taken {
        return Err(GatewayError::DuplicateName(candidate.name().to_string()));
    }
    Ok(())
}
