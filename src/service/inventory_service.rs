//! Inventory lifecycle: creation, update and deletion of devices and links.
//!
//! Every committed change is handed to the registered [`UpdateTrigger`]s
//! before the call returns, so pool membership is current as soon as the
//! caller sees the stored object.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use utoipa::ToSchema;

use super::{RecomputeReport, UpdateTrigger};
use crate::domain::{
    Device, InMemoryObjectRegistry, Link, NetworkObject, ObjectClass, ObjectId, ObjectRegistry,
    PropertyCatalog, PropertyValue,
};
use crate::error::GatewayError;

/// Property name → new value.
pub type PropertyPatch = BTreeMap<String, PropertyValue>;

/// A device to create.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DeviceSpec {
    /// Unique device name.
    pub name: String,
    /// Initial property values; unspecified ones take their defaults.
    #[serde(default)]
    pub properties: PropertyPatch,
}

/// A link to create. Endpoints are device IDs or device names.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LinkSpec {
    /// Unique link name.
    pub name: String,
    /// Source device ID or name.
    pub source: String,
    /// Destination device ID or name.
    pub destination: String,
    /// Initial property values.
    #[serde(default)]
    pub properties: PropertyPatch,
}

/// Changes to apply to a link.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LinkPatch {
    /// New source device ID or name.
    #[serde(default)]
    pub source: Option<String>,
    /// New destination device ID or name.
    #[serde(default)]
    pub destination: Option<String>,
    /// Property values to change.
    #[serde(default)]
    pub properties: PropertyPatch,
}

/// Result of an inventory mutation: the stored value plus the outcome of
/// the pool membership update it triggered.
///
/// A `pool_sync` error never undoes the stored change.
#[derive(Debug)]
pub struct Synced<T> {
    /// The object as stored.
    pub value: T,
    /// Outcome of the membership update.
    pub pool_sync: Result<(), GatewayError>,
}

/// A bulk import row that was not stored.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImportRejection {
    /// Object class of the row.
    pub class: ObjectClass,
    /// Object name of the row.
    pub name: String,
    /// Why the row was rejected.
    pub message: String,
}

/// Outcome of [`InventoryService::bulk_import`].
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct ImportReport {
    /// Devices created or updated.
    pub devices: usize,
    /// Links created or updated.
    pub links: usize,
    /// Rows that could not be stored.
    pub rejected: Vec<ImportRejection>,
    /// Outcome of the trailing full recompute.
    pub recompute: RecomputeReport,
}

/// Inventory lifecycle management.
#[derive(Debug)]
pub struct InventoryService {
    objects: Arc<InMemoryObjectRegistry>,
    catalog: Arc<PropertyCatalog>,
    triggers: RwLock<Vec<Arc<dyn UpdateTrigger>>>,
}

impl InventoryService {
    /// Creates a service without triggers.
    #[must_use]
    pub fn new(objects: Arc<InMemoryObjectRegistry>, catalog: Arc<PropertyCatalog>) -> Self {
        Self {
            objects,
            catalog,
            triggers: RwLock::new(Vec::new()),
        }
    }

    /// Registers a trigger called after every committed change.
    pub async fn register_trigger(&self, trigger: Arc<dyn UpdateTrigger>) {
        self.triggers.write().await.push(trigger);
    }

    /// Returns the object store.
    #[must_use]
    pub fn objects(&self) -> &Arc<InMemoryObjectRegistry> {
        &self.objects
    }

    /// Returns every object of `class`, ordered by name.
    ///
    /// # Errors
    ///
    /// Propagates registry failures.
    pub async fn list(&self, class: ObjectClass) -> Result<Vec<NetworkObject>, GatewayError> {
        self.objects.fetch_all(class).await
    }

    /// Returns a device by ID.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ObjectNotFound`] if no such device exists.
    pub async fn device(&self, id: ObjectId) -> Result<Device, GatewayError> {
        self.objects
            .fetch(ObjectClass::Device, id)
            .await?
            .as_device()
            .cloned()
            .ok_or(GatewayError::ObjectNotFound(id))
    }

    /// Returns a link by ID.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ObjectNotFound`] if no such link exists.
    pub async fn link(&self, id: ObjectId) -> Result<Link, GatewayError> {
        self.objects
            .fetch(ObjectClass::Link, id)
            .await?
            .as_link()
            .cloned()
            .ok_or(GatewayError::ObjectNotFound(id))
    }

    /// Creates a device and updates pool membership unless `suppress` is set.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the name is empty or taken, or a
    /// property is unknown or mistyped. Nothing is stored in that case.
    pub async fn create_device(
        &self,
        spec: DeviceSpec,
        suppress: bool,
    ) -> Result<Synced<Device>, GatewayError> {
        require_name(&spec.name)?;
        let mut device = Device::new(spec.name, &self.catalog);
        for (property, value) in spec.properties {
            device.set_property(&property, value, &self.catalog)?;
        }
        require_name(&device.name)?;
        self.objects.insert(device.clone().into()).await?;
        tracing::info!(device_id = %device.id, name = %device.name, "device created");

        let pool_sync = self.fire_changed(&device.clone().into(), suppress).await;
        Ok(Synced {
            value: device,
            pool_sync,
        })
    }

    /// Applies `patch` to a device.
    ///
    /// A rename also refreshes the endpoint names of attached links, which
    /// are then re-evaluated against the pools as well.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the device does not exist or the patch
    /// is invalid. Nothing is stored in that case. Links that cannot be
    /// refreshed after a rename are reported through `pool_sync`.
    pub async fn update_device(
        &self,
        id: ObjectId,
        patch: PropertyPatch,
        suppress: bool,
    ) -> Result<Synced<Device>, GatewayError> {
        let mut device = self.device(id).await?;
        let old_name = device.name.clone();
        for (property, value) in patch {
            device.set_property(&property, value, &self.catalog)?;
        }
        require_name(&device.name)?;
        device.last_modified_at = Utc::now();
        self.objects.replace(device.clone().into()).await?;
        tracing::info!(device_id = %id, "device updated");
        let links = if device.name == old_name {
            Vec::new()
        } else {
            self.objects.links_touching(id).await
        };

        let mut outcomes = vec![self.fire_changed(&device.clone().into(), suppress).await];
        for mut link in links {
            if link.source == id {
                link.source_name.clone_from(&device.name);
            }
            if link.destination == id {
                link.destination_name.clone_from(&device.name);
            }
            link.last_modified_at = Utc::now();
            let link: NetworkObject = link.into();
            // The device change stands even if a link vanished meanwhile.
            if let Err(e) = self.objects.replace(link.clone()).await {
                tracing::warn!(link_id = %link.id(), error = %e, "link refresh after rename failed");
                outcomes.push(Err(e));
                continue;
            }
            outcomes.push(self.fire_changed(&link, suppress).await);
        }
        Ok(Synced {
            value: device,
            pool_sync: combine(outcomes),
        })
    }

    /// Creates a link between two existing devices.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if an endpoint cannot be resolved, the
    /// name is taken, or a property is invalid.
    pub async fn create_link(
        &self,
        spec: LinkSpec,
        suppress: bool,
    ) -> Result<Synced<Link>, GatewayError> {
        require_name(&spec.name)?;
        let source = self.resolve_device(&spec.source).await?;
        let destination = self.resolve_device(&spec.destination).await?;
        let mut link = Link::new(spec.name, &source, &destination);
        for (property, value) in spec.properties {
            link.set_property(&property, value)?;
        }
        require_name(&link.name)?;
        self.objects.insert(link.clone().into()).await?;
        tracing::info!(link_id = %link.id, name = %link.name, "link created");

        let pool_sync = self.fire_changed(&link.clone().into(), suppress).await;
        Ok(Synced {
            value: link,
            pool_sync,
        })
    }

    /// Applies `patch` to a link.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the link does not exist or the patch is
    /// invalid.
    pub async fn update_link(
        &self,
        id: ObjectId,
        patch: LinkPatch,
        suppress: bool,
    ) -> Result<Synced<Link>, GatewayError> {
        let mut link = self.link(id).await?;
        if let Some(reference) = patch.source.as_deref() {
            let source = self.resolve_device(reference).await?;
            link.source = source.id;
            link.source_name = source.name;
        }
        if let Some(reference) = patch.destination.as_deref() {
            let destination = self.resolve_device(reference).await?;
            link.destination = destination.id;
            link.destination_name = destination.name;
        }
        for (property, value) in patch.properties {
            link.set_property(&property, value)?;
        }
        require_name(&link.name)?;
        link.last_modified_at = Utc::now();
        self.objects.replace(link.clone().into()).await?;
        tracing::info!(link_id = %id, "link updated");

        let pool_sync = self.fire_changed(&link.clone().into(), suppress).await;
        Ok(Synced {
            value: link,
            pool_sync,
        })
    }

    /// Deletes an object and removes it from every pool. Deleting a device
    /// deletes its links first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ObjectNotFound`] if no object of `class` has
    /// the given ID.
    pub async fn delete_object(
        &self,
        class: ObjectClass,
        id: ObjectId,
    ) -> Result<Synced<NetworkObject>, GatewayError> {
        let object = self.objects.fetch(class, id).await?;
        let mut outcomes = Vec::new();
        if class == ObjectClass::Device {
            for link in self.objects.links_touching(id).await {
                let link = self.objects.remove(link.id).await?;
                tracing::info!(link_id = %link.id(), "attached link deleted");
                outcomes.push(self.fire_deleted(&link).await);
            }
        }
        let object = self.objects.remove(object.id()).await?;
        tracing::info!(object_id = %id, %class, "object deleted");
        outcomes.push(self.fire_deleted(&object).await);
        Ok(Synced {
            value: object,
            pool_sync: combine(outcomes),
        })
    }

    /// Creates or updates (by name) every row with per-object membership
    /// updates suppressed, then recomputes every pool once.
    pub async fn bulk_import(&self, devices: Vec<DeviceSpec>, links: Vec<LinkSpec>) -> ImportReport {
        let mut report = ImportReport::default();
        for spec in devices {
            let name = spec.name.clone();
            match self.upsert_device(spec).await {
                Ok(()) => report.devices += 1,
                Err(e) => report.rejected.push(ImportRejection {
                    class: ObjectClass::Device,
                    name,
                    message: e.to_string(),
                }),
            }
        }
        for spec in links {
            let name = spec.name.clone();
            match self.upsert_link(spec).await {
                Ok(()) => report.links += 1,
                Err(e) => report.rejected.push(ImportRejection {
                    class: ObjectClass::Link,
                    name,
                    message: e.to_string(),
                }),
            }
        }

        let triggers = self.triggers.read().await.clone();
        for trigger in triggers {
            let recompute = trigger.resync_all().await;
            report.recompute.succeeded.extend(recompute.succeeded);
            report.recompute.failed.extend(recompute.failed);
        }
        tracing::info!(
            devices = report.devices,
            links = report.links,
            rejected = report.rejected.len(),
            "inventory imported"
        );
        report
    }

    async fn upsert_device(&self, spec: DeviceSpec) -> Result<(), GatewayError> {
        match self.objects.find_by_name(ObjectClass::Device, &spec.name).await {
            Some(existing) => {
                self.update_device(existing.id(), spec.properties, true)
                    .await?;
            }
            None => {
                self.create_device(spec, true).await?;
            }
        }
        Ok(())
    }

    async fn upsert_link(&self, spec: LinkSpec) -> Result<(), GatewayError> {
        match self.objects.find_by_name(ObjectClass::Link, &spec.name).await {
            Some(existing) => {
                let patch = LinkPatch {
                    source: Some(spec.source),
                    destination: Some(spec.destination),
                    properties: spec.properties,
                };
                self.update_link(existing.id(), patch, true).await?;
            }
            None => {
                self.create_link(spec, true).await?;
            }
        }
        Ok(())
    }

    /// Resolves a device by ID, falling back to a lookup by name.
    async fn resolve_device(&self, reference: &str) -> Result<Device, GatewayError> {
        let by_id = match reference.parse::<ObjectId>() {
            Ok(id) => self.objects.get(id).await.ok(),
            Err(_) => None,
        };
        let found = match by_id {
            Some(object) => Some(object),
            None => {
                self.objects
                    .find_by_name(ObjectClass::Device, reference)
                    .await
            }
        };
        found
            .as_ref()
            .and_then(NetworkObject::as_device)
            .cloned()
            .ok_or_else(|| GatewayError::InvalidRequest(format!("unknown device `{reference}`")))
    }

    async fn fire_changed(&self, object: &NetworkObject, suppress: bool) -> Result<(), GatewayError> {
        let triggers = self.triggers.read().await.clone();
        let mut outcomes = Vec::with_capacity(triggers.len());
        for trigger in triggers {
            outcomes.push(trigger.object_changed(object, suppress).await);
        }
        combine(outcomes)
    }

    async fn fire_deleted(&self, object: &NetworkObject) -> Result<(), GatewayError> {
        let triggers = self.triggers.read().await.clone();
        let mut outcomes = Vec::with_capacity(triggers.len());
        for trigger in triggers {
            outcomes.push(trigger.object_deleted(object).await);
        }
        combine(outcomes)
    }
}

fn require_name(name: &str) -> Result<(), GatewayError> {
    if name.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "object name must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Merges several sync outcomes; per-pool failures are concatenated.
fn combine(outcomes: impl IntoIterator<Item = Result<(), GatewayError>>) -> Result<(), GatewayError> {
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(()) => {}
            Err(GatewayError::SyncFailed { failures: more }) => failures.extend(more),
            Err(e) => return Err(e),
        }
    }
    if failures.is_empty() {
        Ok(())
    } else {
        Err(GatewayError::SyncFailed { failures })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{
        EventBus, MatchMode, Membership, Operator, PoolDefinition, PoolId, PoolRegistry, RuleSet,
    };
    use crate::persistence::{InMemoryMembershipStore, MembershipStore};
    use crate::service::{MembershipService, RecomputeSettings};

    struct Fixture {
        inventory: InventoryService,
        membership: Arc<MembershipService>,
    }

    async fn fixture() -> Fixture {
        let objects = Arc::new(InMemoryObjectRegistry::new());
        let catalog = Arc::new(PropertyCatalog::default());
        let membership = Arc::new(MembershipService::new(
            Arc::new(PoolRegistry::new()),
            Arc::clone(&objects) as Arc<dyn ObjectRegistry>,
            Arc::new(InMemoryMembershipStore::new()) as Arc<dyn MembershipStore>,
            Arc::clone(&catalog),
            EventBus::new(64),
            RecomputeSettings::default(),
        ));
        let inventory = InventoryService::new(objects, catalog);
        inventory
            .register_trigger(Arc::clone(&membership) as Arc<dyn UpdateTrigger>)
            .await;
        Fixture {
            inventory,
            membership,
        }
    }

    fn props(pairs: &[(&str, &str)]) -> PropertyPatch {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), PropertyValue::from(*v)))
            .collect()
    }

    fn device_spec(name: &str, vendor: &str) -> DeviceSpec {
        DeviceSpec {
            name: name.to_string(),
            properties: props(&[("vendor", vendor)]),
        }
    }

    async fn pool(f: &Fixture, name: &str, rules: RuleSet) -> PoolId {
        let definition = PoolDefinition {
            name: name.to_string(),
            rules,
            ..PoolDefinition::default()
        };
        let Ok(id) = f.membership.create_pool(definition).await else {
            panic!("pool creation failed");
        };
        id
    }

    async fn members(f: &Fixture, pool_id: PoolId) -> Membership {
        let Ok(m) = f.membership.get_membership(pool_id).await else {
            panic!("pool missing");
        };
        m
    }

    async fn create_device(f: &Fixture, name: &str, vendor: &str) -> Device {
        let Ok(synced) = f.inventory.create_device(device_spec(name, vendor), false).await else {
            panic!("device creation failed");
        };
        assert!(synced.pool_sync.is_ok());
        synced.value
    }

    #[tokio::test]
    async fn created_device_joins_matching_pool_without_recompute() {
        let f = fixture().await;
        let rules = RuleSet::new(Operator::All).with_device("vendor", "Cisco", MatchMode::Inclusion);
        let p = pool(&f, "cisco", rules).await;

        let r1 = create_device(&f, "R1", "Cisco IOS").await;
        assert!(members(&f, p).await.devices.contains(&r1.id));

        let Ok(synced) = f
            .inventory
            .update_device(r1.id, props(&[("vendor", "Juniper")]), false)
            .await
        else {
            panic!("update failed");
        };
        assert!(synced.pool_sync.is_ok());
        assert!(!members(&f, p).await.devices.contains(&r1.id));
    }

    #[tokio::test]
    async fn device_rename_refreshes_link_membership() {
        let f = fixture().await;
        let rules = RuleSet::default().with_link("source_name", "^core-", MatchMode::Regex);
        let p = pool(&f, "core-links", rules).await;

        let a = create_device(&f, "edge-1", "Cisco").await;
        let _ = create_device(&f, "edge-2", "Cisco").await;
        let spec = LinkSpec {
            name: "uplink".to_string(),
            source: a.id.to_string(),
            destination: "edge-2".to_string(),
            properties: PropertyPatch::new(),
        };
        let Ok(link) = f.inventory.create_link(spec, false).await else {
            panic!("link creation failed");
        };
        assert!(members(&f, p).await.links.is_empty());

        let renamed = f
            .inventory
            .update_device(a.id, props(&[("name", "core-1")]), false)
            .await;
        assert!(matches!(renamed, Ok(Synced { pool_sync: Ok(()), .. })));
        let Ok(stored) = f.inventory.link(link.value.id).await else {
            panic!("link missing");
        };
        assert_eq!(stored.source_name, "core-1");
        assert!(members(&f, p).await.links.contains(&stored.id));
    }

    #[tokio::test]
    async fn deleting_device_cascades_to_links_and_pools() {
        let f = fixture().await;
        let p = pool(&f, "everything", RuleSet::default()).await;
        let a = create_device(&f, "A", "x").await;
        let b = create_device(&f, "B", "y").await;
        let spec = LinkSpec {
            name: "A-B".to_string(),
            source: "A".to_string(),
            destination: "B".to_string(),
            properties: PropertyPatch::new(),
        };
        tokio_test::assert_ok!(f.inventory.create_link(spec, false).await);
        assert_eq!(members(&f, p).await.summary(), "2 devices - 1 links");

        let deleted = f.inventory.delete_object(ObjectClass::Device, a.id).await;
        assert!(matches!(deleted, Ok(Synced { pool_sync: Ok(()), .. })));
        let m = members(&f, p).await;
        assert_eq!(m.devices.iter().copied().collect::<Vec<_>>(), vec![b.id]);
        assert!(m.links.is_empty());
        assert_eq!(f.inventory.objects().count(ObjectClass::Link).await, 0);
    }

    #[tokio::test]
    async fn invalid_input_stores_nothing() {
        let f = fixture().await;
        let _ = create_device(&f, "R1", "Cisco").await;

        let duplicate = f.inventory.create_device(device_spec("R1", "x"), false).await;
        assert!(matches!(duplicate, Err(GatewayError::DuplicateName(_))));

        let spec = DeviceSpec {
            name: "R2".to_string(),
            properties: props(&[("serial", "123")]),
        };
        let unknown = f.inventory.create_device(spec, false).await;
        assert!(matches!(unknown, Err(GatewayError::UnknownProperty { .. })));

        let spec = LinkSpec {
            name: "dangling".to_string(),
            source: "R1".to_string(),
            destination: "nowhere".to_string(),
            properties: PropertyPatch::new(),
        };
        let dangling = f.inventory.create_link(spec, false).await;
        assert!(matches!(dangling, Err(GatewayError::InvalidRequest(_))));
        assert_eq!(f.inventory.objects().count(ObjectClass::Device).await, 1);
        assert_eq!(f.inventory.objects().count(ObjectClass::Link).await, 0);
    }

    #[tokio::test]
    async fn bulk_import_recomputes_once() {
        let f = fixture().await;
        let rules = RuleSet::default().with_device("vendor", "Arista", MatchMode::Equality);
        let p = pool(&f, "arista", rules).await;

        let devices = vec![
            device_spec("S1", "Arista"),
            device_spec("S2", "Cisco"),
            device_spec("", "Arista"),
        ];
        let links = vec![LinkSpec {
            name: "S1-S2".to_string(),
            source: "S1".to_string(),
            destination: "S2".to_string(),
            properties: PropertyPatch::new(),
        }];
        let report = f.inventory.bulk_import(devices, links).await;
        assert_eq!(report.devices, 2);
        assert_eq!(report.links, 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.recompute.succeeded, vec![p]);
        assert_eq!(members(&f, p).await.devices.len(), 1);

        // Second import updates by name.
        let report = f
            .inventory
            .bulk_import(vec![device_spec("S2", "Arista")], Vec::new())
            .await;
        assert_eq!(report.devices, 1);
        assert_eq!(f.inventory.objects().count(ObjectClass::Device).await, 2);
        assert_eq!(members(&f, p).await.devices.len(), 2);
    }

    /// Deletes the links of any device it sees change.
    #[derive(Debug)]
    struct LinkSweeper {
        objects: Arc<InMemoryObjectRegistry>,
    }

    #[async_trait::async_trait]
    impl UpdateTrigger for LinkSweeper {
        async fn object_changed(
            &self,
            object: &NetworkObject,
            _suppress: bool,
        ) -> Result<(), GatewayError> {
            if object.as_device().is_some() {
                for link in self.objects.links_touching(object.id()).await {
                    let _ = self.objects.remove(link.id).await;
                }
            }
            Ok(())
        }

        async fn object_deleted(&self, _object: &NetworkObject) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn resync_all(&self) -> RecomputeReport {
            RecomputeReport::default()
        }
    }

    #[tokio::test]
    async fn rename_stands_when_a_link_disappears() {
        let f = fixture().await;
        let a = create_device(&f, "edge-1", "Cisco").await;
        let _ = create_device(&f, "edge-2", "Cisco").await;
        let spec = LinkSpec {
            name: "uplink".to_string(),
            source: "edge-1".to_string(),
            destination: "edge-2".to_string(),
            properties: PropertyPatch::new(),
        };
        let Ok(link) = f.inventory.create_link(spec, false).await else {
            panic!("link creation failed");
        };
        f.inventory
            .register_trigger(Arc::new(LinkSweeper {
                objects: Arc::clone(f.inventory.objects()),
            }))
            .await;

        let Ok(synced) = f
            .inventory
            .update_device(a.id, props(&[("name", "core-1")]), false)
            .await
        else {
            panic!("rename must succeed");
        };
        assert!(matches!(
            synced.pool_sync,
            Err(GatewayError::ObjectNotFound(id)) if id == link.value.id
        ));
        let Ok(stored) = f.inventory.device(a.id).await else {
            panic!("device missing");
        };
        assert_eq!(stored.name, "core-1");
    }

    #[test]
    fn combine_merges_pool_failures() {
        let p1 = PoolId::new();
        let p2 = PoolId::new();
        let failed = |pool_id: PoolId| -> Result<(), GatewayError> {
            Err(GatewayError::SyncFailed {
                failures: vec![crate::error::PoolFailure {
                    pool_id,
                    message: "boom".to_string(),
                }],
            })
        };
        let Err(GatewayError::SyncFailed { failures }) = combine([failed(p1), Ok(()), failed(p2)])
        else {
            panic!("expected merged failure");
        };
        assert_eq!(failures.len(), 2);
        assert!(combine([Ok(()), Ok(())]).is_ok());
    }
}
