//! Inventory objects: devices and links.
//!
//! [`NetworkObject`] is a tagged variant over [`Device`] and [`Link`]. Both
//! implement [`PropertyLookup`], the only capability the matcher needs.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ObjectId;
use super::property::{PropertyCatalog, PropertyValue};
use crate::error::GatewayError;

/// Class tag of an inventory object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ObjectClass {
    /// A network device.
    Device,
    /// A link between two devices.
    Link,
}

impl ObjectClass {
    /// Returns the class as a static string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Link => "link",
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named-property access used by the matcher.
pub trait PropertyLookup {
    /// Returns the object's class tag.
    fn class(&self) -> ObjectClass;

    /// Returns the current value of `property`, or `None` if the object
    /// does not define it.
    fn property(&self, property: &str) -> Option<PropertyValue>;
}

/// A network device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Device {
    /// Identifier.
    pub id: ObjectId,
    /// Unique device name.
    pub name: String,
    /// Free text description.
    pub description: String,
    /// Device subtype (router, switch, firewall...).
    pub subtype: String,
    /// Hardware model.
    pub model: String,
    /// Site or location label.
    pub location: String,
    /// Vendor name.
    pub vendor: String,
    /// Operating system.
    pub operating_system: String,
    /// Operating system version.
    pub os_version: String,
    /// Management IP address.
    pub ip_address: String,
    /// Management port.
    pub port: i64,
    /// Map longitude.
    pub longitude: String,
    /// Map latitude.
    pub latitude: String,
    /// Values of the configured custom properties.
    pub custom: BTreeMap<String, PropertyValue>,
    /// Last mutation timestamp.
    pub last_modified_at: DateTime<Utc>,
}

impl Device {
    /// Creates a device with default properties and every custom property
    /// set to its declared default.
    #[must_use]
    pub fn new(name: impl Into<String>, catalog: &PropertyCatalog) -> Self {
        Self {
            id: ObjectId::new(),
            name: name.into(),
            description: String::new(),
            subtype: String::new(),
            model: String::new(),
            location: String::new(),
            vendor: String::new(),
            operating_system: String::new(),
            os_version: String::new(),
            ip_address: String::new(),
            port: 22,
            longitude: "0.0".to_string(),
            latitude: "0.0".to_string(),
            custom: catalog
                .custom()
                .iter()
                .map(|(name, decl)| (name.clone(), decl.default.clone()))
                .collect(),
            last_modified_at: Utc::now(),
        }
    }

    /// Sets a single property by name.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownProperty`] for names that are neither a
    /// base field nor a configured custom property, and
    /// [`GatewayError::InvalidRequest`] when the value has the wrong type.
    pub fn set_property(
        &mut self,
        property: &str,
        value: PropertyValue,
        catalog: &PropertyCatalog,
    ) -> Result<(), GatewayError> {
        let field = match property {
            "name" => &mut self.name,
            "description" => &mut self.description,
            "subtype" => &mut self.subtype,
            "model" => &mut self.model,
            "location" => &mut self.location,
            "vendor" => &mut self.vendor,
            "operating_system" => &mut self.operating_system,
            "os_version" => &mut self.os_version,
            "ip_address" => &mut self.ip_address,
            "longitude" => &mut self.longitude,
            "latitude" => &mut self.latitude,
            "port" => {
                let PropertyValue::Integer(port) = value else {
                    return Err(GatewayError::InvalidRequest(
                        "device property `port` must be an integer".to_string(),
                    ));
                };
                self.port = port;
                return Ok(());
            }
            custom => {
                let declaration = catalog.custom_property(custom).ok_or_else(|| {
                    GatewayError::UnknownProperty {
                        class: ObjectClass::Device,
                        property: custom.to_string(),
                    }
                })?;
                if !declaration.kind.accepts(&value) {
                    return Err(GatewayError::InvalidRequest(format!(
                        "device property `{custom}` expects a {:?} value",
                        declaration.kind
                    )));
                }
                self.custom.insert(custom.to_string(), value);
                return Ok(());
            }
        };
        *field = text_value(ObjectClass::Device, property, value)?;
        Ok(())
    }
}

impl PropertyLookup for Device {
    fn class(&self) -> ObjectClass {
        ObjectClass::Device
    }

    fn property(&self, property: &str) -> Option<PropertyValue> {
        let text = match property {
            "name" => &self.name,
            "description" => &self.description,
            "subtype" => &self.subtype,
            "model" => &self.model,
            "location" => &self.location,
            "vendor" => &self.vendor,
            "operating_system" => &self.operating_system,
            "os_version" => &self.os_version,
            "ip_address" => &self.ip_address,
            "longitude" => &self.longitude,
            "latitude" => &self.latitude,
            "port" => return Some(PropertyValue::Integer(self.port)),
            custom => return self.custom.get(custom).cloned(),
        };
        Some(PropertyValue::String(text.clone()))
    }
}

/// A link between two devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Link {
    /// Identifier.
    pub id: ObjectId,
    /// Unique link name.
    pub name: String,
    /// Free text description.
    pub description: String,
    /// Link subtype (ethernet, optical...).
    pub subtype: String,
    /// Hardware model.
    pub model: String,
    /// Site or location label.
    pub location: String,
    /// Vendor name.
    pub vendor: String,
    /// Display color.
    pub color: String,
    /// Source device.
    pub source: ObjectId,
    /// Name of the source device.
    pub source_name: String,
    /// Destination device.
    pub destination: ObjectId,
    /// Name of the destination device.
    pub destination_name: String,
    /// Last mutation timestamp.
    pub last_modified_at: DateTime<Utc>,
}

impl Link {
    /// Creates a link between `source` and `destination`.
    #[must_use]
    pub fn new(name: impl Into<String>, source: &Device, destination: &Device) -> Self {
        Self {
            id: ObjectId::new(),
            name: name.into(),
            description: String::new(),
            subtype: String::new(),
            model: String::new(),
            location: String::new(),
            vendor: String::new(),
            color: "#000000".to_string(),
            source: source.id,
            source_name: source.name.clone(),
            destination: destination.id,
            destination_name: destination.name.clone(),
            last_modified_at: Utc::now(),
        }
    }

    /// Sets a single descriptive property by name.
    ///
    /// Endpoints are changed through the inventory service, which resolves
    /// the referenced devices.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownProperty`] for unknown or read-only
    /// names and [`GatewayError::InvalidRequest`] for non-string values.
    pub fn set_property(&mut self, property: &str, value: PropertyValue) -> Result<(), GatewayError> {
        let field = match property {
            "name" => &mut self.name,
            "description" => &mut self.description,
            "subtype" => &mut self.subtype,
            "model" => &mut self.model,
            "location" => &mut self.location,
            "vendor" => &mut self.vendor,
            "color" => &mut self.color,
            other => {
                return Err(GatewayError::UnknownProperty {
                    class: ObjectClass::Link,
                    property: other.to_string(),
                });
            }
        };
        *field = text_value(ObjectClass::Link, property, value)?;
        Ok(())
    }

    /// Returns `true` if the link is attached to `device`.
    #[must_use]
    pub fn touches(&self, device: ObjectId) -> bool {
        self.source == device || self.destination == device
    }
}

impl PropertyLookup for Link {
    fn class(&self) -> ObjectClass {
        ObjectClass::Link
    }

    fn property(&self, property: &str) -> Option<PropertyValue> {
        let text = match property {
            "name" => &self.name,
            "description" => &self.description,
            "subtype" => &self.subtype,
            "model" => &self.model,
            "location" => &self.location,
            "vendor" => &self.vendor,
            "color" => &self.color,
            "source_name" => &self.source_name,
            "destination_name" => &self.destination_name,
            _ => return None,
        };
        Some(PropertyValue::String(text.clone()))
    }
}

/// Either kind of inventory object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum NetworkObject {
    /// A device.
    Device(Device),
    /// A link.
    Link(Link),
}

impl NetworkObject {
    /// Returns the object identifier.
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        match self {
            Self::Device(d) => d.id,
            Self::Link(l) => l.id,
        }
    }

    /// Returns the object name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Device(d) => &d.name,
            Self::Link(l) => &l.name,
        }
    }

    /// Returns the device, if this is one.
    #[must_use]
    pub const fn as_device(&self) -> Option<&Device> {
        match self {
            Self::Device(d) => Some(d),
            Self::Link(_) => None,
        }
    }

    /// Returns the link, if this is one.
    #[must_use]
    pub const fn as_link(&self) -> Option<&Link> {
        match self {
            Self::Link(l) => Some(l),
            Self::Device(_) => None,
        }
    }
}

impl PropertyLookup for NetworkObject {
    fn class(&self) -> ObjectClass {
        match self {
            Self::Device(_) => ObjectClass::Device,
            Self::Link(_) => ObjectClass::Link,
        }
    }

    fn property(&self, property: &str) -> Option<PropertyValue> {
        match self {
            Self::Device(d) => d.property(property),
            Self::Link(l) => l.property(property),
        }
    }
}

impl From<Device> for NetworkObject {
    fn from(device: Device) -> Self {
        Self::Device(device)
    }
}

impl From<Link> for NetworkObject {
    fn from(link: Link) -> Self {
        Self::Link(link)
    }
}

fn text_value(
    class: ObjectClass,
    property: &str,
    value: PropertyValue,
) -> Result<String, GatewayError> {
    match value {
        PropertyValue::String(s) => Ok(s),
        PropertyValue::Null => Ok(String::new()),
        other => Err(GatewayError::InvalidRequest(format!(
            "{class} property `{property}` expects text, got `{other}`"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::property::{CustomProperty, PropertyKind};

    fn catalog() -> PropertyCatalog {
        let mut custom = BTreeMap::new();
        custom.insert(
            "rack".to_string(),
            CustomProperty {
                kind: PropertyKind::Integer,
                default: PropertyValue::Integer(0),
            },
        );
        PropertyCatalog::new(custom).unwrap_or_default()
    }

    #[test]
    fn new_device_carries_custom_defaults() {
        let device = Device::new("R1", &catalog());
        assert_eq!(device.property("rack"), Some(PropertyValue::Integer(0)));
        assert_eq!(device.property("port"), Some(PropertyValue::Integer(22)));
        assert_eq!(device.property("name"), Some(PropertyValue::from("R1")));
        assert_eq!(device.property("nonexistent"), None);
    }

    #[test]
    fn set_property_validates_names_and_types() {
        let catalog = catalog();
        let mut device = Device::new("R1", &catalog);
        assert!(
            device
                .set_property("vendor", PropertyValue::from("Cisco"), &catalog)
                .is_ok()
        );
        assert_eq!(device.vendor, "Cisco");
        assert!(
            device
                .set_property("rack", PropertyValue::Integer(4), &catalog)
                .is_ok()
        );
        assert!(
            device
                .set_property("rack", PropertyValue::from("four"), &catalog)
                .is_err()
        );
        assert!(
            device
                .set_property("port", PropertyValue::from("22"), &catalog)
                .is_err()
        );
        let result = device.set_property("bogus", PropertyValue::Null, &catalog);
        assert!(matches!(result, Err(GatewayError::UnknownProperty { .. })));
    }

    #[test]
    fn link_exposes_endpoint_names() {
        let catalog = catalog();
        let a = Device::new("R1", &catalog);
        let b = Device::new("R2", &catalog);
        let link = Link::new("R1-R2", &a, &b);
        assert_eq!(link.property("source_name"), Some(PropertyValue::from("R1")));
        assert_eq!(
            link.property("destination_name"),
            Some(PropertyValue::from("R2"))
        );
        assert!(link.touches(a.id));
        assert!(!link.touches(ObjectId::new()));
    }

    #[test]
    fn link_endpoints_are_read_only() {
        let catalog = catalog();
        let a = Device::new("R1", &catalog);
        let mut link = Link::new("L", &a, &a);
        assert!(
            link.set_property("source_name", PropertyValue::from("X"))
                .is_err()
        );
        assert!(link.set_property("color", PropertyValue::from("#ff0000")).is_ok());
    }

    #[test]
    fn network_object_dispatches() {
        let device = Device::new("R1", &catalog());
        let id = device.id;
        let object = NetworkObject::from(device);
        assert_eq!(object.class(), ObjectClass::Device);
        assert_eq!(object.id(), id);
        assert_eq!(object.name(), "R1");
        assert!(object.as_link().is_none());
        let json = serde_json::to_string(&object).unwrap_or_default();
        assert!(json.contains("\"class\":\"device\""));
    }
}
