//! Property values, custom property declarations and the matchable
//! property catalog.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ObjectClass;
use crate::error::GatewayError;

/// Device properties every pool rule may reference.
pub const DEVICE_BASE_PROPERTIES: &[&str] = &[
    "name",
    "description",
    "subtype",
    "model",
    "location",
    "vendor",
    "operating_system",
    "os_version",
    "ip_address",
    "port",
];

/// Device fields outside the matchable set. Custom properties may not
/// reuse these names either.
const DEVICE_RESERVED_FIELDS: &[&str] =
    &["id", "longitude", "latitude", "custom", "last_modified_at"];

/// Link properties every pool rule may reference.
pub const LINK_BASE_PROPERTIES: &[&str] = &[
    "name",
    "description",
    "subtype",
    "model",
    "location",
    "vendor",
    "source_name",
    "destination_name",
];

/// A single property value as stored on an inventory object.
///
/// Deserializes from plain JSON scalars (`"abc"`, `22`, `1.5`, `true`,
/// `null`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean value.
    Boolean(bool),
    /// Integer value.
    Integer(i64),
    /// Floating point value.
    Float(f64),
    /// Text value.
    String(String),
    /// Unset value.
    Null,
}

impl PropertyValue {
    /// Returns the value type, or `None` for [`PropertyValue::Null`].
    #[must_use]
    pub const fn kind(&self) -> Option<PropertyKind> {
        match self {
            Self::Boolean(_) => Some(PropertyKind::Boolean),
            Self::Integer(_) => Some(PropertyKind::Integer),
            Self::Float(_) => Some(PropertyKind::Float),
            Self::String(_) => Some(PropertyKind::String),
            Self::Null => None,
        }
    }

    /// Returns the text the matcher compares filters against.
    ///
    /// Null renders as the empty string; floats always carry a fractional
    /// digit (`0.0`).
    #[must_use]
    pub fn to_match_string(&self) -> String {
        self.to_string()
    }

    /// Returns the inner string slice for [`PropertyValue::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{x:.1}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
            Self::Null => Ok(()),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

/// Declared type of a custom device property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    /// Text.
    String,
    /// Signed integer.
    Integer,
    /// Floating point.
    Float,
    /// Boolean.
    Boolean,
}

impl PropertyKind {
    /// Returns `true` if `value` may be stored in a property of this kind.
    ///
    /// Null is accepted for every kind; integers are accepted for floats.
    #[must_use]
    pub const fn accepts(self, value: &PropertyValue) -> bool {
        matches!(
            (self, value),
            (_, PropertyValue::Null)
                | (Self::String, PropertyValue::String(_))
                | (Self::Integer, PropertyValue::Integer(_))
                | (Self::Float, PropertyValue::Float(_) | PropertyValue::Integer(_))
                | (Self::Boolean, PropertyValue::Boolean(_))
        )
    }
}

/// Declaration of one custom device property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CustomProperty {
    /// Value type.
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    /// Value given to devices that do not set the property.
    #[serde(default = "null_value")]
    pub default: PropertyValue,
}

const fn null_value() -> PropertyValue {
    PropertyValue::Null
}

/// The matchable property names for each object class.
///
/// Built once from configuration: the fixed base sets plus the custom
/// device properties.
#[derive(Debug, Clone, Default)]
pub struct PropertyCatalog {
    custom: BTreeMap<String, CustomProperty>,
}

impl PropertyCatalog {
    /// Builds a catalog extending devices with `custom` properties.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if a custom property shadows
    /// a device field or its default does not fit its declared type.
    pub fn new(custom: BTreeMap<String, CustomProperty>) -> Result<Self, GatewayError> {
        for (name, declaration) in &custom {
            if DEVICE_BASE_PROPERTIES.contains(&name.as_str())
                || DEVICE_RESERVED_FIELDS.contains(&name.as_str())
            {
                return Err(GatewayError::InvalidRequest(format!(
                    "custom property `{name}` shadows a device field"
                )));
            }
            if !declaration.kind.accepts(&declaration.default) {
                return Err(GatewayError::InvalidRequest(format!(
                    "default of custom property `{name}` is not a {:?}",
                    declaration.kind
                )));
            }
        }
        Ok(Self { custom })
    }

    /// Returns the custom device property declarations.
    #[must_use]
    pub fn custom(&self) -> &BTreeMap<String, CustomProperty> {
        &self.custom
    }

    /// Returns the custom declaration for `name`, if any.
    #[must_use]
    pub fn custom_property(&self, name: &str) -> Option<&CustomProperty> {
        self.custom.get(name)
    }

    /// Returns every matchable property name for `class`, base first.
    #[must_use]
    pub fn properties(&self, class: ObjectClass) -> Vec<&str> {
        match class {
            ObjectClass::Device => DEVICE_BASE_PROPERTIES
                .iter()
                .copied()
                .chain(self.custom.keys().map(String::as_str))
                .collect(),
            ObjectClass::Link => LINK_BASE_PROPERTIES.to_vec(),
        }
    }

    /// Returns `true` if pool rules may reference `property` on `class`.
    #[must_use]
    pub fn contains(&self, class: ObjectClass, property: &str) -> bool {
        match class {
            ObjectClass::Device => {
                DEVICE_BASE_PROPERTIES.contains(&property) || self.custom.contains_key(property)
            }
            ObjectClass::Link => LINK_BASE_PROPERTIES.contains(&property),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn serial_catalog() -> PropertyCatalog {
        let mut custom = BTreeMap::new();
        custom.insert(
            "serial".to_string(),
            CustomProperty {
                kind: PropertyKind::String,
                default: PropertyValue::from(""),
            },
        );
        let Ok(catalog) = PropertyCatalog::new(custom) else {
            panic!("valid catalog");
        };
        catalog
    }

    #[test]
    fn stringification() {
        assert_eq!(PropertyValue::from("Cisco").to_match_string(), "Cisco");
        assert_eq!(PropertyValue::Integer(22).to_match_string(), "22");
        assert_eq!(PropertyValue::Float(0.0).to_match_string(), "0.0");
        assert_eq!(PropertyValue::Float(1.5).to_match_string(), "1.5");
        assert_eq!(PropertyValue::Boolean(true).to_match_string(), "true");
        assert_eq!(PropertyValue::Null.to_match_string(), "");
    }

    #[test]
    fn untagged_deserialization() {
        let values: Vec<PropertyValue> =
            serde_json::from_str(r#"["a", 3, 2.5, false, null]"#).unwrap_or_default();
        assert_eq!(
            values,
            vec![
                PropertyValue::from("a"),
                PropertyValue::Integer(3),
                PropertyValue::Float(2.5),
                PropertyValue::Boolean(false),
                PropertyValue::Null,
            ]
        );
    }

    #[test]
    fn kind_accepts() {
        assert!(PropertyKind::Float.accepts(&PropertyValue::Integer(1)));
        assert!(PropertyKind::Boolean.accepts(&PropertyValue::Null));
        assert!(!PropertyKind::Integer.accepts(&PropertyValue::from("1")));
    }

    #[test]
    fn catalog_includes_custom_device_properties() {
        let catalog = serial_catalog();
        assert!(catalog.contains(ObjectClass::Device, "serial"));
        assert!(catalog.contains(ObjectClass::Device, "vendor"));
        assert!(!catalog.contains(ObjectClass::Link, "serial"));
        assert!(catalog.contains(ObjectClass::Link, "source_name"));
        assert_eq!(catalog.properties(ObjectClass::Device).last(), Some(&"serial"));
    }

    #[test]
    fn catalog_rejects_shadowing_and_bad_defaults() {
        let mut custom = BTreeMap::new();
        custom.insert(
            "vendor".to_string(),
            CustomProperty {
                kind: PropertyKind::String,
                default: PropertyValue::Null,
            },
        );
        assert!(PropertyCatalog::new(custom).is_err());

        let mut custom = BTreeMap::new();
        custom.insert(
            "rack".to_string(),
            CustomProperty {
                kind: PropertyKind::Integer,
                default: PropertyValue::from("A1"),
            },
        );
        assert!(PropertyCatalog::new(custom).is_err());
    }

    #[test]
    fn catalog_rejects_non_matchable_device_fields() {
        for field in ["longitude", "latitude", "id", "custom"] {
            let mut custom = BTreeMap::new();
            custom.insert(
                field.to_string(),
                CustomProperty {
                    kind: PropertyKind::String,
                    default: PropertyValue::Null,
                },
            );
            assert!(PropertyCatalog::new(custom).is_err(), "{field} accepted");
        }
    }
}
