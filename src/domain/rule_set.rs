//! Declarative pool rules: per-property filters and the operator that
//! combines them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ObjectClass;

/// How a filter value is compared against a property value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// The filter is a substring of the value.
    #[default]
    Inclusion,
    /// The filter equals the value exactly.
    Equality,
    /// The filter is a pattern found anywhere in the value.
    Regex,
}

/// Boolean combinator across a pool's active filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Every active filter must pass.
    #[default]
    All,
    /// At least one active filter must pass.
    Any,
}

/// A filter on one property. An empty `value` is a wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PropertyFilter {
    /// Filter text.
    #[serde(default)]
    pub value: String,
    /// Comparison mode.
    #[serde(default)]
    pub match_mode: MatchMode,
}

impl PropertyFilter {
    /// Creates a filter.
    #[must_use]
    pub fn new(value: impl Into<String>, match_mode: MatchMode) -> Self {
        Self {
            value: value.into(),
            match_mode,
        }
    }

    /// Returns `true` if the filter can exclude an object.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.value.is_empty()
    }
}

/// A pool's complete rule set.
///
/// Properties without an entry behave exactly like an entry with an empty
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RuleSet {
    /// Combinator applied to the active filters of an object's class.
    #[serde(default)]
    pub operator: Operator,
    /// Filters on device properties.
    #[serde(default)]
    pub device: BTreeMap<String, PropertyFilter>,
    /// Filters on link properties.
    #[serde(default)]
    pub link: BTreeMap<String, PropertyFilter>,
}

impl RuleSet {
    /// Creates an empty rule set with the given operator.
    #[must_use]
    pub fn new(operator: Operator) -> Self {
        Self {
            operator,
            ..Self::default()
        }
    }

    /// Builder: adds a device filter.
    #[must_use]
    pub fn with_device(
        mut self,
        property: impl Into<String>,
        value: impl Into<String>,
        match_mode: MatchMode,
    ) -> Self {
        self.device
            .insert(property.into(), PropertyFilter::new(value, match_mode));
        self
    }

    /// Builder: adds a link filter.
    #[must_use]
    pub fn with_link(
        mut self,
        property: impl Into<String>,
        value: impl Into<String>,
        match_mode: MatchMode,
    ) -> Self {
        self.link
            .insert(property.into(), PropertyFilter::new(value, match_mode));
        self
    }

    /// Returns the filters that apply to `class`.
    #[must_use]
    pub fn filters(&self, class: ObjectClass) -> &BTreeMap<String, PropertyFilter> {
        match class {
            ObjectClass::Device => &self.device,
            ObjectClass::Link => &self.link,
        }
    }

    /// Returns the filter on `property` for `class`, if one is set.
    #[must_use]
    pub fn filter(&self, class: ObjectClass, property: &str) -> Option<&PropertyFilter> {
        self.filters(class).get(property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_fresh_pool() {
        let rules = RuleSet::default();
        assert_eq!(rules.operator, Operator::All);
        assert!(rules.device.is_empty());
        assert_eq!(PropertyFilter::default().match_mode, MatchMode::Inclusion);
    }

    #[test]
    fn builder_scopes_filters_by_class() {
        let rules = RuleSet::new(Operator::Any)
            .with_device("vendor", "Cisco", MatchMode::Inclusion)
            .with_link("source_name", "R1", MatchMode::Equality);
        assert!(rules.filter(ObjectClass::Device, "vendor").is_some());
        assert!(rules.filter(ObjectClass::Link, "vendor").is_none());
        assert_eq!(rules.filters(ObjectClass::Link).len(), 1);
    }

    #[test]
    fn empty_value_is_inactive() {
        assert!(!PropertyFilter::new("", MatchMode::Regex).is_active());
        assert!(PropertyFilter::new("x", MatchMode::Equality).is_active());
    }

    #[test]
    fn deserializes_partial_json() {
        let json = r#"{"operator":"any","device":{"vendor":{"value":"Cisco"}}}"#;
        let rules: RuleSet = serde_json::from_str(json).unwrap_or_default();
        assert_eq!(rules.operator, Operator::Any);
        assert_eq!(
            rules.filter(ObjectClass::Device, "vendor"),
            Some(&PropertyFilter::new("Cisco", MatchMode::Inclusion))
        );
    }
}
