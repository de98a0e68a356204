//! Rule matching: decides whether an inventory object belongs to a pool.
//!
//! Matching is pure. A [`RuleSet`] is compiled once per evaluation pass into
//! [`CompiledRules`], which validates every referenced property against the
//! [`PropertyCatalog`] and compiles regex filters. Only active (non-empty)
//! filters survive compilation:
//!
//! - [`Operator::All`] passes when every active filter passes, so a rule set
//!   without active filters matches everything.
//! - [`Operator::Any`] passes when one active filter passes, so a rule set
//!   without active filters matches nothing.

use regex::Regex;

use super::network_object::{ObjectClass, PropertyLookup};
use super::property::PropertyCatalog;
use super::rule_set::{MatchMode, Operator, PropertyFilter, RuleSet};
use crate::error::GatewayError;

/// The comparison a compiled filter performs.
#[derive(Debug, Clone)]
enum Comparison {
    Inclusion(String),
    Equality(String),
    Regex(Regex),
}

impl Comparison {
    fn compile(
        class: ObjectClass,
        property: &str,
        filter: &PropertyFilter,
    ) -> Result<Self, GatewayError> {
        Ok(match filter.match_mode {
            MatchMode::Inclusion => Self::Inclusion(filter.value.clone()),
            MatchMode::Equality => Self::Equality(filter.value.clone()),
            MatchMode::Regex => Self::Regex(Regex::new(&filter.value).map_err(|e| {
                GatewayError::InvalidFilterPattern {
                    class,
                    property: property.to_string(),
                    reason: e.to_string(),
                }
            })?),
        })
    }

    fn test(&self, value: &str) -> bool {
        match self {
            Self::Inclusion(needle) => value.contains(needle.as_str()),
            Self::Equality(expected) => value == expected,
            Self::Regex(re) => re.is_match(value),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledFilter {
    property: String,
    comparison: Comparison,
}

impl CompiledFilter {
    fn test(&self, object: &impl PropertyLookup) -> bool {
        let value = object
            .property(&self.property)
            .map(|v| v.to_match_string())
            .unwrap_or_default();
        self.comparison.test(&value)
    }
}

/// A validated, ready-to-evaluate rule set.
#[derive(Debug, Clone)]
pub struct CompiledRules {
    operator: Operator,
    device: Vec<CompiledFilter>,
    link: Vec<CompiledFilter>,
}

impl CompiledRules {
    /// Validates and compiles `rules`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownProperty`] if a filter names a property
    /// outside the catalog for its class, or
    /// [`GatewayError::InvalidFilterPattern`] if a regex filter does not
    /// compile.
    pub fn compile(rules: &RuleSet, catalog: &PropertyCatalog) -> Result<Self, GatewayError> {
        Ok(Self {
            operator: rules.operator,
            device: compile_class(rules, catalog, ObjectClass::Device)?,
            link: compile_class(rules, catalog, ObjectClass::Link)?,
        })
    }

    /// Returns `true` if `object` satisfies the rules for its class.
    #[must_use]
    pub fn matches(&self, object: &impl PropertyLookup) -> bool {
        let filters = match object.class() {
            ObjectClass::Device => &self.device,
            ObjectClass::Link => &self.link,
        };
        match self.operator {
            Operator::All => filters.iter().all(|f| f.test(object)),
            Operator::Any => filters.iter().any(|f| f.test(object)),
        }
    }

    /// Returns the number of active filters for `class`.
    #[must_use]
    pub fn active_filters(&self, class: ObjectClass) -> usize {
        match class {
            ObjectClass::Device => self.device.len(),
            ObjectClass::Link => self.link.len(),
        }
    }
}

fn compile_class(
    rules: &RuleSet,
    catalog: &PropertyCatalog,
    class: ObjectClass,
) -> Result<Vec<CompiledFilter>, GatewayError> {
    let mut compiled = Vec::new();
    for (property, filter) in rules.filters(class) {
        if !catalog.contains(class, property) {
            return Err(GatewayError::UnknownProperty {
                class,
                property: property.clone(),
            });
        }
        if !filter.is_active() {
            continue;
        }
        compiled.push(CompiledFilter {
            property: property.clone(),
            comparison: Comparison::compile(class, property, filter)?,
        });
    }
    Ok(compiled)
}

/// Tests one property of `object` against the pool filter for it.
///
/// Missing filters and empty filter values pass.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidFilterPattern`] if the filter is an
/// invalid regex.
pub fn property_match(
    rules: &RuleSet,
    object: &impl PropertyLookup,
    property: &str,
) -> Result<bool, GatewayError> {
    let class = object.class();
    let Some(filter) = rules.filter(class, property).filter(|f| f.is_active()) else {
        return Ok(true);
    };
    let filter = CompiledFilter {
        property: property.to_string(),
        comparison: Comparison::compile(class, property, filter)?,
    };
    Ok(filter.test(object))
}

/// Tests `object` against a whole rule set.
///
/// Callers evaluating many objects should compile once with
/// [`CompiledRules::compile`] instead.
///
/// # Errors
///
/// See [`CompiledRules::compile`].
pub fn object_match(
    rules: &RuleSet,
    catalog: &PropertyCatalog,
    object: &impl PropertyLookup,
) -> Result<bool, GatewayError> {
    Ok(CompiledRules::compile(rules, catalog)?.matches(object))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::network_object::{Device, Link};
    use crate::domain::property::PropertyValue;

    fn device(ip: &str, vendor: &str) -> Device {
        let catalog = PropertyCatalog::default();
        let mut d = Device::new(format!("dev-{ip}"), &catalog);
        d.ip_address = ip.to_string();
        d.vendor = vendor.to_string();
        d
    }

    fn compiled(rules: &RuleSet) -> CompiledRules {
        let Ok(c) = CompiledRules::compile(rules, &PropertyCatalog::default()) else {
            panic!("rules should compile");
        };
        c
    }

    #[test]
    fn inclusion_is_substring() {
        let rules = RuleSet::default().with_device("ip_address", "10.0.0", MatchMode::Inclusion);
        assert!(compiled(&rules).matches(&device("10.0.0.5", "")));
        assert!(!compiled(&rules).matches(&device("10.0.1.5", "")));
    }

    #[test]
    fn equality_is_exact() {
        let rules = RuleSet::default().with_device("ip_address", "10.0.0.5", MatchMode::Equality);
        let c = compiled(&rules);
        assert!(c.matches(&device("10.0.0.5", "")));
        assert!(!c.matches(&device("10.0.0.50", "")));
        assert!(!c.matches(&device("10.0.0", "")));
    }

    #[test]
    fn regex_searches_anywhere() {
        let rules = RuleSet::default().with_device("ip_address", r"^10\..*\.5$", MatchMode::Regex);
        let c = compiled(&rules);
        assert!(c.matches(&device("10.0.0.5", "")));
        assert!(!c.matches(&device("10.0.1.6", "")));

        let rules = RuleSet::default().with_device("vendor", "isc", MatchMode::Regex);
        assert!(compiled(&rules).matches(&device("", "Cisco IOS")));
    }

    #[test]
    fn wildcard_never_excludes() {
        for mode in [MatchMode::Inclusion, MatchMode::Equality, MatchMode::Regex] {
            let rules = RuleSet::default()
                .with_device("vendor", "", mode)
                .with_device("ip_address", "10.", MatchMode::Inclusion);
            assert!(compiled(&rules).matches(&device("10.1.1.1", "anything")));
            let Ok(ok) = property_match(&rules, &device("", "x"), "vendor") else {
                panic!("wildcard cannot fail");
            };
            assert!(ok);
        }
    }

    #[test]
    fn all_requires_every_active_filter() {
        let rules = RuleSet::new(Operator::All)
            .with_device("vendor", "Cisco", MatchMode::Inclusion)
            .with_device("ip_address", "10.", MatchMode::Inclusion);
        let c = compiled(&rules);
        assert!(c.matches(&device("10.0.0.1", "Cisco")));
        assert!(!c.matches(&device("192.168.0.1", "Cisco")));
    }

    #[test]
    fn any_requires_one_active_filter() {
        let rules = RuleSet::new(Operator::Any)
            .with_device("vendor", "Cisco", MatchMode::Inclusion)
            .with_device("ip_address", "10.", MatchMode::Inclusion);
        let c = compiled(&rules);
        assert!(c.matches(&device("192.168.0.1", "Cisco")));
        assert!(c.matches(&device("10.0.0.1", "Juniper")));
        assert!(!c.matches(&device("192.168.0.1", "Juniper")));
    }

    #[test]
    fn no_active_filters_all_matches_any_does_not() {
        let d = device("10.0.0.1", "Cisco");
        let all = RuleSet::new(Operator::All).with_device("vendor", "", MatchMode::Equality);
        let any = RuleSet::new(Operator::Any).with_device("vendor", "", MatchMode::Equality);
        assert!(compiled(&all).matches(&d));
        assert!(!compiled(&any).matches(&d));
        assert_eq!(compiled(&any).active_filters(ObjectClass::Device), 0);
    }

    #[test]
    fn rules_are_scoped_by_class() {
        let catalog = PropertyCatalog::default();
        let a = device("10.0.0.1", "Cisco");
        let link = Link::new("L1", &a, &a);
        let rules = RuleSet::default().with_device("vendor", "Juniper", MatchMode::Equality);
        // device filters do not constrain links
        assert!(compiled(&rules).matches(&link));
        let Ok(matched) = object_match(&rules, &catalog, &a) else {
            panic!("valid rules");
        };
        assert!(!matched);
    }

    #[test]
    fn numbers_are_stringified() {
        let rules = RuleSet::default().with_device("port", "22", MatchMode::Equality);
        assert!(compiled(&rules).matches(&device("", "")));
    }

    #[test]
    fn absent_value_is_empty_string() {
        let catalog = {
            let mut custom = std::collections::BTreeMap::new();
            custom.insert(
                "serial".to_string(),
                crate::domain::property::CustomProperty {
                    kind: crate::domain::property::PropertyKind::String,
                    default: PropertyValue::Null,
                },
            );
            PropertyCatalog::new(custom).unwrap_or_default()
        };
        let d = Device::new("R1", &catalog);
        let rules = RuleSet::default().with_device("serial", "^$", MatchMode::Regex);
        let Ok(matched) = object_match(&rules, &catalog, &d) else {
            panic!("valid rules");
        };
        assert!(matched);
        let rules = RuleSet::default().with_device("serial", "None", MatchMode::Inclusion);
        assert!(!object_match(&rules, &catalog, &d).unwrap_or(true));
    }

    #[test]
    fn invalid_regex_is_reported() {
        let rules = RuleSet::default().with_device("vendor", "[", MatchMode::Regex);
        let result = CompiledRules::compile(&rules, &PropertyCatalog::default());
        assert!(matches!(
            result,
            Err(GatewayError::InvalidFilterPattern { class: ObjectClass::Device, .. })
        ));
        assert!(property_match(&rules, &device("", ""), "vendor").is_err());
    }

    #[test]
    fn unknown_property_is_reported() {
        let rules = RuleSet::default().with_link("port", "", MatchMode::Inclusion);
        let result = CompiledRules::compile(&rules, &PropertyCatalog::default());
        assert!(matches!(
            result,
            Err(GatewayError::UnknownProperty { class: ObjectClass::Link, .. })
        ));
    }
}
