//! `rep:itemNames` restriction
//!
//! Narrows an entry to nodes and properties with one of the given names.

use std::collections::BTreeSet;
use std::sync::{OnceLock, Weak};

use super::catalog::RestrictionCatalog;
use super::definition::{Restriction, RestrictionDefinition};
use super::entry::EntryNode;
use super::pattern::{PatternMatcher, RestrictionPattern};
use super::provider::{AggregationAware, RestrictionProvider};
use crate::error::{AccessControlError, AccessControlResult};
use crate::path;
use crate::tree::{PropertyState, Value, ValueType};

pub const REP_ITEM_NAMES: &str = "rep:itemNames";

/// Matches items by their name
#[derive(Debug)]
pub struct ItemNamesPattern {
    names: BTreeSet<String>,
}

impl ItemNamesPattern {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }
}

impl PatternMatcher for ItemNamesPattern {
    fn matches(&self, path: &str) -> bool {
        self.names.contains(path::name(path))
    }

    fn matches_property(&self, _path: &str, property_name: &str) -> bool {
        self.names.contains(property_name)
    }
}

/// Restriction provider for `rep:itemNames`
///
/// When part of a composite, validation also checks that the composite
/// routes `rep:itemNames` to this provider's definition.
#[derive(Debug)]
pub struct ItemNamesRestrictionProvider {
    catalog: RestrictionCatalog,
    composite: OnceLock<Weak<dyn RestrictionProvider>>,
}

impl ItemNamesRestrictionProvider {
    pub fn new() -> Self {
        Self {
            catalog: RestrictionCatalog::new([RestrictionDefinition::new(
                REP_ITEM_NAMES,
                ValueType::Name,
                true,
            )]),
            composite: OnceLock::new(),
        }
    }

    fn names_pattern(path: Option<&str>, property: Option<&PropertyState>) -> RestrictionPattern {
        match (path, property) {
            (Some(_), Some(property)) => RestrictionPattern::matcher(ItemNamesPattern::new(
                property
                    .values()
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string),
            )),
            _ => RestrictionPattern::All,
        }
    }

    fn check_routing(&self, path: Option<&str>) -> AccessControlResult<()> {
        let Some(composite) = self.composite.get().and_then(Weak::upgrade) else {
            return Ok(());
        };
        let own = self.catalog.definition(REP_ITEM_NAMES);
        let conflicting = composite
            .supported_restrictions(path)
            .into_iter()
            .any(|d| d.name() == REP_ITEM_NAMES && Some(&d) != own);
        if conflicting {
            return Err(AccessControlError::invalid_restriction(
                path,
                REP_ITEM_NAMES,
                "conflicting definitions in the enclosing composite",
            ));
        }
        Ok(())
    }
}

impl Default for ItemNamesRestrictionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregationAware for ItemNamesRestrictionProvider {
    fn set_composite(&self, composite: Weak<dyn RestrictionProvider>) {
        if self.composite.set(composite).is_err() {
            tracing::warn!("Restriction provider '{}' is already part of a composite", REP_ITEM_NAMES);
        }
    }
}

impl RestrictionProvider for ItemNamesRestrictionProvider {
    fn name(&self) -> &str {
        "item-names"
    }

    fn supported_restrictions(&self, path: Option<&str>) -> BTreeSet<RestrictionDefinition> {
        self.catalog.supported(path)
    }

    fn create_restriction(&self, path: Option<&str>, name: &str, value: Value) -> AccessControlResult<Restriction> {
        self.catalog.create(path, name, value)
    }

    fn create_multi_restriction(
        &self,
        path: Option<&str>,
        name: &str,
        values: Vec<Value>,
    ) -> AccessControlResult<Restriction> {
        self.catalog.create_multi(path, name, values)
    }

    fn read_restrictions(&self, path: Option<&str>, entry: &EntryNode) -> BTreeSet<Restriction> {
        self.catalog.read(path, entry)
    }

    fn write_restrictions(
        &self,
        path: Option<&str>,
        entry: &mut EntryNode,
        restrictions: &[Restriction],
    ) -> AccessControlResult<()> {
        self.catalog.write(path, entry, restrictions)
    }

    fn validate_restrictions(&self, path: Option<&str>, entry: &EntryNode) -> AccessControlResult<()> {
        self.catalog.validate(path, entry)?;
        if entry.property(REP_ITEM_NAMES).is_some() {
            self.check_routing(path)?;
        }
        Ok(())
    }

    fn pattern(&self, path: Option<&str>, entry: &EntryNode) -> RestrictionPattern {
        Self::names_pattern(path, entry.property(REP_ITEM_NAMES))
    }

    fn pattern_for(&self, path: Option<&str>, restrictions: &BTreeSet<Restriction>) -> RestrictionPattern {
        let names = restrictions
            .iter()
            .find(|r| r.name() == REP_ITEM_NAMES)
            .map(Restriction::property);
        Self::names_pattern(path, names)
    }

    fn aggregation_aware(&self) -> Option<&dyn AggregationAware> {
        Some(self)
    }
}
