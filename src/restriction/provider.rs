//! Restriction provider contract

use std::collections::BTreeSet;
use std::sync::Weak;

use super::definition::{Restriction, RestrictionDefinition};
use super::entry::EntryNode;
use super::pattern::RestrictionPattern;
use crate::error::{AccessControlError, AccessControlResult};
use crate::tree::Value;

/// Owns a set of restriction definitions and everything needed to create,
/// store, validate and evaluate restrictions of those kinds
///
/// `path` is the path of the node an access-control entry is bound to;
/// `None` denotes repository-level entries.
pub trait RestrictionProvider: Send + Sync {
    /// Provider name for logging and debugging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Restriction kinds available for entries at `path`
    fn supported_restrictions(&self, path: Option<&str>) -> BTreeSet<RestrictionDefinition>;

    /// Create a single-valued restriction
    fn create_restriction(&self, path: Option<&str>, name: &str, value: Value) -> AccessControlResult<Restriction>;

    /// Create a multi-valued restriction
    fn create_multi_restriction(
        &self,
        path: Option<&str>,
        name: &str,
        values: Vec<Value>,
    ) -> AccessControlResult<Restriction>;

    /// Restrictions of this provider's kinds stored with `entry`
    fn read_restrictions(&self, path: Option<&str>, entry: &EntryNode) -> BTreeSet<Restriction>;

    /// Store `restrictions` with `entry`
    fn write_restrictions(
        &self,
        path: Option<&str>,
        entry: &mut EntryNode,
        restrictions: &[Restriction],
    ) -> AccessControlResult<()>;

    /// Check the restrictions of this provider's kinds stored with `entry`
    fn validate_restrictions(&self, path: Option<&str>, entry: &EntryNode) -> AccessControlResult<()>;

    /// Pattern for the restrictions stored with `entry`
    fn pattern(&self, path: Option<&str>, entry: &EntryNode) -> RestrictionPattern;

    /// Pattern for an explicit set of restrictions
    fn pattern_for(&self, path: Option<&str>, restrictions: &BTreeSet<Restriction>) -> RestrictionPattern;

    /// Capability to be told about the enclosing composite
    fn aggregation_aware(&self) -> Option<&dyn AggregationAware> {
        None
    }
}

/// Implemented by providers that consult their sibling providers
pub trait AggregationAware {
    /// Receive a non-owning handle to the enclosing composite
    fn set_composite(&self, composite: Weak<dyn RestrictionProvider>);
}

/// Provider without any restriction kinds
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyRestrictionProvider;

impl RestrictionProvider for EmptyRestrictionProvider {
    fn name(&self) -> &str {
        "empty"
    }

    fn supported_restrictions(&self, _path: Option<&str>) -> BTreeSet<RestrictionDefinition> {
        BTreeSet::new()
    }

    fn create_restriction(&self, path: Option<&str>, name: &str, _value: Value) -> AccessControlResult<Restriction> {
        Err(AccessControlError::unsupported_restriction(path, name))
    }

    fn create_multi_restriction(
        &self,
        path: Option<&str>,
        name: &str,
        _values: Vec<Value>,
    ) -> AccessControlResult<Restriction> {
        Err(AccessControlError::unsupported_restriction(path, name))
    }

    fn read_restrictions(&self, _path: Option<&str>, _entry: &EntryNode) -> BTreeSet<Restriction> {
        BTreeSet::new()
    }

    fn write_restrictions(
        &self,
        path: Option<&str>,
        _entry: &mut EntryNode,
        restrictions: &[Restriction],
    ) -> AccessControlResult<()> {
        match restrictions.first() {
            Some(restriction) => Err(AccessControlError::unsupported_restriction(
                path,
                restriction.name(),
            )),
            None => Ok(()),
        }
    }

    fn validate_restrictions(&self, _path: Option<&str>, _entry: &EntryNode) -> AccessControlResult<()> {
        Ok(())
    }

    fn pattern(&self, _path: Option<&str>, _entry: &EntryNode) -> RestrictionPattern {
        RestrictionPattern::All
    }

    fn pattern_for(&self, _path: Option<&str>, _restrictions: &BTreeSet<Restriction>) -> RestrictionPattern {
        RestrictionPattern::All
    }
}
