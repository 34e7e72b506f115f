//! `rep:glob` restriction
//!
//! Narrows an entry to the items whose path matches a glob relative to the
//! entry's path. `*` also matches across `/`, so `*/jcr:content` matches
//! every `jcr:content` below the entry's node. An empty glob matches the
//! node itself only.

use std::collections::BTreeSet;

use glob::{MatchOptions, Pattern};

use super::catalog::RestrictionCatalog;
use super::definition::{Restriction, RestrictionDefinition};
use super::entry::EntryNode;
use super::pattern::{PatternMatcher, RestrictionPattern};
use super::provider::RestrictionProvider;
use crate::error::{AccessControlError, AccessControlResult};
use crate::path;
use crate::tree::{PropertyState, Value, ValueType};

pub const REP_GLOB: &str = "rep:glob";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Matches item paths against `<entry path><glob>`
#[derive(Debug)]
pub struct GlobPattern {
    pattern: Pattern,
}

impl GlobPattern {
    pub fn new(path: &str, glob: &str) -> Result<Self, glob::PatternError> {
        let base = if path::is_root(path) { "" } else { path };
        let pattern = Pattern::new(&format!("{}{}", Pattern::escape(base), glob))?;
        Ok(Self { pattern })
    }
}

impl PatternMatcher for GlobPattern {
    fn matches(&self, path: &str) -> bool {
        self.pattern.matches_with(path, MATCH_OPTIONS)
    }

    fn matches_property(&self, path: &str, property_name: &str) -> bool {
        self.matches(&path::concat(path, property_name))
    }
}

/// Restriction provider for `rep:glob`
#[derive(Debug)]
pub struct GlobRestrictionProvider {
    catalog: RestrictionCatalog,
}

impl GlobRestrictionProvider {
    pub fn new() -> Self {
        Self {
            catalog: RestrictionCatalog::new([RestrictionDefinition::new(
                REP_GLOB,
                ValueType::String,
                false,
            )]),
        }
    }

    fn glob_pattern(path: Option<&str>, property: Option<&PropertyState>) -> RestrictionPattern {
        let (Some(path), Some(glob)) = (path, property.and_then(|p| p.value()).and_then(Value::as_str)) else {
            return RestrictionPattern::All;
        };
        match GlobPattern::new(path, glob) {
            Ok(pattern) => RestrictionPattern::matcher(pattern),
            Err(e) => {
                tracing::warn!("Invalid glob '{}' at {}: {}", glob, path, e);
                RestrictionPattern::None
            }
        }
    }
}

impl Default for GlobRestrictionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RestrictionProvider for GlobRestrictionProvider {
    fn name(&self) -> &str {
        "glob"
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

        if let (Some(p), Some(glob)) = (
            path,
            entry.property(REP_GLOB).and_then(|p| p.value()).and_then(Value::as_str),
        ) {
            if let Err(e) = GlobPattern::new(p, glob) {
                return Err(AccessControlError::invalid_restriction(path, REP_GLOB, e.to_string()));
            }
        }
        Ok(())
    }

    fn pattern(&self, path: Option<&str>, entry: &EntryNode) -> RestrictionPattern {
        Self::glob_pattern(path, entry.property(REP_GLOB))
    }

    fn pattern_for(&self, path: Option<&str>, restrictions: &BTreeSet<Restriction>) -> RestrictionPattern {
        let glob = restrictions
            .iter()
            .find(|r| r.name() == REP_GLOB)
            .map(Restriction::property);
        Self::glob_pattern(path, glob)
    }
}
