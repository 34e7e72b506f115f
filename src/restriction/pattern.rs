//! Restriction patterns
//!
//! A pattern decides whether an access-control entry applies to an item.
//! Patterns contributed by several restriction providers are combined with
//! [`CompositePattern`], which matches only if every part matches.

use std::fmt;
use std::sync::Arc;

use crate::path;
use crate::tree::{PropertyState, Tree};

/// Predicate over items, implemented by restriction providers
pub trait PatternMatcher: Send + Sync + fmt::Debug {
    /// Whether the node at `path` matches
    fn matches(&self, path: &str) -> bool;

    /// Whether the named property of the node at `path` matches
    fn matches_property(&self, path: &str, property_name: &str) -> bool;

    /// Whether the tree, or the given property of it, matches
    fn matches_tree(&self, tree: &Tree, property: Option<&PropertyState>) -> bool {
        match property {
            Some(property) => self.matches_property(tree.path(), property.name()),
            None => self.matches(tree.path()),
        }
    }

    /// Whether a repository-level entry matches
    fn matches_repository(&self) -> bool {
        false
    }
}

/// Restriction pattern of an access-control entry
#[derive(Debug, Clone)]
pub enum RestrictionPattern {
    /// No restriction narrows the entry
    All,
    /// The entry never applies
    None,
    /// Pattern of a single restriction provider
    Matcher(Arc<dyn PatternMatcher>),
    /// Patterns of several providers, all of which must match
    Composite(CompositePattern),
}

impl RestrictionPattern {
    pub fn matcher<M: PatternMatcher + 'static>(matcher: M) -> Self {
        RestrictionPattern::Matcher(Arc::new(matcher))
    }

    pub fn is_all(&self) -> bool {
        matches!(self, RestrictionPattern::All)
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            RestrictionPattern::All => true,
            RestrictionPattern::None => false,
            RestrictionPattern::Matcher(m) => m.matches(path),
            RestrictionPattern::Composite(c) => c.patterns.iter().all(|p| p.matches(path)),
        }
    }

    pub fn matches_property(&self, path: &str, property_name: &str) -> bool {
        match self {
            RestrictionPattern::All => true,
            RestrictionPattern::None => false,
            RestrictionPattern::Matcher(m) => m.matches_property(path, property_name),
            RestrictionPattern::Composite(c) => c
                .patterns
                .iter()
                .all(|p| p.matches_property(path, property_name)),
        }
    }

    pub fn matches_tree(&self, tree: &Tree, property: Option<&PropertyState>) -> bool {
        match self {
            RestrictionPattern::All => true,
            RestrictionPattern::None => false,
            RestrictionPattern::Matcher(m) => m.matches_tree(tree, property),
            RestrictionPattern::Composite(c) => {
                c.patterns.iter().all(|p| p.matches_tree(tree, property))
            }
        }
    }

    /// Whether the item at `absolute_path` matches; `is_property` marks the
    /// last path element as a property name
    pub fn matches_item(&self, absolute_path: &str, is_property: bool) -> bool {
        match (is_property, path::parent(absolute_path)) {
            (true, Some(parent)) => self.matches_property(parent, path::name(absolute_path)),
            _ => self.matches(absolute_path),
        }
    }

    pub fn matches_repository(&self) -> bool {
        match self {
            RestrictionPattern::All => true,
            RestrictionPattern::None => false,
            RestrictionPattern::Matcher(m) => m.matches_repository(),
            RestrictionPattern::Composite(c) => c.patterns.iter().all(|p| p.matches_repository()),
        }
    }
}

/// Ordered patterns that must all match
#[derive(Debug, Clone)]
pub struct CompositePattern {
    patterns: Vec<RestrictionPattern>,
}

impl CompositePattern {
    /// Combine `patterns`; match-all parts are dropped and nested
    /// composites flattened
    pub fn create(patterns: impl IntoIterator<Item = RestrictionPattern>) -> RestrictionPattern {
        let mut parts = Vec::new();
        for pattern in patterns {
            match pattern {
                RestrictionPattern::All => {}
                RestrictionPattern::None => return RestrictionPattern::None,
                RestrictionPattern::Composite(composite) => parts.extend(composite.patterns),
                matcher => parts.push(matcher),
            }
        }

        match parts.len() {
            0 => RestrictionPattern::All,
            1 => parts.remove(0),
            _ => RestrictionPattern::Composite(CompositePattern { patterns: parts }),
        }
    }

    pub fn patterns(&self) -> &[RestrictionPattern] {
        &self.patterns
    }
}
