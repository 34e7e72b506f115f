//! Restrictions narrow access-control entries to a subset of items
//!
//! Each [`RestrictionProvider`] owns a set of restriction kinds. The
//! [`CompositeRestrictionProvider`] merges several providers into one.

pub mod catalog;
pub mod composite;
pub mod definition;
pub mod entry;
pub mod glob;
pub mod item_names;
pub mod pattern;
pub mod provider;

pub use catalog::RestrictionCatalog;
pub use composite::CompositeRestrictionProvider;
pub use definition::{Restriction, RestrictionDefinition};
pub use entry::{EntryNode, REP_RESTRICTIONS};
pub use glob::{GlobPattern, GlobRestrictionProvider, REP_GLOB};
pub use item_names::{ItemNamesPattern, ItemNamesRestrictionProvider, REP_ITEM_NAMES};
pub use pattern::{CompositePattern, PatternMatcher, RestrictionPattern};
pub use provider::{AggregationAware, EmptyRestrictionProvider, RestrictionProvider};
