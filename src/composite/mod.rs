//! Composition of permission providers
//!
//! Folds the verdicts of several [`AggregatedPermissionProvider`]s into one
//! under AND or OR semantics, per node ([`CompositeTreePermission`]), at
//! repository level ([`CompositeRepositoryPermission`]) and for the full
//! provider surface ([`CompositePermissionProvider`]).
//!
//! [`AggregatedPermissionProvider`]: crate::permission::AggregatedPermissionProvider

pub mod fold;
pub mod provider;
pub mod repository_permission;
pub mod tree_permission;

#[cfg(test)]
pub(crate) mod fixtures;

pub use fold::CompositionType;
pub use provider::CompositePermissionProvider;
pub use repository_permission::CompositeRepositoryPermission;
pub use tree_permission::CompositeTreePermission;
