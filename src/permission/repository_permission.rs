//! Repository-level permission decisions
//!
//! Covers operations not bound to a node: namespace, node type definition,
//! workspace and privilege management.

use std::fmt;
use std::sync::Arc;

use super::bits::Permissions;
use crate::composite::CompositeRepositoryPermission;

/// Repository-level decision object produced by a single provider
pub trait RepositoryCheck: Send + Sync + fmt::Debug {
    /// Whether all of `permissions` are granted at repository level
    fn is_granted(&self, permissions: Permissions) -> bool;
}

/// Permission decision for repository-level operations
#[derive(Debug, Clone)]
pub enum RepositoryPermission {
    /// Everything is granted
    All,
    /// Nothing is granted
    Empty,
    /// Decision of a single provider
    Leaf(Arc<dyn RepositoryCheck>),
    /// Folded decision of several providers
    Composite(CompositeRepositoryPermission),
}

impl RepositoryPermission {
    pub fn is_granted(&self, permissions: Permissions) -> bool {
        match self {
            RepositoryPermission::All => true,
            RepositoryPermission::Empty => false,
            RepositoryPermission::Leaf(check) => check.is_granted(permissions),
            RepositoryPermission::Composite(composite) => composite.is_granted(permissions),
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, RepositoryPermission::Composite(_))
    }
}
