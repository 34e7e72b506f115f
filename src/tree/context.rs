//! Authorization context
//!
//! Tells the permission layer whether an item belongs to the content
//! managed by the authorization model itself (policies, entries,
//! restrictions). Reading or writing such items maps to the access-control
//! permissions instead of the regular read/write ones.

use super::node::PropertyState;
use super::tree::{Tree, TreeLocation};
use crate::path;

/// Node name of an access-control list bound to a node
pub const REP_POLICY: &str = "rep:policy";

/// Node name of the repository-level access-control list
pub const REP_REPO_POLICY: &str = "rep:repoPolicy";

/// Decides which items are access-control content
pub trait AuthorizationContext: Send + Sync {
    /// Whether the tree is access-control content
    fn defines_tree(&self, tree: &Tree) -> bool;

    /// Whether the property of `parent` is access-control content
    fn defines_property(&self, parent: &Tree, property: &PropertyState) -> bool;

    /// Whether the item at `location` is access-control content
    fn defines_location(&self, location: &TreeLocation) -> bool;
}

/// Context that defines nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultContext;

impl AuthorizationContext for DefaultContext {
    fn defines_tree(&self, _tree: &Tree) -> bool {
        false
    }

    fn defines_property(&self, _parent: &Tree, _property: &PropertyState) -> bool {
        false
    }

    fn defines_location(&self, _location: &TreeLocation) -> bool {
        false
    }
}

/// Context recognising policy subtrees by node name
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessControlContext;

impl AccessControlContext {
    fn defines_path(absolute_path: &str) -> bool {
        path::elements(absolute_path).any(|name| name == REP_POLICY || name == REP_REPO_POLICY)
    }
}

impl AuthorizationContext for AccessControlContext {
    fn defines_tree(&self, tree: &Tree) -> bool {
        Self::defines_path(tree.path())
    }

    fn defines_property(&self, parent: &Tree, _property: &PropertyState) -> bool {
        Self::defines_path(parent.path())
    }

    fn defines_location(&self, location: &TreeLocation) -> bool {
        Self::defines_path(&location.path())
    }
}
