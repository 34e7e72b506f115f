//! Per-node permission decisions
//!
//! A [`TreePermission`] answers "what is granted here" for one node and
//! derives the decision for each child from itself, so a traversal threads
//! the decision down the tree instead of re-evaluating every ancestor.
//!
//! `All`, `Empty` and `NoRecourse` are terminal: every descendant of a node
//! with a terminal decision receives the same decision without consulting
//! any provider.

use std::fmt;
use std::sync::Arc;

use super::bits::Permissions;
use crate::composite::CompositeTreePermission;
use crate::tree::{NodeState, PropertyState};

/// Decision object produced by a single permission provider
pub trait NodePermission: Send + Sync + fmt::Debug {
    /// Derive the decision for the named child
    fn child_permission(&self, name: &str, child_state: &NodeState) -> TreePermission;

    /// Whether the node itself is readable
    fn can_read(&self) -> bool;

    /// Whether the given property of the node is readable
    fn can_read_property(&self, property: &PropertyState) -> bool;

    /// Whether the node and everything below it is readable
    fn can_read_all(&self) -> bool;

    /// Whether all properties of the node are readable
    fn can_read_properties(&self) -> bool;

    /// Whether all of `permissions` are granted on the node
    fn is_granted(&self, permissions: Permissions) -> bool;

    /// Whether all of `permissions` are granted on the property
    fn is_granted_property(&self, permissions: Permissions, property: &PropertyState) -> bool;
}

/// Permission decision for one node
#[derive(Clone)]
pub enum TreePermission {
    /// Everything is granted in this subtree
    All,
    /// Nothing is granted in this subtree
    Empty,
    /// The provider will never grant anything in this subtree
    NoRecourse,
    /// Decision of a single provider
    Leaf(Arc<dyn NodePermission>),
    /// Folded decision of several providers
    Composite(Arc<CompositeTreePermission>),
}

impl TreePermission {
    /// Wrap a provider's decision object
    pub fn leaf<P: NodePermission + 'static>(permission: P) -> Self {
        TreePermission::Leaf(Arc::new(permission))
    }

    /// Whether this decision is inherited unchanged by all descendants
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TreePermission::All | TreePermission::Empty | TreePermission::NoRecourse
        )
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, TreePermission::Composite(_))
    }

    pub fn child_permission(&self, name: &str, child_state: &NodeState) -> TreePermission {
        match self {
            TreePermission::All => TreePermission::All,
            TreePermission::Empty => TreePermission::Empty,
            TreePermission::NoRecourse => TreePermission::NoRecourse,
            TreePermission::Leaf(p) => p.child_permission(name, child_state),
            TreePermission::Composite(p) => p.child_permission(name, child_state),
        }
    }

    pub fn can_read(&self) -> bool {
        match self {
            TreePermission::All => true,
            TreePermission::Empty | TreePermission::NoRecourse => false,
            TreePermission::Leaf(p) => p.can_read(),
            TreePermission::Composite(p) => p.can_read(),
        }
    }

    pub fn can_read_property(&self, property: &PropertyState) -> bool {
        match self {
            TreePermission::All => true,
            TreePermission::Empty | TreePermission::NoRecourse => false,
            TreePermission::Leaf(p) => p.can_read_property(property),
            TreePermission::Composite(p) => p.can_read_property(property),
        }
    }

    pub fn can_read_all(&self) -> bool {
        match self {
            TreePermission::All => true,
            TreePermission::Empty | TreePermission::NoRecourse => false,
            TreePermission::Leaf(p) => p.can_read_all(),
            TreePermission::Composite(p) => p.can_read_all(),
        }
    }

    pub fn can_read_properties(&self) -> bool {
        match self {
            TreePermission::All => true,
            TreePermission::Empty | TreePermission::NoRecourse => false,
            TreePermission::Leaf(p) => p.can_read_properties(),
            TreePermission::Composite(p) => p.can_read_properties(),
        }
    }

    pub fn is_granted(&self, permissions: Permissions) -> bool {
        match self {
            TreePermission::All => true,
            TreePermission::Empty | TreePermission::NoRecourse => false,
            TreePermission::Leaf(p) => p.is_granted(permissions),
            TreePermission::Composite(p) => p.is_granted(permissions),
        }
    }

    pub fn is_granted_property(&self, permissions: Permissions, property: &PropertyState) -> bool {
        match self {
            TreePermission::All => true,
            TreePermission::Empty | TreePermission::NoRecourse => false,
            TreePermission::Leaf(p) => p.is_granted_property(permissions, property),
            TreePermission::Composite(p) => p.is_granted_property(permissions, property),
        }
    }
}

impl fmt::Debug for TreePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreePermission::All => f.write_str("TreePermission::All"),
            TreePermission::Empty => f.write_str("TreePermission::Empty"),
            TreePermission::NoRecourse => f.write_str("TreePermission::NoRecourse"),
            TreePermission::Leaf(p) => f.debug_tuple("TreePermission::Leaf").field(p).finish(),
            TreePermission::Composite(p) => {
                f.debug_tuple("TreePermission::Composite").field(p).finish()
            }
        }
    }
}
