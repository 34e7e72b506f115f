//! Path-addressed views onto node states

use serde::{Deserialize, Serialize};

use super::node::{NodeState, PropertyState};
use crate::path::{self, ROOT_PATH};

/// A node state bound to its absolute path
#[derive(Debug, Clone)]
pub struct Tree {
    path: String,
    state: NodeState,
}

impl Tree {
    /// Tree for the root node
    pub fn root(state: NodeState) -> Self {
        Self {
            path: ROOT_PATH.to_string(),
            state,
        }
    }

    /// Tree at `path` with an already resolved state
    pub fn with_state(path: impl Into<String>, state: NodeState) -> Self {
        Self {
            path: path.into(),
            state,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Name of the node, empty for the root
    pub fn name(&self) -> &str {
        path::name(&self.path)
    }

    pub fn is_root(&self) -> bool {
        path::is_root(&self.path)
    }

    pub fn exists(&self) -> bool {
        self.state.exists()
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub fn property(&self, name: &str) -> Option<&PropertyState> {
        self.state.property(name)
    }

    /// Child tree, which may not exist
    pub fn child(&self, name: &str) -> Tree {
        Tree {
            path: path::concat(&self.path, name),
            state: self.state.child(name),
        }
    }

    /// Descendant at a path relative to this tree
    pub fn descendant(&self, relative_path: &str) -> Tree {
        path::elements(relative_path).fold(self.clone(), |tree, name| tree.child(name))
    }
}

/// An arbitrary path resolved against a root tree
#[derive(Debug, Clone)]
pub enum TreeLocation {
    /// An existing node
    Node(Tree),
    /// An existing property of an existing node
    Property { parent: Tree, property: PropertyState },
    /// Neither a node nor a property exists at this path
    NonExisting { path: String },
}

impl TreeLocation {
    /// Resolve an absolute `path` starting from `root`
    pub fn resolve(root: &Tree, absolute_path: &str) -> Self {
        let tree = root.descendant(absolute_path);
        if tree.exists() {
            return TreeLocation::Node(tree);
        }

        if let Some(parent_path) = path::parent(absolute_path) {
            let parent = root.descendant(parent_path);
            if let Some(property) = parent.property(path::name(absolute_path)).cloned() {
                return TreeLocation::Property { parent, property };
            }
        }

        TreeLocation::NonExisting {
            path: absolute_path.to_string(),
        }
    }

    /// Absolute path of this location
    pub fn path(&self) -> String {
        match self {
            TreeLocation::Node(tree) => tree.path().to_string(),
            TreeLocation::Property { parent, property } => {
                path::concat(parent.path(), property.name())
            }
            TreeLocation::NonExisting { path } => path.clone(),
        }
    }

    pub fn exists(&self) -> bool {
        !matches!(self, TreeLocation::NonExisting { .. })
    }

    /// The node for node locations, the parent node for property locations
    pub fn tree(&self) -> Option<&Tree> {
        match self {
            TreeLocation::Node(tree) => Some(tree),
            TreeLocation::Property { parent, .. } => Some(parent),
            TreeLocation::NonExisting { .. } => None,
        }
    }

    pub fn property(&self) -> Option<&PropertyState> {
        match self {
            TreeLocation::Property { property, .. } => Some(property),
            _ => None,
        }
    }

    /// Path of the node whose policy applies to this location
    pub fn node_path(&self) -> String {
        match self {
            TreeLocation::Node(tree) => tree.path().to_string(),
            TreeLocation::Property { parent, .. } => parent.path().to_string(),
            TreeLocation::NonExisting { path } => path.clone(),
        }
    }
}

/// Classification of a tree for permission evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeType {
    /// Regular content
    #[default]
    Default,
    /// Access-control content (policies and entries)
    AccessControl,
    /// Version storage
    Version,
    /// Repository internal content, e.g. the permission store
    Internal,
    /// Hidden items, never exposed
    Hidden,
}
