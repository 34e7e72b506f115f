//! Composite per-node permission decisions

use std::fmt;
use std::sync::{Arc, OnceLock};

use super::fold::CompositionType;
use crate::path;
use crate::permission::{AggregatedPermissionProvider, Permissions, TreePermission};
use crate::tree::{NodeState, PropertyState, Tree, TreeProvider, TreeType};

/// Folded decision of several providers for one node
///
/// Holds one decision per provider, in provider order. Children are derived
/// in lockstep: each provider derives its child decision from its own
/// decision for this node. Read checks are folded once and cached.
pub struct CompositeTreePermission {
    tree: Tree,
    tree_type: TreeType,
    providers: Arc<[Arc<dyn AggregatedPermissionProvider>]>,
    tree_provider: Arc<dyn TreeProvider>,
    permissions: Vec<TreePermission>,
    composition: CompositionType,
    can_read: OnceLock<bool>,
    can_read_all: OnceLock<bool>,
    can_read_properties: OnceLock<bool>,
}

impl CompositeTreePermission {
    /// Decision for the root tree; no parent decision is consulted
    pub fn root(
        root: Tree,
        providers: Arc<[Arc<dyn AggregatedPermissionProvider>]>,
        tree_provider: Arc<dyn TreeProvider>,
        composition: CompositionType,
    ) -> TreePermission {
        if providers.is_empty() {
            return TreePermission::Empty;
        }

        let permissions = providers
            .iter()
            .map(|provider| provider.tree_permission_typed(&root, TreeType::Default, &TreePermission::Empty))
            .collect();

        TreePermission::Composite(Arc::new(Self::new(
            root,
            TreeType::Default,
            providers,
            tree_provider,
            permissions,
            composition,
        )))
    }

    /// Decision for `tree` derived from the decision for its parent
    pub fn child(tree: Tree, parent: &CompositeTreePermission) -> TreePermission {
        let tree_type = parent.tree_provider.tree_type(&tree, parent.tree_type);

        let permissions: Vec<TreePermission> = parent
            .providers
            .iter()
            .zip(&parent.permissions)
            .map(|(provider, parent_permission)| match parent_permission {
                TreePermission::NoRecourse => TreePermission::NoRecourse,
                _ => provider.tree_permission_typed(&tree, tree_type, parent_permission),
            })
            .collect();

        let grants_nothing = permissions
            .iter()
            .all(|tp| matches!(tp, TreePermission::Empty | TreePermission::NoRecourse));
        if grants_nothing {
            return TreePermission::Empty;
        }

        TreePermission::Composite(Arc::new(Self::new(
            tree,
            tree_type,
            parent.providers.clone(),
            parent.tree_provider.clone(),
            permissions,
            parent.composition,
        )))
    }

    fn new(
        tree: Tree,
        tree_type: TreeType,
        providers: Arc<[Arc<dyn AggregatedPermissionProvider>]>,
        tree_provider: Arc<dyn TreeProvider>,
        permissions: Vec<TreePermission>,
        composition: CompositionType,
    ) -> Self {
        Self {
            tree,
            tree_type,
            providers,
            tree_provider,
            permissions,
            composition,
            can_read: OnceLock::new(),
            can_read_all: OnceLock::new(),
            can_read_properties: OnceLock::new(),
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_type(&self) -> TreeType {
        self.tree_type
    }

    pub fn composition(&self) -> CompositionType {
        self.composition
    }

    /// Per-provider decisions, in provider order
    pub fn permissions(&self) -> &[TreePermission] {
        &self.permissions
    }

    pub(crate) fn providers(&self) -> &[Arc<dyn AggregatedPermissionProvider>] {
        &self.providers
    }

    pub fn child_permission(&self, name: &str, child_state: &NodeState) -> TreePermission {
        let child = Tree::with_state(path::concat(self.tree.path(), name), child_state.clone());
        Self::child(child, self)
    }

    pub fn can_read(&self) -> bool {
        *self
            .can_read
            .get_or_init(|| self.fold(Permissions::READ_NODE, None, |tp, _| tp.can_read()))
    }

    pub fn can_read_property(&self, property: &PropertyState) -> bool {
        self.can_read_properties()
            || self.fold(Permissions::READ_PROPERTY, Some(property), |tp, _| {
                tp.can_read_property(property)
            })
    }

    pub fn can_read_all(&self) -> bool {
        *self
            .can_read_all
            .get_or_init(|| self.fold(Permissions::READ, None, |tp, _| tp.can_read_all()))
    }

    pub fn can_read_properties(&self) -> bool {
        *self.can_read_properties.get_or_init(|| {
            self.fold(Permissions::READ_PROPERTY, None, |tp, _| tp.can_read_properties())
        })
    }

    pub fn is_granted(&self, permissions: Permissions) -> bool {
        self.fold(permissions, None, |tp, bits| tp.is_granted(bits))
    }

    pub fn is_granted_property(&self, permissions: Permissions, property: &PropertyState) -> bool {
        self.fold(permissions, Some(property), |tp, bits| {
            tp.is_granted_property(bits, property)
        })
    }

    fn fold<G>(&self, requested: Permissions, property: Option<&PropertyState>, granted: G) -> bool
    where
        G: Fn(&TreePermission, Permissions) -> bool,
    {
        self.composition.grants(
            requested,
            self.providers.iter().zip(&self.permissions),
            |&(provider, tp), bits| provider.supported_permissions_for(tp, property, bits),
            |&(_, tp), bits| granted(tp, bits),
        )
    }
}

impl fmt::Debug for CompositeTreePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeTreePermission")
            .field("path", &self.tree.path())
            .field("tree_type", &self.tree_type)
            .field("composition", &self.composition)
            .field("permissions", &self.permissions)
            .finish()
    }
}
