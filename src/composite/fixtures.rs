//! Shared test fixtures for the composite layer

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::fold::CompositionType;
use super::provider::CompositePermissionProvider;
use crate::error::{AccessControlError, AccessControlResult};
use crate::permission::{
    AggregatedPermissionProvider, BuiltinPrivileges, NodePermission, PermissionProvider,
    Permissions, PrivilegeBits, PrivilegeBitsProvider, RepositoryCheck, RepositoryPermission,
    TreePermission,
};
use crate::tree::{
    DefaultContext, DefaultTreeProvider, NodeState, PropertyState, SnapshotRootProvider, Tree,
    TreeLocation, TreeType,
};

pub const TEST_PATHS: &[&str] = &[
    "/test",
    "/test/child",
    "/test/a",
    "/test/a/b",
    "/test/a/b/c",
    "/test/a/b2",
    "/test2",
];

pub fn content_root() -> NodeState {
    let mut builder = NodeState::builder();
    for path in TEST_PATHS {
        builder.add_path(path);
    }
    builder.build()
}

pub fn root_tree() -> Tree {
    Tree::root(content_root())
}

pub fn root_provider() -> Arc<SnapshotRootProvider> {
    Arc::new(SnapshotRootProvider::new(content_root()))
}

/// Composite over `providers` bound to the shared content tree
pub fn composite(
    composition: CompositionType,
    providers: Vec<Arc<dyn AggregatedPermissionProvider>>,
) -> CompositePermissionProvider {
    CompositePermissionProvider::new(
        providers,
        Arc::new(DefaultContext),
        composition,
        root_provider(),
        Arc::new(DefaultTreeProvider::default()),
    )
}

/// L1 covers READ and grants it, L2 covers WRITE and denies it, L3 covers
/// nothing
pub fn scenario_leaves() -> Vec<Arc<dyn AggregatedPermissionProvider>> {
    vec![
        Arc::new(RecordingProvider::new("L1", Permissions::READ, Permissions::READ)),
        Arc::new(RecordingProvider::new("L2", Permissions::WRITE, Permissions::NO_PERMISSION)),
        Arc::new(RecordingProvider::new(
            "L3",
            Permissions::NO_PERMISSION,
            Permissions::NO_PERMISSION,
        )),
    ]
}

/// Every ordering of `items`
pub fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut result = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let first = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, first.clone());
            result.push(tail);
        }
    }
    result
}

/// Leaf with uniform coverage and grants that records every tree
/// permission it is asked to build
pub struct RecordingProvider {
    name: String,
    covers: Permissions,
    granted: Permissions,
    no_recourse: bool,
    refresh_error: Option<String>,
    calls: Mutex<Vec<(String, TreeType)>>,
    refreshes: AtomicUsize,
}

impl RecordingProvider {
    pub fn new(name: &str, covers: Permissions, granted: Permissions) -> Self {
        Self {
            name: name.to_string(),
            covers,
            granted,
            no_recourse: false,
            refresh_error: None,
            calls: Mutex::new(Vec::new()),
            refreshes: AtomicUsize::new(0),
        }
    }

    /// Answer every tree permission request with `NoRecourse`
    pub fn no_recourse(mut self) -> Self {
        self.no_recourse = true;
        self
    }

    /// Fail every refresh with `reason`
    pub fn failing_refresh(mut self, reason: &str) -> Self {
        self.refresh_error = Some(reason.to_string());
        self
    }

    /// Paths of the tree permissions built so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn tree_types(&self) -> Vec<TreeType> {
        self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    fn effective(&self) -> Permissions {
        self.granted & self.covers
    }
}

impl PermissionProvider for RecordingProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn refresh(&self) -> AccessControlResult<()> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        match &self.refresh_error {
            Some(reason) => Err(AccessControlError::other(reason.clone())),
            None => Ok(()),
        }
    }

    fn privileges(&self, _tree: Option<&Tree>) -> BTreeSet<String> {
        BuiltinPrivileges.names(PrivilegeBits::from_permissions(self.effective()))
    }

    fn has_privileges(&self, _tree: Option<&Tree>, privilege_names: &[&str]) -> AccessControlResult<bool> {
        let requested = BuiltinPrivileges.bits(privilege_names)?;
        Ok(PrivilegeBits::from_permissions(self.effective()).contains(requested))
    }

    fn repository_permission(&self) -> RepositoryPermission {
        RepositoryPermission::Leaf(Arc::new(FixedPermission(self.effective())))
    }

    fn tree_permission(&self, tree: &Tree, parent: &TreePermission) -> TreePermission {
        self.tree_permission_typed(tree, TreeType::Default, parent)
    }

    fn is_granted(&self, _tree: &Tree, _property: Option<&PropertyState>, permissions: Permissions) -> bool {
        !permissions.is_empty() && self.effective().contains(permissions)
    }

    fn is_granted_path(&self, _path: &str, _actions: &str) -> AccessControlResult<bool> {
        Ok(false)
    }
}

impl AggregatedPermissionProvider for RecordingProvider {
    fn supported_privileges(&self, _tree: Option<&Tree>, privileges: Option<PrivilegeBits>) -> PrivilegeBits {
        let supported = PrivilegeBits::from_permissions(self.covers);
        privileges.map_or(supported, |requested| requested & supported)
    }

    fn supported_permissions(
        &self,
        _tree: Option<&Tree>,
        _property: Option<&PropertyState>,
        permissions: Permissions,
    ) -> Permissions {
        permissions & self.covers
    }

    fn supported_permissions_at(&self, _location: &TreeLocation, permissions: Permissions) -> Permissions {
        permissions & self.covers
    }

    fn supported_permissions_for(
        &self,
        _tree_permission: &TreePermission,
        _property: Option<&PropertyState>,
        permissions: Permissions,
    ) -> Permissions {
        permissions & self.covers
    }

    fn is_granted_at(&self, _location: &TreeLocation, permissions: Permissions) -> bool {
        !permissions.is_empty() && self.effective().contains(permissions)
    }

    fn tree_permission_typed(&self, tree: &Tree, tree_type: TreeType, _parent: &TreePermission) -> TreePermission {
        self.calls
            .lock()
            .unwrap()
            .push((tree.path().to_string(), tree_type));
        if self.no_recourse {
            TreePermission::NoRecourse
        } else {
            TreePermission::leaf(FixedPermission(self.effective()))
        }
    }
}

/// Decision object granting the same bits everywhere
#[derive(Debug)]
pub struct FixedPermission(pub Permissions);

impl NodePermission for FixedPermission {
    fn child_permission(&self, _name: &str, _child_state: &NodeState) -> TreePermission {
        TreePermission::leaf(FixedPermission(self.0))
    }

    fn can_read(&self) -> bool {
        self.0.contains(Permissions::READ_NODE)
    }

    fn can_read_property(&self, _property: &PropertyState) -> bool {
        self.0.contains(Permissions::READ_PROPERTY)
    }

    fn can_read_all(&self) -> bool {
        self.0.contains(Permissions::READ)
    }

    fn can_read_properties(&self) -> bool {
        self.0.contains(Permissions::READ_PROPERTY)
    }

    fn is_granted(&self, permissions: Permissions) -> bool {
        !permissions.is_empty() && self.0.contains(permissions)
    }

    fn is_granted_property(&self, permissions: Permissions, _property: &PropertyState) -> bool {
        NodePermission::is_granted(self, permissions)
    }
}

impl RepositoryCheck for FixedPermission {
    fn is_granted(&self, permissions: Permissions) -> bool {
        !permissions.is_empty() && self.0.contains(permissions)
    }
}
