//! Static permission provider
//!
//! A policy module defined entirely by a [`StaticPolicy`]: a coverage mask,
//! allow/deny entries bound to paths and a set of repository-level grants.
//!
//! Entries are evaluated from the root down to the node. At each level the
//! allowed bits are added and then the denied bits removed, so a deny wins
//! over an allow on the same path while a deeper entry overrides a
//! shallower one. The result is always masked with the coverage.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use super::bits::Permissions;
use super::privilege::{BuiltinPrivileges, PrivilegeBits, PrivilegeBitsProvider};
use super::provider::{AggregatedPermissionProvider, PermissionProvider};
use super::repository_permission::{RepositoryCheck, RepositoryPermission};
use super::tree_permission::{NodePermission, TreePermission};
use crate::error::AccessControlResult;
use crate::path::{self, ROOT_PATH};
use crate::tree::{
    AuthorizationContext, DefaultContext, NodeState, PropertyState, RootProvider, Tree,
    TreeLocation, TreeType,
};

/// Allowed and denied bits bound to one path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicyEntry {
    pub allow: Permissions,
    pub deny: Permissions,
}

/// Immutable policy of a [`StaticPermissionProvider`]
#[derive(Debug, Clone, Default)]
pub struct StaticPolicy {
    covers: Permissions,
    repository: Permissions,
    entries: BTreeMap<String, PolicyEntry>,
}

impl StaticPolicy {
    /// Empty policy with opinions on `covers` only
    pub fn new(covers: Permissions) -> Self {
        Self {
            covers,
            ..Default::default()
        }
    }

    /// Allow `permissions` at `path` and below
    pub fn allow(mut self, path: impl Into<String>, permissions: Permissions) -> Self {
        self.entries.entry(path.into()).or_default().allow |= permissions;
        self
    }

    /// Deny `permissions` at `path` and below
    pub fn deny(mut self, path: impl Into<String>, permissions: Permissions) -> Self {
        self.entries.entry(path.into()).or_default().deny |= permissions;
        self
    }

    /// Grant repository-level `permissions`
    pub fn repository(mut self, permissions: Permissions) -> Self {
        self.repository |= permissions;
        self
    }

    pub fn covers(&self) -> Permissions {
        self.covers
    }

    /// Apply the entry at `path` on top of the bits granted to its parent
    fn apply(&self, path: &str, inherited: Permissions) -> Permissions {
        let granted = match self.entries.get(path) {
            Some(entry) => (inherited | entry.allow) & !entry.deny,
            None => inherited,
        };
        granted & self.covers
    }

    /// Bits granted at `path`, evaluated from the root down
    fn granted_at(&self, absolute_path: &str) -> Permissions {
        let root = self.apply(ROOT_PATH, Permissions::NO_PERMISSION);
        path::elements(absolute_path)
            .scan(ROOT_PATH.to_string(), |current, name| {
                *current = path::concat(current, name);
                Some(current.clone())
            })
            .fold(root, |granted, p| self.apply(&p, granted))
    }

    fn granted_at_repository(&self) -> Permissions {
        self.repository & self.covers
    }

    /// Whether an entry strictly below `path` allows anything covered
    fn grants_below(&self, path: &str) -> bool {
        self.entries
            .iter()
            .any(|(p, e)| path::is_ancestor(path, p) && !(e.allow & self.covers).is_empty())
    }

    /// Whether an entry strictly below `path` denies any of `permissions`
    fn denies_below(&self, path: &str, permissions: Permissions) -> bool {
        self.entries
            .iter()
            .any(|(p, e)| path::is_ancestor(path, p) && e.deny.intersects(permissions))
    }
}

fn is_hidden(absolute_path: &str) -> bool {
    path::elements(absolute_path).any(|name| name.starts_with(':'))
}

/// Permission provider backed by a [`StaticPolicy`]
///
/// Policy changes are staged with [`StaticPermissionProvider::update`] and
/// become visible on the next `refresh()`, together with the current root
/// snapshot.
pub struct StaticPermissionProvider {
    name: String,
    root_provider: Arc<dyn RootProvider>,
    context: Arc<dyn AuthorizationContext>,
    root: RwLock<Tree>,
    policy: RwLock<Arc<StaticPolicy>>,
    staged: Mutex<Option<StaticPolicy>>,
}

impl StaticPermissionProvider {
    pub fn new(
        name: impl Into<String>,
        policy: StaticPolicy,
        root_provider: Arc<dyn RootProvider>,
    ) -> Self {
        let name = name.into();
        tracing::info!(
            "Creating static permission provider '{}' covering {}",
            name,
            policy.covers
        );
        Self {
            name,
            root: RwLock::new(root_provider.read_only_root()),
            root_provider,
            context: Arc::new(DefaultContext),
            policy: RwLock::new(Arc::new(policy)),
            staged: Mutex::new(None),
        }
    }

    /// Use `context` to recognise access-control content in action checks
    pub fn with_context(mut self, context: Arc<dyn AuthorizationContext>) -> Self {
        self.context = context;
        self
    }

    /// Stage a new policy, published by the next `refresh()`
    pub fn update(&self, policy: StaticPolicy) {
        *self.staged.lock().unwrap_or_else(PoisonError::into_inner) = Some(policy);
    }

    fn policy(&self) -> Arc<StaticPolicy> {
        self.policy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn root(&self) -> Tree {
        self.root
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn granted(&self, tree: Option<&Tree>) -> Permissions {
        let policy = self.policy();
        match tree {
            Some(tree) if is_hidden(tree.path()) => Permissions::NO_PERMISSION,
            Some(tree) => policy.granted_at(tree.path()),
            None => policy.granted_at_repository(),
        }
    }
}

impl PermissionProvider for StaticPermissionProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn refresh(&self) -> AccessControlResult<()> {
        *self.root.write().unwrap_or_else(PoisonError::into_inner) =
            self.root_provider.read_only_root();

        if let Some(policy) = self
            .staged
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            tracing::debug!("Publishing staged policy for '{}'", self.name);
            *self.policy.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(policy);
        }
        Ok(())
    }

    fn privileges(&self, tree: Option<&Tree>) -> BTreeSet<String> {
        BuiltinPrivileges.names(PrivilegeBits::from_permissions(self.granted(tree)))
    }

    fn has_privileges(&self, tree: Option<&Tree>, privilege_names: &[&str]) -> AccessControlResult<bool> {
        let requested = BuiltinPrivileges.bits(privilege_names)?;
        let granted = PrivilegeBits::from_permissions(self.granted(tree));
        Ok(granted.contains(requested))
    }

    fn repository_permission(&self) -> RepositoryPermission {
        RepositoryPermission::Leaf(Arc::new(StaticRepositoryPermission {
            granted: self.policy().granted_at_repository(),
        }))
    }

    fn tree_permission(&self, tree: &Tree, parent: &TreePermission) -> TreePermission {
        let tree_type = if is_hidden(tree.path()) {
            TreeType::Hidden
        } else {
            TreeType::Default
        };
        self.tree_permission_typed(tree, tree_type, parent)
    }

    fn is_granted(&self, tree: &Tree, _property: Option<&PropertyState>, permissions: Permissions) -> bool {
        !permissions.is_empty() && self.granted(Some(tree)).contains(permissions)
    }

    fn is_granted_path(&self, path: &str, actions: &str) -> AccessControlResult<bool> {
        let location = TreeLocation::resolve(&self.root(), path);
        let is_ac = self.context.defines_location(&location);
        let permissions = Permissions::from_actions(actions, &location, is_ac)?;
        Ok(self.is_granted_at(&location, permissions))
    }
}

impl AggregatedPermissionProvider for StaticPermissionProvider {
    fn supported_privileges(&self, _tree: Option<&Tree>, privileges: Option<PrivilegeBits>) -> PrivilegeBits {
        let supported = PrivilegeBits::from_permissions(self.policy().covers);
        match privileges {
            Some(requested) => requested & supported,
            None => supported,
        }
    }

    fn supported_permissions(
        &self,
        _tree: Option<&Tree>,
        _property: Option<&PropertyState>,
        permissions: Permissions,
    ) -> Permissions {
        permissions & self.policy().covers
    }

    fn supported_permissions_at(&self, _location: &TreeLocation, permissions: Permissions) -> Permissions {
        permissions & self.policy().covers
    }

    fn supported_permissions_for(
        &self,
        _tree_permission: &TreePermission,
        _property: Option<&PropertyState>,
        permissions: Permissions,
    ) -> Permissions {
        permissions & self.policy().covers
    }

    fn is_granted_at(&self, location: &TreeLocation, permissions: Permissions) -> bool {
        let node_path = location.node_path();
        !permissions.is_empty()
            && !is_hidden(&node_path)
            && self.policy().granted_at(&node_path).contains(permissions)
    }

    fn tree_permission_typed(&self, tree: &Tree, tree_type: TreeType, _parent: &TreePermission) -> TreePermission {
        if tree_type == TreeType::Hidden {
            return TreePermission::Empty;
        }
        let policy = self.policy();
        let granted = policy.granted_at(tree.path());
        StaticTreePermission::create(policy, tree.path().to_string(), granted)
    }
}

/// Per-node decision of a [`StaticPermissionProvider`]
#[derive(Debug)]
pub struct StaticTreePermission {
    policy: Arc<StaticPolicy>,
    path: String,
    granted: Permissions,
}

impl StaticTreePermission {
    fn create(policy: Arc<StaticPolicy>, path: String, granted: Permissions) -> TreePermission {
        if granted.is_empty() && !policy.grants_below(&path) {
            return TreePermission::NoRecourse;
        }
        TreePermission::leaf(StaticTreePermission {
            policy,
            path,
            granted,
        })
    }
}

impl NodePermission for StaticTreePermission {
    fn child_permission(&self, name: &str, _child_state: &NodeState) -> TreePermission {
        if name.starts_with(':') {
            return TreePermission::Empty;
        }
        let child_path = path::concat(&self.path, name);
        let granted = self.policy.apply(&child_path, self.granted);
        StaticTreePermission::create(self.policy.clone(), child_path, granted)
    }

    fn can_read(&self) -> bool {
        self.granted.contains(Permissions::READ_NODE)
    }

    fn can_read_property(&self, _property: &PropertyState) -> bool {
        self.granted.contains(Permissions::READ_PROPERTY)
    }

    fn can_read_all(&self) -> bool {
        self.granted.contains(Permissions::READ)
            && !self.policy.denies_below(&self.path, Permissions::READ)
    }

    fn can_read_properties(&self) -> bool {
        self.granted.contains(Permissions::READ_PROPERTY)
    }

    fn is_granted(&self, permissions: Permissions) -> bool {
        !permissions.is_empty() && self.granted.contains(permissions)
    }

    fn is_granted_property(&self, permissions: Permissions, _property: &PropertyState) -> bool {
        self.is_granted(permissions)
    }
}

/// Repository-level decision of a [`StaticPermissionProvider`]
#[derive(Debug)]
struct StaticRepositoryPermission {
    granted: Permissions,
}

impl RepositoryCheck for StaticRepositoryPermission {
    fn is_granted(&self, permissions: Permissions) -> bool {
        !permissions.is_empty() && self.granted.contains(permissions)
    }
}
