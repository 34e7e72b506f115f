//! Permission provider contracts
//!
//! A [`PermissionProvider`] is one policy module's verdict engine. Providers
//! that take part in composition implement [`AggregatedPermissionProvider`]
//! as well, which adds the coverage queries: the subset of requested
//! permissions or privileges the provider has an opinion about. Bits outside
//! a provider's coverage are abstained, not denied.

use std::collections::BTreeSet;

use super::bits::Permissions;
use super::privilege::PrivilegeBits;
use super::repository_permission::RepositoryPermission;
use super::tree_permission::TreePermission;
use crate::error::AccessControlResult;
use crate::tree::{PropertyState, Tree, TreeLocation, TreeType};

/// Verdict engine of a single policy module
///
/// Instances are scoped to one authorization session. They observe a fixed
/// snapshot until [`PermissionProvider::refresh`] is called; callers must not
/// query a provider concurrently with its refresh.
pub trait PermissionProvider: Send + Sync {
    /// Provider name for logging and debugging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Re-read the underlying policy and content snapshot
    fn refresh(&self) -> AccessControlResult<()> {
        Ok(())
    }

    /// Names of the privileges granted on `tree` (`None`: repository level)
    fn privileges(&self, tree: Option<&Tree>) -> BTreeSet<String>;

    /// Whether all named privileges are granted on `tree` (`None`:
    /// repository level). No names at all is trivially granted.
    fn has_privileges(&self, tree: Option<&Tree>, privilege_names: &[&str]) -> AccessControlResult<bool>;

    /// Decision object for repository-level operations
    fn repository_permission(&self) -> RepositoryPermission;

    /// Decision object for `tree`, derived from the decision of its parent
    fn tree_permission(&self, tree: &Tree, parent: &TreePermission) -> TreePermission;

    /// Whether all of `permissions` are granted on `tree` or on its property
    fn is_granted(&self, tree: &Tree, property: Option<&PropertyState>, permissions: Permissions) -> bool;

    /// Whether the comma separated `actions` are granted at `path`
    fn is_granted_path(&self, path: &str, actions: &str) -> AccessControlResult<bool>;
}

/// Permission provider that reports its coverage
pub trait AggregatedPermissionProvider: PermissionProvider {
    /// Subset of `privileges` this provider evaluates on `tree`; with
    /// `None`, every privilege it evaluates there
    fn supported_privileges(&self, tree: Option<&Tree>, privileges: Option<PrivilegeBits>) -> PrivilegeBits;

    /// Subset of `permissions` this provider evaluates on `tree` or its
    /// property (`None` tree: repository level)
    fn supported_permissions(
        &self,
        tree: Option<&Tree>,
        property: Option<&PropertyState>,
        permissions: Permissions,
    ) -> Permissions;

    /// Subset of `permissions` this provider evaluates at `location`
    fn supported_permissions_at(&self, location: &TreeLocation, permissions: Permissions) -> Permissions;

    /// Subset of `permissions` this provider evaluates for a decision
    /// object it created
    fn supported_permissions_for(
        &self,
        tree_permission: &TreePermission,
        property: Option<&PropertyState>,
        permissions: Permissions,
    ) -> Permissions;

    /// Whether all of `permissions` are granted at `location`
    fn is_granted_at(&self, location: &TreeLocation, permissions: Permissions) -> bool;

    /// Decision object for `tree` of the given type, derived from this
    /// provider's own decision for the parent
    fn tree_permission_typed(&self, tree: &Tree, tree_type: TreeType, parent: &TreePermission) -> TreePermission;
}

/// Provider that grants nothing and supports nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyPermissionProvider;

impl PermissionProvider for EmptyPermissionProvider {
    fn name(&self) -> &str {
        "empty"
    }

    fn privileges(&self, _tree: Option<&Tree>) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn has_privileges(&self, _tree: Option<&Tree>, _privilege_names: &[&str]) -> AccessControlResult<bool> {
        Ok(false)
    }

    fn repository_permission(&self) -> RepositoryPermission {
        RepositoryPermission::Empty
    }

    fn tree_permission(&self, _tree: &Tree, _parent: &TreePermission) -> TreePermission {
        TreePermission::Empty
    }

    fn is_granted(&self, _tree: &Tree, _property: Option<&PropertyState>, _permissions: Permissions) -> bool {
        false
    }

    fn is_granted_path(&self, _path: &str, _actions: &str) -> AccessControlResult<bool> {
        Ok(false)
    }
}

impl AggregatedPermissionProvider for EmptyPermissionProvider {
    fn supported_privileges(&self, _tree: Option<&Tree>, _privileges: Option<PrivilegeBits>) -> PrivilegeBits {
        PrivilegeBits::empty()
    }

    fn supported_permissions(
        &self,
        _tree: Option<&Tree>,
        _property: Option<&PropertyState>,
        _permissions: Permissions,
    ) -> Permissions {
        Permissions::NO_PERMISSION
    }

    fn supported_permissions_at(&self, _location: &TreeLocation, _permissions: Permissions) -> Permissions {
        Permissions::NO_PERMISSION
    }

    fn supported_permissions_for(
        &self,
        _tree_permission: &TreePermission,
        _property: Option<&PropertyState>,
        _permissions: Permissions,
    ) -> Permissions {
        Permissions::NO_PERMISSION
    }

    fn is_granted_at(&self, _location: &TreeLocation, _permissions: Permissions) -> bool {
        false
    }

    fn tree_permission_typed(&self, _tree: &Tree, _tree_type: TreeType, _parent: &TreePermission) -> TreePermission {
        TreePermission::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeState;

    #[test]
    fn test_empty_provider_grants_nothing() {
        let root = Tree::root(NodeState::builder().build());
        let provider = EmptyPermissionProvider;

        assert!(!provider.is_granted(&root, None, Permissions::READ));
        assert!(!provider.is_granted_path("/", "read").unwrap());
        assert!(!provider.has_privileges(None, &[]).unwrap());
        assert!(provider.privileges(Some(&root)).is_empty());
        assert!(!provider.repository_permission().is_granted(Permissions::NAMESPACE_MANAGEMENT));
        assert!(matches!(
            provider.tree_permission(&root, &TreePermission::Empty),
            TreePermission::Empty
        ));
        assert!(provider
            .supported_permissions(Some(&root), None, Permissions::ALL)
            .is_empty());
    }
}
