//! Composite permission provider
//!
//! Aggregates several [`AggregatedPermissionProvider`]s into one. Every
//! check is translated to permission or privilege bits once and folded
//! across the providers with the configured [`CompositionType`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use composite_authz::composite::{CompositePermissionProvider, CompositionType};
//! use composite_authz::permission::{
//!     AggregatedPermissionProvider, PermissionProvider, Permissions, StaticPermissionProvider,
//!     StaticPolicy,
//! };
//! use composite_authz::tree::{DefaultContext, DefaultTreeProvider, NodeState, SnapshotRootProvider};
//!
//! let mut content = NodeState::builder();
//! content.add_path("/content");
//! let roots = Arc::new(SnapshotRootProvider::new(content.build()));
//!
//! let readers = StaticPolicy::new(Permissions::READ).allow("/", Permissions::READ);
//! let versions = StaticPolicy::new(Permissions::VERSION_MANAGEMENT);
//! let providers: Vec<Arc<dyn AggregatedPermissionProvider>> = vec![
//!     Arc::new(StaticPermissionProvider::new("readers", readers, roots.clone())),
//!     Arc::new(StaticPermissionProvider::new("versions", versions, roots.clone())),
//! ];
//!
//! let provider = CompositePermissionProvider::new(
//!     providers,
//!     Arc::new(DefaultContext),
//!     CompositionType::And,
//!     roots,
//!     Arc::new(DefaultTreeProvider::default()),
//! );
//! assert!(provider.is_granted_path("/content", "read").unwrap());
//! assert!(!provider.is_granted_path("/content", "versioning").unwrap());
//! ```

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

use super::fold::CompositionType;
use super::repository_permission::CompositeRepositoryPermission;
use super::tree_permission::CompositeTreePermission;
use crate::error::{AccessControlError, AccessControlResult};
use crate::permission::{
    AggregatedPermissionProvider, BuiltinPrivileges, EmptyPermissionProvider, PermissionProvider,
    Permissions, PrivilegeBits, PrivilegeBitsProvider, RepositoryPermission, TreePermission,
};
use crate::tree::{
    AuthorizationContext, PropertyState, RootProvider, Tree, TreeLocation, TreeProvider, TreeType,
};

/// Permission provider folding the verdicts of several leaf providers
pub struct CompositePermissionProvider {
    root: RwLock<Tree>,
    providers: Arc<[Arc<dyn AggregatedPermissionProvider>]>,
    context: Arc<dyn AuthorizationContext>,
    composition: CompositionType,
    root_provider: Arc<dyn RootProvider>,
    tree_provider: Arc<dyn TreeProvider>,
    privilege_bits: Arc<dyn PrivilegeBitsProvider>,
}

impl CompositePermissionProvider {
    pub fn new(
        providers: Vec<Arc<dyn AggregatedPermissionProvider>>,
        context: Arc<dyn AuthorizationContext>,
        composition: CompositionType,
        root_provider: Arc<dyn RootProvider>,
        tree_provider: Arc<dyn TreeProvider>,
    ) -> Self {
        tracing::info!(
            "Creating composite permission provider ({:?}) over {} providers",
            composition,
            providers.len()
        );
        Self {
            root: RwLock::new(root_provider.read_only_root()),
            providers: providers.into(),
            context,
            composition,
            root_provider,
            tree_provider,
            privilege_bits: Arc::new(BuiltinPrivileges),
        }
    }

    /// Composite granting only what no covering provider denies
    pub fn and(
        providers: Vec<Arc<dyn AggregatedPermissionProvider>>,
        context: Arc<dyn AuthorizationContext>,
        root_provider: Arc<dyn RootProvider>,
        tree_provider: Arc<dyn TreeProvider>,
    ) -> Self {
        Self::new(providers, context, CompositionType::And, root_provider, tree_provider)
    }

    /// Composite granting what any covering provider grants
    pub fn or(
        providers: Vec<Arc<dyn AggregatedPermissionProvider>>,
        context: Arc<dyn AuthorizationContext>,
        root_provider: Arc<dyn RootProvider>,
        tree_provider: Arc<dyn TreeProvider>,
    ) -> Self {
        Self::new(providers, context, CompositionType::Or, root_provider, tree_provider)
    }

    /// Provider for `providers`: the empty provider for none, the provider
    /// itself for exactly one, a composite otherwise
    pub fn new_instance(
        mut providers: Vec<Arc<dyn AggregatedPermissionProvider>>,
        context: Arc<dyn AuthorizationContext>,
        composition: CompositionType,
        root_provider: Arc<dyn RootProvider>,
        tree_provider: Arc<dyn TreeProvider>,
    ) -> Arc<dyn AggregatedPermissionProvider> {
        match providers.len() {
            0 => {
                tracing::debug!("No permission providers, using the empty provider");
                Arc::new(EmptyPermissionProvider)
            }
            1 => {
                let provider = providers.remove(0);
                tracing::debug!("Single permission provider '{}', no composite needed", provider.name());
                provider
            }
            _ => Arc::new(Self::new(
                providers,
                context,
                composition,
                root_provider,
                tree_provider,
            )),
        }
    }

    /// Translate privilege names with `privilege_bits` instead of the
    /// built-in catalogue
    pub fn with_privilege_bits(mut self, privilege_bits: Arc<dyn PrivilegeBitsProvider>) -> Self {
        self.privilege_bits = privilege_bits;
        self
    }

    pub fn composition(&self) -> CompositionType {
        self.composition
    }

    pub fn providers(&self) -> &[Arc<dyn AggregatedPermissionProvider>] {
        &self.providers
    }

    /// Root of the snapshot read at construction or the last refresh
    pub fn root(&self) -> Tree {
        self.root
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn fold_permissions<S, G>(&self, requested: Permissions, supported: S, granted: G) -> bool
    where
        S: Fn(&Arc<dyn AggregatedPermissionProvider>, Permissions) -> Permissions,
        G: Fn(&Arc<dyn AggregatedPermissionProvider>, Permissions) -> bool,
    {
        self.composition.grants(
            requested,
            self.providers.iter(),
            |&provider, bits| supported(provider, bits),
            |&provider, bits| granted(provider, bits),
        )
    }
}

impl PermissionProvider for CompositePermissionProvider {
    fn name(&self) -> &str {
        match self.composition {
            CompositionType::And => "composite-and",
            CompositionType::Or => "composite-or",
        }
    }

    fn refresh(&self) -> AccessControlResult<()> {
        tracing::info!(
            "Refreshing {} permission providers",
            self.providers.len()
        );
        *self.root.write().unwrap_or_else(PoisonError::into_inner) =
            self.root_provider.read_only_root();

        let mut failures: Vec<AccessControlError> = self
            .providers
            .iter()
            .filter_map(|provider| match provider.refresh() {
                Ok(()) => None,
                Err(e) => {
                    tracing::warn!("Permission provider '{}' failed to refresh: {}", provider.name(), e);
                    Some(AccessControlError::RefreshFailed {
                        provider: provider.name().to_string(),
                        reason: e.to_string(),
                    })
                }
            })
            .collect();

        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            _ => Err(AccessControlError::Refresh(failures)),
        }
    }

    /// Privileges granted at `tree` after folding every leaf
    ///
    /// Names a leaf reports are translated with the configured
    /// [`PrivilegeBitsProvider`]. If any of them is unknown the leaf counts
    /// as granting nothing, so under AND everything it covers is withheld.
    fn privileges(&self, tree: Option<&Tree>) -> BTreeSet<String> {
        let mut granted = PrivilegeBits::empty();
        let mut denied = PrivilegeBits::empty();

        for provider in self.providers.iter() {
            let supported = provider.supported_privileges(tree, None);
            if supported.is_empty() {
                continue;
            }

            let names = provider.privileges(tree);
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            let provider_granted = match self.privilege_bits.bits(&names) {
                Ok(bits) => bits & supported,
                Err(e) => {
                    tracing::warn!("Ignoring privileges of '{}': {}", provider.name(), e);
                    PrivilegeBits::empty()
                }
            };

            granted |= provider_granted;
            if self.composition == CompositionType::And {
                denied |= supported & !provider_granted;
            }
        }

        self.privilege_bits.names(granted & !denied)
    }

    fn has_privileges(&self, tree: Option<&Tree>, privilege_names: &[&str]) -> AccessControlResult<bool> {
        let requested = self.privilege_bits.bits(privilege_names)?;
        if requested.is_empty() {
            return Ok(true);
        }

        self.composition.try_grants(
            requested,
            self.providers.iter(),
            |provider, bits| provider.supported_privileges(tree, Some(bits)),
            |provider, bits| {
                let names = self.privilege_bits.names(bits);
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                provider.has_privileges(tree, &names)
            },
        )
    }

    fn repository_permission(&self) -> RepositoryPermission {
        RepositoryPermission::Composite(CompositeRepositoryPermission::new(
            self.providers.clone(),
            self.composition,
        ))
    }

    fn tree_permission(&self, tree: &Tree, parent: &TreePermission) -> TreePermission {
        let tree = self.root().descendant(tree.path());
        if tree.is_root() {
            return CompositeTreePermission::root(
                tree,
                self.providers.clone(),
                self.tree_provider.clone(),
                self.composition,
            );
        }

        match parent {
            TreePermission::Composite(parent) => CompositeTreePermission::child(tree, parent),
            other => other.child_permission(tree.name(), tree.state()),
        }
    }

    fn is_granted(&self, tree: &Tree, property: Option<&PropertyState>, permissions: Permissions) -> bool {
        let tree = self.root().descendant(tree.path());
        self.fold_permissions(
            permissions,
            |provider, bits| provider.supported_permissions(Some(&tree), property, bits),
            |provider, bits| provider.is_granted(&tree, property, bits),
        )
    }

    fn is_granted_path(&self, path: &str, actions: &str) -> AccessControlResult<bool> {
        let location = TreeLocation::resolve(&self.root(), path);
        let is_access_control = self.context.defines_location(&location);
        let permissions = Permissions::from_actions(actions, &location, is_access_control)?;
        Ok(self.is_granted_at(&location, permissions))
    }
}

impl AggregatedPermissionProvider for CompositePermissionProvider {
    fn supported_privileges(&self, tree: Option<&Tree>, privileges: Option<PrivilegeBits>) -> PrivilegeBits {
        self.providers
            .iter()
            .fold(PrivilegeBits::empty(), |acc, provider| {
                acc | provider.supported_privileges(tree, privileges)
            })
    }

    fn supported_permissions(
        &self,
        tree: Option<&Tree>,
        property: Option<&PropertyState>,
        permissions: Permissions,
    ) -> Permissions {
        self.providers
            .iter()
            .fold(Permissions::NO_PERMISSION, |acc, provider| {
                acc | provider.supported_permissions(tree, property, permissions)
            })
    }

    fn supported_permissions_at(&self, location: &TreeLocation, permissions: Permissions) -> Permissions {
        self.providers
            .iter()
            .fold(Permissions::NO_PERMISSION, |acc, provider| {
                acc | provider.supported_permissions_at(location, permissions)
            })
    }

    fn supported_permissions_for(
        &self,
        tree_permission: &TreePermission,
        property: Option<&PropertyState>,
        permissions: Permissions,
    ) -> Permissions {
        match tree_permission {
            TreePermission::Composite(composite) => composite
                .providers()
                .iter()
                .zip(composite.permissions())
                .fold(Permissions::NO_PERMISSION, |acc, (provider, tp)| {
                    acc | provider.supported_permissions_for(tp, property, permissions)
                }),
            other => self
                .providers
                .iter()
                .fold(Permissions::NO_PERMISSION, |acc, provider| {
                    acc | provider.supported_permissions_for(other, property, permissions)
                }),
        }
    }

    fn is_granted_at(&self, location: &TreeLocation, permissions: Permissions) -> bool {
        self.fold_permissions(
            permissions,
            |provider, bits| provider.supported_permissions_at(location, bits),
            |provider, bits| provider.is_granted_at(location, bits),
        )
    }

    fn tree_permission_typed(&self, tree: &Tree, _tree_type: TreeType, parent: &TreePermission) -> TreePermission {
        self.tree_permission(tree, parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::fixtures::{self, RecordingProvider};
    use crate::permission::privilege::{
        JCR_ADD_CHILD_NODES, JCR_READ, JCR_REMOVE_NODE, JCR_VERSION_MANAGEMENT, JCR_WRITE,
        REP_READ_NODES,
    };
    use crate::permission::{StaticPermissionProvider, StaticPolicy};
    use crate::tree::{DefaultContext, DefaultTreeProvider, NodeState};

    const COMPOSITIONS: [CompositionType; 2] = [CompositionType::And, CompositionType::Or];

    fn static_provider(name: &str, policy: StaticPolicy) -> Arc<dyn AggregatedPermissionProvider> {
        Arc::new(StaticPermissionProvider::new(name, policy, fixtures::root_provider()))
    }

    /// Readers everywhere, writers below /test, versioning on /test/a only
    fn static_leaves() -> Vec<Arc<dyn AggregatedPermissionProvider>> {
        vec![
            static_provider(
                "acl",
                StaticPolicy::new(Permissions::READ | Permissions::WRITE)
                    .allow("/", Permissions::READ)
                    .allow("/test", Permissions::WRITE)
                    .deny("/test/a/b", Permissions::READ_NODE),
            ),
            static_provider(
                "versions",
                StaticPolicy::new(Permissions::VERSION_MANAGEMENT | Permissions::REMOVE_NODE)
                    .allow("/test/a", Permissions::VERSION_MANAGEMENT),
            ),
        ]
    }

    #[test]
    fn test_scenario() {
        let root = fixtures::root_tree();
        let test = root.descendant("/test");

        let and = fixtures::composite(CompositionType::And, fixtures::scenario_leaves());
        assert!(and.is_granted(&test, None, Permissions::READ));
        assert!(!and.is_granted(&test, None, Permissions::WRITE));
        assert!(!and.is_granted(&test, None, Permissions::READ | Permissions::WRITE));

        let or = fixtures::composite(CompositionType::Or, fixtures::scenario_leaves());
        assert!(or.is_granted(&test, None, Permissions::READ));
        assert!(!or.is_granted(&test, None, Permissions::WRITE));
        assert!(!or.is_granted(&test, None, Permissions::READ | Permissions::WRITE));
    }

    #[test]
    fn test_scenario_tree_permission() {
        let root = fixtures::root_tree();
        for composition in COMPOSITIONS {
            let provider = fixtures::composite(composition, fixtures::scenario_leaves());
            let root_tp = provider.tree_permission(&root, &TreePermission::Empty);
            let tp = provider.tree_permission(&root.descendant("/test"), &root_tp);

            assert!(tp.is_granted(Permissions::READ));
            assert!(tp.can_read_all());
            assert!(!tp.is_granted(Permissions::WRITE));
            assert!(!tp.is_granted(Permissions::READ | Permissions::WRITE));
        }
    }

    #[test]
    fn test_order_independence() {
        let root = fixtures::root_tree();
        let mut leaves = static_leaves();
        leaves.extend(fixtures::scenario_leaves());

        let requests = [
            Permissions::READ,
            Permissions::READ_NODE,
            Permissions::WRITE,
            Permissions::ADD_NODE,
            Permissions::REMOVE_NODE,
            Permissions::VERSION_MANAGEMENT,
            Permissions::READ | Permissions::VERSION_MANAGEMENT,
        ];
        let privileges: [&[&str]; 4] = [
            &[JCR_READ],
            &[REP_READ_NODES],
            &[JCR_WRITE],
            &[JCR_READ, JCR_VERSION_MANAGEMENT],
        ];

        for composition in COMPOSITIONS {
            let expected = fixtures::composite(composition, leaves.clone());
            for ordering in fixtures::permutations(&leaves) {
                let provider = fixtures::composite(composition, ordering);
                for path in fixtures::TEST_PATHS {
                    let tree = root.descendant(path);
                    for requested in requests {
                        assert_eq!(
                            provider.is_granted(&tree, None, requested),
                            expected.is_granted(&tree, None, requested),
                            "{:?} {} {}",
                            composition,
                            path,
                            requested
                        );
                    }
                    for names in privileges {
                        assert_eq!(
                            provider.has_privileges(Some(&tree), names).unwrap(),
                            expected.has_privileges(Some(&tree), names).unwrap(),
                            "{:?} {} {:?}",
                            composition,
                            path,
                            names
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_uncovered_bits_never_granted() {
        let root = fixtures::root_tree();
        let test = root.descendant("/test");
        for composition in COMPOSITIONS {
            let provider = fixtures::composite(composition, fixtures::scenario_leaves());
            assert!(!provider.is_granted(&test, None, Permissions::LOCK_MANAGEMENT));
            assert!(!provider.is_granted(&test, None, Permissions::READ | Permissions::LOCK_MANAGEMENT));
            assert!(!provider.is_granted(&test, None, Permissions::NO_PERMISSION));
            assert!(!provider.repository_permission().is_granted(Permissions::WORKSPACE_MANAGEMENT));

            let root_tp = provider.tree_permission(&root, &TreePermission::Empty);
            assert!(!root_tp.is_granted(Permissions::LOCK_MANAGEMENT));
        }
    }

    #[test]
    fn test_sentinel_parent_short_circuits() {
        let recorder = Arc::new(RecordingProvider::new("recorder", Permissions::ALL, Permissions::ALL));
        let provider = fixtures::composite(
            CompositionType::And,
            vec![recorder.clone() as Arc<dyn AggregatedPermissionProvider>, recorder.clone()],
        );
        let tree = fixtures::root_tree().descendant("/test/a");

        assert!(matches!(
            provider.tree_permission(&tree, &TreePermission::All),
            TreePermission::All
        ));
        assert!(matches!(
            provider.tree_permission(&tree, &TreePermission::Empty),
            TreePermission::Empty
        ));
        assert!(matches!(
            provider.tree_permission(&tree, &TreePermission::NoRecourse),
            TreePermission::NoRecourse
        ));
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_root_ignores_parent() {
        let provider = fixtures::composite(CompositionType::And, fixtures::scenario_leaves());
        let root = fixtures::root_tree();
        for parent in [TreePermission::All, TreePermission::Empty] {
            assert!(provider.tree_permission(&root, &parent).is_composite());
        }
    }

    #[test]
    fn test_walk_down_the_tree() {
        let provider = fixtures::composite(CompositionType::And, static_leaves());
        let root = fixtures::root_tree();

        let mut tp = provider.tree_permission(&root, &TreePermission::Empty);
        for path in ["/test", "/test/a", "/test/a/b"] {
            tp = provider.tree_permission(&root.descendant(path), &tp);
        }
        assert!(!tp.can_read());
        assert!(tp.is_granted(Permissions::VERSION_MANAGEMENT));
        assert!(tp.is_granted(Permissions::ADD_NODE));
        // REMOVE_NODE is covered by both leaves, only one grants it
        assert!(!tp.is_granted(Permissions::REMOVE_NODE));

        let test2 = provider.tree_permission(
            &root.descendant("/test2"),
            &provider.tree_permission(&root, &TreePermission::Empty),
        );
        assert!(test2.can_read());
        assert!(!test2.is_granted(Permissions::VERSION_MANAGEMENT));
    }

    #[test]
    fn test_is_granted_path() {
        for composition in COMPOSITIONS {
            let provider = fixtures::composite(composition, static_leaves());
            assert!(provider.is_granted_path("/test/a", "read").unwrap());
            assert!(provider.is_granted_path("/test/a", "versioning").unwrap());
            assert!(!provider.is_granted_path("/test2", "versioning").unwrap());
            assert!(!provider.is_granted_path("/test/a", "").unwrap());
            assert!(!provider.is_granted_path("/test/a", "locking").unwrap());
            assert!(provider.is_granted_path("/test/a", "fly").is_err());
        }

        let and = fixtures::composite(CompositionType::And, static_leaves());
        let or = fixtures::composite(CompositionType::Or, static_leaves());
        assert!(!and.is_granted_path("/test/a", "remove").unwrap());
        assert!(or.is_granted_path("/test/a", "remove").unwrap());
    }

    #[test]
    fn test_has_privileges() {
        let root = fixtures::root_tree();
        let a = root.descendant("/test/a");
        for composition in COMPOSITIONS {
            let provider = fixtures::composite(composition, static_leaves());
            assert!(provider.has_privileges(Some(&a), &[]).unwrap());
            assert!(provider.has_privileges(None, &[]).unwrap());
            assert!(provider.has_privileges(Some(&a), &[JCR_READ]).unwrap());
            assert!(provider
                .has_privileges(Some(&a), &[JCR_READ, JCR_VERSION_MANAGEMENT])
                .unwrap());
            assert!(!provider
                .has_privileges(Some(&root.descendant("/test2")), &[JCR_VERSION_MANAGEMENT])
                .unwrap());
            assert!(provider.has_privileges(Some(&a), &["jcr:fly"]).is_err());
        }
    }

    #[test]
    fn test_privileges() {
        let root = fixtures::root_tree();
        let a = root.descendant("/test/a");

        let and = fixtures::composite(CompositionType::And, static_leaves());
        let privileges = and.privileges(Some(&a));
        assert!(privileges.contains(JCR_READ));
        assert!(privileges.contains(JCR_ADD_CHILD_NODES));
        assert!(privileges.contains(JCR_VERSION_MANAGEMENT));
        // both leaves cover jcr:removeNode, only one grants it
        assert!(!privileges.contains(JCR_REMOVE_NODE));
        assert!(!privileges.contains(JCR_WRITE));

        let or = fixtures::composite(CompositionType::Or, static_leaves());
        let privileges = or.privileges(Some(&a));
        assert!(privileges.contains(JCR_REMOVE_NODE));
        assert!(privileges.contains(JCR_VERSION_MANAGEMENT));

        assert!(and.privileges(Some(&root.descendant("/test2"))).contains(JCR_READ));
        assert!(!or.privileges(Some(&root.descendant("/test2"))).contains(JCR_VERSION_MANAGEMENT));
    }

    /// Built-in catalogue without jcr:versionManagement
    struct WithoutVersioning;

    impl PrivilegeBitsProvider for WithoutVersioning {
        fn bits(&self, names: &[&str]) -> AccessControlResult<PrivilegeBits> {
            match names.iter().find(|n| **n == JCR_VERSION_MANAGEMENT) {
                Some(name) => Err(AccessControlError::UnknownPrivilege(name.to_string())),
                None => BuiltinPrivileges.bits(names),
            }
        }

        fn names(&self, bits: PrivilegeBits) -> BTreeSet<String> {
            BuiltinPrivileges.names(bits)
        }
    }

    #[test]
    fn test_untranslatable_privileges_grant_nothing() {
        let root = fixtures::root_tree();
        let a = root.descendant("/test/a");

        let and = fixtures::composite(CompositionType::And, static_leaves())
            .with_privilege_bits(Arc::new(WithoutVersioning));
        let privileges = and.privileges(Some(&a));
        assert!(privileges.contains(JCR_READ));
        assert!(privileges.contains(JCR_ADD_CHILD_NODES));
        assert!(!privileges.contains(JCR_VERSION_MANAGEMENT));
        assert!(!privileges.contains(JCR_REMOVE_NODE));
        assert!(and.has_privileges(Some(&a), &[JCR_VERSION_MANAGEMENT]).is_err());

        let or = fixtures::composite(CompositionType::Or, static_leaves())
            .with_privilege_bits(Arc::new(WithoutVersioning));
        let privileges = or.privileges(Some(&a));
        assert!(privileges.contains(JCR_REMOVE_NODE));
        assert!(!privileges.contains(JCR_VERSION_MANAGEMENT));
    }

    #[test]
    fn test_repository_permission() {
        let leaves: Vec<Arc<dyn AggregatedPermissionProvider>> = vec![
            static_provider(
                "namespaces",
                StaticPolicy::new(Permissions::NAMESPACE_MANAGEMENT)
                    .repository(Permissions::NAMESPACE_MANAGEMENT),
            ),
            static_provider("privileges", StaticPolicy::new(Permissions::PRIVILEGE_MANAGEMENT)),
        ];
        let provider = fixtures::composite(CompositionType::And, leaves);

        let repository = provider.repository_permission();
        assert!(repository.is_composite());
        assert!(repository.is_granted(Permissions::NAMESPACE_MANAGEMENT));
        assert!(!repository.is_granted(Permissions::PRIVILEGE_MANAGEMENT));
        assert!(!repository.is_granted(Permissions::NO_PERMISSION));
        assert!(provider.has_privileges(None, &["jcr:namespaceManagement"]).unwrap());
        assert!(!provider.has_privileges(None, &["rep:privilegeManagement"]).unwrap());
    }

    #[test]
    fn test_new_instance_collapses() {
        let context: Arc<dyn AuthorizationContext> = Arc::new(DefaultContext);
        let tree_provider: Arc<dyn TreeProvider> = Arc::new(DefaultTreeProvider::default());

        let empty = CompositePermissionProvider::new_instance(
            Vec::new(),
            context.clone(),
            CompositionType::And,
            fixtures::root_provider(),
            tree_provider.clone(),
        );
        assert_eq!(empty.name(), "empty");
        assert!(!empty.is_granted(&fixtures::root_tree(), None, Permissions::READ));

        let single: Arc<dyn AggregatedPermissionProvider> =
            Arc::new(RecordingProvider::new("single", Permissions::READ, Permissions::READ));
        let collapsed = CompositePermissionProvider::new_instance(
            vec![single.clone()],
            context.clone(),
            CompositionType::Or,
            fixtures::root_provider(),
            tree_provider.clone(),
        );
        assert!(Arc::ptr_eq(&single, &collapsed));

        let composite = CompositePermissionProvider::new_instance(
            fixtures::scenario_leaves(),
            context,
            CompositionType::Or,
            fixtures::root_provider(),
            tree_provider,
        );
        assert_eq!(composite.name(), "composite-or");
    }

    #[test]
    fn test_refresh_continues_past_failures() {
        let broken = Arc::new(
            RecordingProvider::new("broken", Permissions::READ, Permissions::READ)
                .failing_refresh("store offline"),
        );
        let healthy = Arc::new(RecordingProvider::new("healthy", Permissions::READ, Permissions::READ));
        let provider = fixtures::composite(
            CompositionType::And,
            vec![broken.clone() as Arc<dyn AggregatedPermissionProvider>, healthy.clone()],
        );

        let err = provider.refresh().unwrap_err();
        assert!(matches!(
            &err,
            AccessControlError::RefreshFailed { provider, reason }
                if provider == "broken" && reason == "store offline"
        ));
        assert_eq!(broken.refresh_count(), 1);
        assert_eq!(healthy.refresh_count(), 1);

        let also_broken = Arc::new(
            RecordingProvider::new("also", Permissions::READ, Permissions::READ).failing_refresh("timeout"),
        );
        let provider = fixtures::composite(
            CompositionType::Or,
            vec![broken.clone() as Arc<dyn AggregatedPermissionProvider>, healthy.clone(), also_broken.clone()],
        );
        let err = provider.refresh().unwrap_err();
        assert!(matches!(&err, AccessControlError::Refresh(failures) if failures.len() == 2));
        assert_eq!(healthy.refresh_count(), 2);
        assert_eq!(also_broken.refresh_count(), 1);
    }

    #[test]
    fn test_refresh_publishes_new_snapshot() {
        let roots = fixtures::root_provider();
        let leaf = Arc::new(StaticPermissionProvider::new(
            "acl",
            StaticPolicy::new(Permissions::READ).allow("/", Permissions::READ),
            roots.clone(),
        ));
        let provider = CompositePermissionProvider::and(
            vec![
                leaf.clone() as Arc<dyn AggregatedPermissionProvider>,
                static_provider("versions", StaticPolicy::new(Permissions::VERSION_MANAGEMENT)),
            ],
            Arc::new(DefaultContext),
            roots.clone(),
            Arc::new(DefaultTreeProvider::default()),
        );
        assert!(!provider.root().descendant("/fresh").exists());

        let mut builder = NodeState::builder();
        builder.add_path("/fresh");
        roots.update(builder.build());
        leaf.update(StaticPolicy::new(Permissions::READ));

        assert!(provider.is_granted_path("/test", "read").unwrap());
        provider.refresh().unwrap();
        assert!(provider.root().descendant("/fresh").exists());
        assert!(!provider.is_granted_path("/test", "read").unwrap());
    }

    #[test]
    fn test_composites_nest() {
        let root = fixtures::root_tree();
        let inner: Arc<dyn AggregatedPermissionProvider> =
            Arc::new(fixtures::composite(CompositionType::Or, fixtures::scenario_leaves()));
        let versions = static_provider(
            "versions",
            StaticPolicy::new(Permissions::VERSION_MANAGEMENT).allow("/test", Permissions::VERSION_MANAGEMENT),
        );
        let outer = fixtures::composite(CompositionType::And, vec![inner, versions]);

        let test = root.descendant("/test");
        assert!(outer.is_granted(&test, None, Permissions::READ | Permissions::VERSION_MANAGEMENT));
        assert!(!outer.is_granted(&test, None, Permissions::WRITE));
        assert_eq!(
            outer.supported_permissions(Some(&test), None, Permissions::ALL),
            Permissions::READ | Permissions::WRITE | Permissions::VERSION_MANAGEMENT
        );

        let root_tp = outer.tree_permission(&root, &TreePermission::Empty);
        let test_tp = outer.tree_permission(&test, &root_tp);
        assert!(test_tp.is_granted(Permissions::READ_NODE | Permissions::VERSION_MANAGEMENT));
        assert!(!test_tp.is_granted(Permissions::ADD_NODE));
    }
}
