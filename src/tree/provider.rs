//! Root and tree collaborators of the permission layer

use std::sync::{Arc, PoisonError, RwLock};

use super::context::{AuthorizationContext, DefaultContext};
use super::node::NodeState;
use super::tree::{Tree, TreeType};

/// Node holding the version storage and related system content
pub const JCR_SYSTEM: &str = "jcr:system";

const VERSION_STORE_NAMES: &[&str] = &["jcr:versionStorage", "jcr:activities", "jcr:configurations"];

/// Node holding the compiled permission store
pub const REP_PERMISSION_STORE: &str = "rep:permissionStore";

/// Supplies the read-only root a permission provider evaluates against
pub trait RootProvider: Send + Sync {
    /// Current read-only root snapshot
    fn read_only_root(&self) -> Tree;
}

/// Root provider over a swappable node-state snapshot
///
/// New snapshots published with [`SnapshotRootProvider::update`] become
/// visible to permission providers on their next `refresh()`.
#[derive(Debug, Default)]
pub struct SnapshotRootProvider {
    state: RwLock<NodeState>,
}

impl SnapshotRootProvider {
    pub fn new(state: NodeState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Publish a new root state
    pub fn update(&self, state: NodeState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

impl RootProvider for SnapshotRootProvider {
    fn read_only_root(&self) -> Tree {
        Tree::root(
            self.state
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        )
    }
}

/// Classifies trees while permissions are derived from parent to child
pub trait TreeProvider: Send + Sync {
    /// Type of `tree`, given the type of its parent
    fn tree_type(&self, tree: &Tree, parent_type: TreeType) -> TreeType;
}

/// Tree provider recognising hidden, version, internal and
/// access-control trees
pub struct DefaultTreeProvider {
    context: Arc<dyn AuthorizationContext>,
}

impl DefaultTreeProvider {
    pub fn new(context: Arc<dyn AuthorizationContext>) -> Self {
        Self { context }
    }
}

impl Default for DefaultTreeProvider {
    fn default() -> Self {
        Self::new(Arc::new(DefaultContext))
    }
}

impl TreeProvider for DefaultTreeProvider {
    fn tree_type(&self, tree: &Tree, parent_type: TreeType) -> TreeType {
        match parent_type {
            TreeType::Hidden | TreeType::Version | TreeType::Internal => return parent_type,
            TreeType::AccessControl | TreeType::Default => {}
        }

        let name = tree.name();
        if name.starts_with(':') {
            TreeType::Hidden
        } else if VERSION_STORE_NAMES.contains(&name) && tree.path().starts_with("/jcr:system/") {
            TreeType::Version
        } else if name == REP_PERMISSION_STORE {
            TreeType::Internal
        } else if parent_type == TreeType::AccessControl || self.context.defines_tree(tree) {
            TreeType::AccessControl
        } else {
            TreeType::Default
        }
    }
}
