//! Permissions, privileges and the permission provider contracts

pub mod bits;
pub mod privilege;
pub mod provider;
pub mod repository_permission;
pub mod static_provider;
pub mod tree_permission;

pub use bits::{actions, Permissions};
pub use privilege::{BuiltinPrivileges, PrivilegeBits, PrivilegeBitsProvider};
pub use provider::{AggregatedPermissionProvider, EmptyPermissionProvider, PermissionProvider};
pub use repository_permission::{RepositoryCheck, RepositoryPermission};
pub use static_provider::{PolicyEntry, StaticPermissionProvider, StaticPolicy, StaticTreePermission};
pub use tree_permission::{NodePermission, TreePermission};
