//! Privilege bits and name translation
//!
//! Privileges are the user-facing names for permission sets (`jcr:read`,
//! `jcr:write`, ...). Aggregate privileges are unions of their members, so
//! names translate to bits once and all evaluation happens on bitmasks.

use std::collections::BTreeSet;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::bits::Permissions;
use crate::error::{AccessControlError, AccessControlResult};

pub const JCR_READ: &str = "jcr:read";
pub const REP_READ_NODES: &str = "rep:readNodes";
pub const REP_READ_PROPERTIES: &str = "rep:readProperties";
pub const JCR_MODIFY_PROPERTIES: &str = "jcr:modifyProperties";
pub const REP_ADD_PROPERTIES: &str = "rep:addProperties";
pub const REP_ALTER_PROPERTIES: &str = "rep:alterProperties";
pub const REP_REMOVE_PROPERTIES: &str = "rep:removeProperties";
pub const JCR_ADD_CHILD_NODES: &str = "jcr:addChildNodes";
pub const JCR_REMOVE_CHILD_NODES: &str = "jcr:removeChildNodes";
pub const JCR_REMOVE_NODE: &str = "jcr:removeNode";
pub const JCR_WRITE: &str = "jcr:write";
pub const REP_WRITE: &str = "rep:write";
pub const JCR_READ_ACCESS_CONTROL: &str = "jcr:readAccessControl";
pub const JCR_MODIFY_ACCESS_CONTROL: &str = "jcr:modifyAccessControl";
pub const JCR_NODE_TYPE_MANAGEMENT: &str = "jcr:nodeTypeManagement";
pub const JCR_VERSION_MANAGEMENT: &str = "jcr:versionManagement";
pub const JCR_LOCK_MANAGEMENT: &str = "jcr:lockManagement";
pub const JCR_LIFECYCLE_MANAGEMENT: &str = "jcr:lifecycleManagement";
pub const JCR_RETENTION_MANAGEMENT: &str = "jcr:retentionManagement";
pub const JCR_WORKSPACE_MANAGEMENT: &str = "jcr:workspaceManagement";
pub const JCR_NODE_TYPE_DEFINITION_MANAGEMENT: &str = "jcr:nodeTypeDefinitionManagement";
pub const JCR_NAMESPACE_MANAGEMENT: &str = "jcr:namespaceManagement";
pub const REP_PRIVILEGE_MANAGEMENT: &str = "rep:privilegeManagement";
pub const REP_USER_MANAGEMENT: &str = "rep:userManagement";
pub const REP_INDEX_DEFINITION_MANAGEMENT: &str = "rep:indexDefinitionManagement";
pub const JCR_ALL: &str = "jcr:all";

bitflags! {
    /// Built-in privileges; aggregates are unions of their members
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PrivilegeBits: u64 {
        const READ_NODES = 1;
        const READ_PROPERTIES = 1 << 1;
        const ADD_PROPERTIES = 1 << 2;
        const ALTER_PROPERTIES = 1 << 3;
        const REMOVE_PROPERTIES = 1 << 4;
        const ADD_CHILD_NODES = 1 << 5;
        const REMOVE_CHILD_NODES = 1 << 6;
        const REMOVE_NODE = 1 << 7;
        const READ_ACCESS_CONTROL = 1 << 8;
        const MODIFY_ACCESS_CONTROL = 1 << 9;
        const NODE_TYPE_MANAGEMENT = 1 << 10;
        const VERSION_MANAGEMENT = 1 << 11;
        const LOCK_MANAGEMENT = 1 << 12;
        const LIFECYCLE_MANAGEMENT = 1 << 13;
        const RETENTION_MANAGEMENT = 1 << 14;
        const WORKSPACE_MANAGEMENT = 1 << 15;
        const NODE_TYPE_DEFINITION_MANAGEMENT = 1 << 16;
        const NAMESPACE_MANAGEMENT = 1 << 17;
        const PRIVILEGE_MANAGEMENT = 1 << 18;
        const USER_MANAGEMENT = 1 << 19;
        const INDEX_DEFINITION_MANAGEMENT = 1 << 20;

        const READ = Self::READ_NODES.bits() | Self::READ_PROPERTIES.bits();
        const MODIFY_PROPERTIES = Self::ADD_PROPERTIES.bits()
            | Self::ALTER_PROPERTIES.bits()
            | Self::REMOVE_PROPERTIES.bits();
        const WRITE = Self::MODIFY_PROPERTIES.bits()
            | Self::ADD_CHILD_NODES.bits()
            | Self::REMOVE_CHILD_NODES.bits()
            | Self::REMOVE_NODE.bits();
        const REP_WRITE = Self::WRITE.bits() | Self::NODE_TYPE_MANAGEMENT.bits();
    }
}

/// Name table ordered aggregates first, largest first
const PRIVILEGE_NAMES: &[(&str, PrivilegeBits)] = &[
    (JCR_ALL, PrivilegeBits::all()),
    (REP_WRITE, PrivilegeBits::REP_WRITE),
    (JCR_WRITE, PrivilegeBits::WRITE),
    (JCR_MODIFY_PROPERTIES, PrivilegeBits::MODIFY_PROPERTIES),
    (JCR_READ, PrivilegeBits::READ),
    (REP_READ_NODES, PrivilegeBits::READ_NODES),
    (REP_READ_PROPERTIES, PrivilegeBits::READ_PROPERTIES),
    (REP_ADD_PROPERTIES, PrivilegeBits::ADD_PROPERTIES),
    (REP_ALTER_PROPERTIES, PrivilegeBits::ALTER_PROPERTIES),
    (REP_REMOVE_PROPERTIES, PrivilegeBits::REMOVE_PROPERTIES),
    (JCR_ADD_CHILD_NODES, PrivilegeBits::ADD_CHILD_NODES),
    (JCR_REMOVE_CHILD_NODES, PrivilegeBits::REMOVE_CHILD_NODES),
    (JCR_REMOVE_NODE, PrivilegeBits::REMOVE_NODE),
    (JCR_READ_ACCESS_CONTROL, PrivilegeBits::READ_ACCESS_CONTROL),
    (JCR_MODIFY_ACCESS_CONTROL, PrivilegeBits::MODIFY_ACCESS_CONTROL),
    (JCR_NODE_TYPE_MANAGEMENT, PrivilegeBits::NODE_TYPE_MANAGEMENT),
    (JCR_VERSION_MANAGEMENT, PrivilegeBits::VERSION_MANAGEMENT),
    (JCR_LOCK_MANAGEMENT, PrivilegeBits::LOCK_MANAGEMENT),
    (JCR_LIFECYCLE_MANAGEMENT, PrivilegeBits::LIFECYCLE_MANAGEMENT),
    (JCR_RETENTION_MANAGEMENT, PrivilegeBits::RETENTION_MANAGEMENT),
    (JCR_WORKSPACE_MANAGEMENT, PrivilegeBits::WORKSPACE_MANAGEMENT),
    (JCR_NODE_TYPE_DEFINITION_MANAGEMENT, PrivilegeBits::NODE_TYPE_DEFINITION_MANAGEMENT),
    (JCR_NAMESPACE_MANAGEMENT, PrivilegeBits::NAMESPACE_MANAGEMENT),
    (REP_PRIVILEGE_MANAGEMENT, PrivilegeBits::PRIVILEGE_MANAGEMENT),
    (REP_USER_MANAGEMENT, PrivilegeBits::USER_MANAGEMENT),
    (REP_INDEX_DEFINITION_MANAGEMENT, PrivilegeBits::INDEX_DEFINITION_MANAGEMENT),
];

/// Permission implied by each single privilege bit
const PRIVILEGE_PERMISSIONS: &[(PrivilegeBits, Permissions)] = &[
    (PrivilegeBits::READ_NODES, Permissions::READ_NODE),
    (PrivilegeBits::READ_PROPERTIES, Permissions::READ_PROPERTY),
    (PrivilegeBits::ADD_PROPERTIES, Permissions::ADD_PROPERTY),
    (PrivilegeBits::ALTER_PROPERTIES, Permissions::MODIFY_PROPERTY),
    (PrivilegeBits::REMOVE_PROPERTIES, Permissions::REMOVE_PROPERTY),
    (PrivilegeBits::ADD_CHILD_NODES, Permissions::ADD_NODE),
    (PrivilegeBits::REMOVE_CHILD_NODES, Permissions::MODIFY_CHILD_NODE_COLLECTION),
    (PrivilegeBits::REMOVE_NODE, Permissions::REMOVE_NODE),
    (PrivilegeBits::READ_ACCESS_CONTROL, Permissions::READ_ACCESS_CONTROL),
    (PrivilegeBits::MODIFY_ACCESS_CONTROL, Permissions::MODIFY_ACCESS_CONTROL),
    (PrivilegeBits::NODE_TYPE_MANAGEMENT, Permissions::NODE_TYPE_MANAGEMENT),
    (PrivilegeBits::VERSION_MANAGEMENT, Permissions::VERSION_MANAGEMENT),
    (PrivilegeBits::LOCK_MANAGEMENT, Permissions::LOCK_MANAGEMENT),
    (PrivilegeBits::LIFECYCLE_MANAGEMENT, Permissions::LIFECYCLE_MANAGEMENT),
    (PrivilegeBits::RETENTION_MANAGEMENT, Permissions::RETENTION_MANAGEMENT),
    (PrivilegeBits::WORKSPACE_MANAGEMENT, Permissions::WORKSPACE_MANAGEMENT),
    (PrivilegeBits::NODE_TYPE_DEFINITION_MANAGEMENT, Permissions::NODE_TYPE_DEFINITION_MANAGEMENT),
    (PrivilegeBits::NAMESPACE_MANAGEMENT, Permissions::NAMESPACE_MANAGEMENT),
    (PrivilegeBits::PRIVILEGE_MANAGEMENT, Permissions::PRIVILEGE_MANAGEMENT),
    (PrivilegeBits::USER_MANAGEMENT, Permissions::USER_MANAGEMENT),
    (PrivilegeBits::INDEX_DEFINITION_MANAGEMENT, Permissions::INDEX_DEFINITION_MANAGEMENT),
];

impl PrivilegeBits {
    /// Permissions needed to exercise these privileges
    pub fn permissions(self) -> Permissions {
        PRIVILEGE_PERMISSIONS
            .iter()
            .filter(|(privilege, _)| self.contains(*privilege))
            .fold(Permissions::NO_PERMISSION, |acc, (_, permission)| acc | *permission)
    }

    /// Privileges fully implied by the given permissions
    pub fn from_permissions(permissions: Permissions) -> PrivilegeBits {
        PRIVILEGE_PERMISSIONS
            .iter()
            .filter(|(_, permission)| permissions.contains(*permission))
            .fold(PrivilegeBits::empty(), |acc, (privilege, _)| acc | *privilege)
    }
}

/// Translates between privilege names and [`PrivilegeBits`]
pub trait PrivilegeBitsProvider: Send + Sync {
    /// Bits for the given names; unknown names are an error
    fn bits(&self, names: &[&str]) -> AccessControlResult<PrivilegeBits>;

    /// Smallest set of names covering `bits`, aggregates preferred
    fn names(&self, bits: PrivilegeBits) -> BTreeSet<String>;
}

/// The built-in privilege catalogue
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinPrivileges;

impl PrivilegeBitsProvider for BuiltinPrivileges {
    fn bits(&self, names: &[&str]) -> AccessControlResult<PrivilegeBits> {
        names.iter().try_fold(PrivilegeBits::empty(), |acc, name| {
            PRIVILEGE_NAMES
                .iter()
                .find(|(candidate, _)| candidate == name)
                .map(|(_, bits)| acc | *bits)
                .ok_or_else(|| AccessControlError::UnknownPrivilege(name.to_string()))
        })
    }

    fn names(&self, bits: PrivilegeBits) -> BTreeSet<String> {
        let mut remaining = bits;
        let mut names = BTreeSet::new();
        for (name, privilege) in PRIVILEGE_NAMES {
            if !remaining.is_empty() && remaining.contains(*privilege) {
                names.insert(name.to_string());
                remaining.remove(*privilege);
            }
        }
        names
    }
}
