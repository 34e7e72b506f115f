//! Permission bitmask and action-string translation
//!
//! Every grantable capability is one bit of [`Permissions`]. Aggregates such
//! as `READ` or `WRITE` are unions of single bits, so a request for an
//! aggregate is granted only when every member bit is granted.
//!
//! # Example
//!
//! ```
//! use composite_authz::permission::Permissions;
//!
//! let write = Permissions::WRITE;
//! assert!(write.contains(Permissions::ADD_NODE));
//! assert!(write.contains(Permissions::MODIFY_PROPERTY));
//! assert!(!write.contains(Permissions::READ_NODE));
//! ```

use std::collections::BTreeSet;
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::{AccessControlError, AccessControlResult};
use crate::tree::TreeLocation;

bitflags! {
    /// Permissions evaluated on nodes, properties and the repository
    ///
    /// | Group | Bits |
    /// |-------|------|
    /// | Read | `READ_NODE`, `READ_PROPERTY`, `READ_ACCESS_CONTROL` |
    /// | Write | `ADD_NODE`, `REMOVE_NODE`, `ADD_PROPERTY`, `MODIFY_PROPERTY`, `REMOVE_PROPERTY`, `MODIFY_CHILD_NODE_COLLECTION` |
    /// | Management | `NODE_TYPE_MANAGEMENT`, `VERSION_MANAGEMENT`, `LOCK_MANAGEMENT`, `LIFECYCLE_MANAGEMENT`, `RETENTION_MANAGEMENT`, `MODIFY_ACCESS_CONTROL`, `USER_MANAGEMENT`, `INDEX_DEFINITION_MANAGEMENT` |
    /// | Repository | `NAMESPACE_MANAGEMENT`, `NODE_TYPE_DEFINITION_MANAGEMENT`, `WORKSPACE_MANAGEMENT`, `PRIVILEGE_MANAGEMENT` |
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Permissions: u64 {
        const READ_NODE = 1;
        const READ_PROPERTY = 1 << 1;
        const ADD_PROPERTY = 1 << 2;
        const MODIFY_PROPERTY = 1 << 3;
        const REMOVE_PROPERTY = 1 << 4;
        const ADD_NODE = 1 << 5;
        const REMOVE_NODE = 1 << 6;
        const READ_ACCESS_CONTROL = 1 << 7;
        const MODIFY_ACCESS_CONTROL = 1 << 8;
        const NODE_TYPE_MANAGEMENT = 1 << 9;
        const VERSION_MANAGEMENT = 1 << 10;
        const LOCK_MANAGEMENT = 1 << 11;
        const LIFECYCLE_MANAGEMENT = 1 << 12;
        const RETENTION_MANAGEMENT = 1 << 13;
        const MODIFY_CHILD_NODE_COLLECTION = 1 << 14;
        const NODE_TYPE_DEFINITION_MANAGEMENT = 1 << 15;
        const NAMESPACE_MANAGEMENT = 1 << 16;
        const WORKSPACE_MANAGEMENT = 1 << 17;
        const PRIVILEGE_MANAGEMENT = 1 << 18;
        const USER_MANAGEMENT = 1 << 19;
        const INDEX_DEFINITION_MANAGEMENT = 1 << 20;

        const READ = Self::READ_NODE.bits() | Self::READ_PROPERTY.bits();
        const SET_PROPERTY = Self::ADD_PROPERTY.bits()
            | Self::MODIFY_PROPERTY.bits()
            | Self::REMOVE_PROPERTY.bits();
        const REMOVE = Self::REMOVE_NODE.bits() | Self::REMOVE_PROPERTY.bits();
        const WRITE = Self::ADD_NODE.bits() | Self::REMOVE_NODE.bits() | Self::SET_PROPERTY.bits();
        const ALL = (1 << 21) - 1;
    }
}

/// Action names accepted by [`Permissions::from_actions`]
pub mod actions {
    pub const READ: &str = "read";
    pub const ADD_NODE: &str = "add_node";
    pub const REMOVE: &str = "remove";
    pub const SET_PROPERTY: &str = "set_property";
    pub const ADD_PROPERTY: &str = "add_property";
    pub const MODIFY_PROPERTY: &str = "modify_property";
    pub const REMOVE_PROPERTY: &str = "remove_property";
    pub const REMOVE_NODE: &str = "remove_node";
    pub const READ_ACCESS_CONTROL: &str = "read_access_control";
    pub const MODIFY_ACCESS_CONTROL: &str = "modify_access_control";
    pub const LOCKING: &str = "locking";
    pub const NODE_TYPE_MANAGEMENT: &str = "node_type_management";
    pub const VERSIONING: &str = "versioning";
    pub const USER_MANAGEMENT: &str = "user_management";
}

/// Actions with a fixed permission regardless of location
const SIMPLE_ACTIONS: &[(&str, Permissions)] = &[
    (actions::ADD_NODE, Permissions::ADD_NODE),
    (actions::REMOVE_NODE, Permissions::REMOVE_NODE),
    (actions::ADD_PROPERTY, Permissions::ADD_PROPERTY),
    (actions::MODIFY_PROPERTY, Permissions::MODIFY_PROPERTY),
    (actions::REMOVE_PROPERTY, Permissions::REMOVE_PROPERTY),
    (actions::READ_ACCESS_CONTROL, Permissions::READ_ACCESS_CONTROL),
    (actions::MODIFY_ACCESS_CONTROL, Permissions::MODIFY_ACCESS_CONTROL),
    (actions::LOCKING, Permissions::LOCK_MANAGEMENT),
    (actions::NODE_TYPE_MANAGEMENT, Permissions::NODE_TYPE_MANAGEMENT),
    (actions::VERSIONING, Permissions::VERSION_MANAGEMENT),
    (actions::USER_MANAGEMENT, Permissions::USER_MANAGEMENT),
];

/// Actions that modify content
const WRITE_ACTIONS: &[&str] = &[
    actions::ADD_NODE,
    actions::REMOVE,
    actions::SET_PROPERTY,
    actions::ADD_PROPERTY,
    actions::MODIFY_PROPERTY,
    actions::REMOVE_PROPERTY,
    actions::REMOVE_NODE,
];

impl Permissions {
    /// Requests nothing; never granted
    pub const NO_PERMISSION: Self = Self::empty();

    /// Permissions not bound to any node
    pub const REPOSITORY: Self = Self::NAMESPACE_MANAGEMENT
        .union(Self::NODE_TYPE_DEFINITION_MANAGEMENT)
        .union(Self::WORKSPACE_MANAGEMENT)
        .union(Self::PRIVILEGE_MANAGEMENT)
        .union(Self::INDEX_DEFINITION_MANAGEMENT);

    /// Translate a comma separated action string into permissions
    ///
    /// The mapping of `read`, `set_property` and `remove` depends on what
    /// exists at `location`. On access-control content, `read` maps to
    /// `READ_ACCESS_CONTROL` and every write action to
    /// `MODIFY_ACCESS_CONTROL`.
    pub fn from_actions(
        action_string: &str,
        location: &TreeLocation,
        is_access_control_content: bool,
    ) -> AccessControlResult<Permissions> {
        let mut remaining: BTreeSet<&str> = action_string
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .collect();
        let mut permissions = Permissions::NO_PERMISSION;

        if remaining.remove(actions::READ) {
            permissions |= if is_access_control_content {
                Permissions::READ_ACCESS_CONTROL
            } else if !location.exists() {
                Permissions::READ
            } else if location.property().is_some() {
                Permissions::READ_PROPERTY
            } else {
                Permissions::READ_NODE
            };
        }

        if is_access_control_content {
            let before = remaining.len();
            remaining.retain(|a| !WRITE_ACTIONS.contains(a));
            if remaining.len() != before {
                permissions |= Permissions::MODIFY_ACCESS_CONTROL;
            }
        } else {
            if remaining.remove(actions::SET_PROPERTY) {
                permissions |= if location.property().is_some() {
                    Permissions::MODIFY_PROPERTY
                } else {
                    Permissions::ADD_PROPERTY
                };
            }
            if remaining.remove(actions::REMOVE) {
                permissions |= if !location.exists() {
                    Permissions::REMOVE
                } else if location.property().is_some() {
                    Permissions::REMOVE_PROPERTY
                } else {
                    Permissions::REMOVE_NODE
                };
            }
        }

        for (action, permission) in SIMPLE_ACTIONS {
            if remaining.remove(action) {
                permissions |= *permission;
            }
        }

        if !remaining.is_empty() {
            let unknown: Vec<&str> = remaining.into_iter().collect();
            return Err(AccessControlError::UnknownActions(unknown.join(",")));
        }

        Ok(permissions)
    }

    /// Iterate the single bits set in this mask
    pub fn single_bits(self) -> impl Iterator<Item = Permissions> {
        (0..u64::BITS)
            .map(|shift| 1u64 << shift)
            .filter(move |bit| self.bits() & bit != 0)
            .map(Permissions::from_bits_retain)
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NO_PERMISSION");
        }
        bitflags::parser::to_writer(self, f)
    }
}
