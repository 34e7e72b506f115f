//! Content-tree contract consumed by the permission layer
//!
//! The storage engine is outside this crate. Permission providers only need:
//! - `NodeState` / `PropertyState` - immutable node and property snapshots
//! - `Tree` / `TreeLocation` - path-addressed views onto a root snapshot
//! - `RootProvider` / `TreeProvider` - snapshot supply and tree classification
//! - `AuthorizationContext` - recognition of access-control content

pub mod context;
pub mod node;
pub mod provider;
pub mod tree;

pub use context::{AccessControlContext, AuthorizationContext, DefaultContext};
pub use node::{NodeBuilder, NodeState, PropertyState, Value, ValueType};
pub use provider::{DefaultTreeProvider, RootProvider, SnapshotRootProvider, TreeProvider};
pub use tree::{Tree, TreeLocation, TreeType};
