//! Composite authorization
//!
//! Combines independent permission and restriction providers into a single
//! decision point. Permission providers are merged with AND or OR
//! semantics; restriction providers merge their catalogues and patterns.

pub mod error;
pub mod path;
pub mod tree;

// Permission model and leaf contracts
pub mod permission;

// Aggregation of permission providers
pub mod composite;

// Restriction providers and their aggregation
pub mod restriction;

// Configuration and logging for embedding applications
pub mod config;
pub mod logging;

// Terminal output for the binary
pub mod cli;

pub use composite::{CompositePermissionProvider, CompositionType};
pub use config::AuthorizationConfig;
pub use error::{AccessControlError, AccessControlResult};
pub use restriction::CompositeRestrictionProvider;
