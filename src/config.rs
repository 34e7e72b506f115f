//! Authorization configuration
//!
//! A JSON document describing the content tree, the policy modules that are
//! combined into one permission provider, and logging:
//!
//! ```json
//! {
//!   "composition": "and",
//!   "content": ["/content/site/page"],
//!   "providers": [
//!     {
//!       "name": "acl",
//!       "covers": "READ | WRITE",
//!       "entries": [{ "path": "/", "allow": "READ" }]
//!     }
//!   ],
//!   "logging": { "level": "debug" }
//! }
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::composite::{CompositePermissionProvider, CompositionType};
use crate::error::{AccessControlError, AccessControlResult};
use crate::path;
use crate::permission::{AggregatedPermissionProvider, Permissions, StaticPermissionProvider, StaticPolicy};
use crate::restriction::{
    CompositeRestrictionProvider, GlobRestrictionProvider, ItemNamesRestrictionProvider, RestrictionProvider,
};
use crate::tree::{AuthorizationContext, DefaultContext, DefaultTreeProvider, NodeState, SnapshotRootProvider};

/// Allow and deny masks at one path of a policy module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryConfig {
    /// Absolute path the entry applies to, inherited by descendants
    pub path: String,

    #[serde(default = "no_permission")]
    pub allow: Permissions,

    #[serde(default = "no_permission")]
    pub deny: Permissions,
}

/// One static policy module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Unique name, used in logs and refresh errors
    pub name: String,

    /// Permissions this module has an opinion on
    pub covers: Permissions,

    /// Repository-level grants
    #[serde(default = "no_permission")]
    pub repository: Permissions,

    #[serde(default)]
    pub entries: Vec<EntryConfig>,
}

fn no_permission() -> Permissions {
    Permissions::NO_PERMISSION
}

impl PolicyConfig {
    pub fn new(name: impl Into<String>, covers: Permissions) -> Self {
        Self {
            name: name.into(),
            covers,
            repository: Permissions::NO_PERMISSION,
            entries: Vec::new(),
        }
    }

    /// Grant `permissions` at repository level
    pub fn with_repository(mut self, permissions: Permissions) -> Self {
        self.repository = permissions;
        self
    }

    /// Allow `permissions` at `path` and below
    pub fn allow(mut self, path: impl Into<String>, permissions: Permissions) -> Self {
        self.entries.push(EntryConfig {
            path: path.into(),
            allow: permissions,
            deny: Permissions::NO_PERMISSION,
        });
        self
    }

    /// Deny `permissions` at `path` and below
    pub fn deny(mut self, path: impl Into<String>, permissions: Permissions) -> Self {
        self.entries.push(EntryConfig {
            path: path.into(),
            allow: Permissions::NO_PERMISSION,
            deny: permissions,
        });
        self
    }

    pub fn policy(&self) -> StaticPolicy {
        self.entries.iter().fold(
            StaticPolicy::new(self.covers).repository(self.repository),
            |policy, entry| {
                policy
                    .allow(entry.path.clone(), entry.allow)
                    .deny(entry.path.clone(), entry.deny)
            },
        )
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human readable output
    #[serde(default)]
    pub json: bool,

    /// Write daily-rolling log files here instead of stderr
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
            directory: None,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationConfig {
    /// How policy modules are combined
    #[serde(default)]
    pub composition: CompositionType,

    /// Node paths of the content tree; intermediate nodes are implied
    #[serde(default)]
    pub content: Vec<String>,

    /// Policy modules, in evaluation order
    #[serde(default)]
    pub providers: Vec<PolicyConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AuthorizationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_composition(mut self, composition: CompositionType) -> Self {
        self.composition = composition;
        self
    }

    /// Add a node path to the content tree
    pub fn with_content(mut self, path: impl Into<String>) -> Self {
        self.content.push(path.into());
        self
    }

    pub fn add_provider(mut self, provider: PolicyConfig) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> AccessControlResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> AccessControlResult<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading authorization config from {:?}", path);
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check paths are absolute and provider names unique
    pub fn validate(&self) -> AccessControlResult<()> {
        if let Some(relative) = self.content.iter().find(|p| !path::is_absolute(p)) {
            return Err(AccessControlError::InvalidConfig(format!(
                "content path '{}' is not absolute",
                relative
            )));
        }

        let mut names = BTreeSet::new();
        for provider in &self.providers {
            if provider.name.is_empty() {
                return Err(AccessControlError::InvalidConfig(
                    "provider name must not be empty".to_string(),
                ));
            }
            if !names.insert(provider.name.as_str()) {
                return Err(AccessControlError::InvalidConfig(format!(
                    "duplicate provider '{}'",
                    provider.name
                )));
            }
            if let Some(entry) = provider.entries.iter().find(|e| !path::is_absolute(&e.path)) {
                return Err(AccessControlError::InvalidConfig(format!(
                    "entry path '{}' of provider '{}' is not absolute",
                    entry.path, provider.name
                )));
            }
        }
        Ok(())
    }

    /// Node state holding every configured content path
    pub fn content_root(&self) -> NodeState {
        let mut builder = NodeState::builder();
        for path in &self.content {
            builder.add_path(path);
        }
        builder.build()
    }

    /// Permission provider over the configured modules, sharing a root
    /// provider seeded with the content tree
    pub fn build(&self) -> AccessControlResult<Arc<dyn AggregatedPermissionProvider>> {
        self.build_with(Arc::new(SnapshotRootProvider::new(self.content_root())))
    }

    /// Like [`AuthorizationConfig::build`], reading roots from `root_provider`
    pub fn build_with(
        &self,
        root_provider: Arc<SnapshotRootProvider>,
    ) -> AccessControlResult<Arc<dyn AggregatedPermissionProvider>> {
        self.validate()?;

        let context: Arc<dyn AuthorizationContext> = Arc::new(DefaultContext);
        let providers = self
            .providers
            .iter()
            .map(|p| {
                Arc::new(
                    StaticPermissionProvider::new(p.name.clone(), p.policy(), root_provider.clone())
                        .with_context(context.clone()),
                ) as Arc<dyn AggregatedPermissionProvider>
            })
            .collect();

        tracing::info!(
            "Building {:?} permission provider from {} policy modules",
            self.composition,
            self.providers.len()
        );
        Ok(CompositePermissionProvider::new_instance(
            providers,
            context.clone(),
            self.composition,
            root_provider,
            Arc::new(DefaultTreeProvider::new(context)),
        ))
    }
}

/// Composite of the built-in `rep:glob` and `rep:itemNames` providers
pub fn restriction_provider() -> Arc<dyn RestrictionProvider> {
    CompositeRestrictionProvider::new_instance(vec![
        Arc::new(GlobRestrictionProvider::new()) as Arc<dyn RestrictionProvider>,
        Arc::new(ItemNamesRestrictionProvider::new()),
    ])
}
