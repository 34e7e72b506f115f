//! Composite repository-level permission decisions

use std::fmt;
use std::sync::Arc;

use super::fold::CompositionType;
use crate::permission::{AggregatedPermissionProvider, Permissions};

/// Folded repository-level decision of several providers
///
/// Nothing is cached: every check queries all providers.
#[derive(Clone)]
pub struct CompositeRepositoryPermission {
    providers: Arc<[Arc<dyn AggregatedPermissionProvider>]>,
    composition: CompositionType,
}

impl CompositeRepositoryPermission {
    pub fn new(
        providers: Arc<[Arc<dyn AggregatedPermissionProvider>]>,
        composition: CompositionType,
    ) -> Self {
        Self {
            providers,
            composition,
        }
    }

    pub fn is_granted(&self, permissions: Permissions) -> bool {
        self.composition.grants(
            permissions,
            self.providers.iter(),
            |provider, bits| provider.supported_permissions(None, None, bits),
            |provider, bits| provider.repository_permission().is_granted(bits),
        )
    }
}

impl fmt::Debug for CompositeRepositoryPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("CompositeRepositoryPermission")
            .field("providers", &names)
            .field("composition", &self.composition)
            .finish()
    }
}
