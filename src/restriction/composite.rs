//! Composite restriction provider
//!
//! Merges the restriction catalogues of several providers. Creating and
//! writing a restriction is routed to the first provider, in construction
//! order, that declares its name. Validation consults every provider and
//! patterns are combined with [`CompositePattern`].

use std::collections::BTreeSet;
use std::sync::Arc;

use super::definition::{Restriction, RestrictionDefinition};
use super::entry::EntryNode;
use super::pattern::{CompositePattern, RestrictionPattern};
use super::provider::{EmptyRestrictionProvider, RestrictionProvider};
use crate::error::{AccessControlError, AccessControlResult};
use crate::tree::Value;

pub struct CompositeRestrictionProvider {
    providers: Vec<Arc<dyn RestrictionProvider>>,
}

impl CompositeRestrictionProvider {
    /// Provider for `providers`: the empty provider for none, the provider
    /// itself for exactly one, a composite otherwise
    ///
    /// Aggregation-aware providers receive a handle to the composite once
    /// it is built.
    pub fn new_instance(mut providers: Vec<Arc<dyn RestrictionProvider>>) -> Arc<dyn RestrictionProvider> {
        match providers.len() {
            0 => Arc::new(EmptyRestrictionProvider),
            1 => providers.remove(0),
            _ => {
                tracing::info!(
                    "Creating composite restriction provider over {} providers",
                    providers.len()
                );
                let composite: Arc<dyn RestrictionProvider> = Arc::new(Self {
                    providers: providers.clone(),
                });
                for provider in &providers {
                    if let Some(aware) = provider.aggregation_aware() {
                        aware.set_composite(Arc::downgrade(&composite));
                    }
                }
                composite
            }
        }
    }

    pub fn providers(&self) -> &[Arc<dyn RestrictionProvider>] {
        &self.providers
    }

    /// First provider declaring `name` at `path`
    fn route(&self, path: Option<&str>, name: &str) -> AccessControlResult<&Arc<dyn RestrictionProvider>> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.supported_restrictions(path).iter().any(|d| d.name() == name))
            .ok_or_else(|| AccessControlError::unsupported_restriction(path, name))?;
        tracing::debug!("Routing restriction '{}' to '{}'", name, provider.name());
        Ok(provider)
    }
}

impl RestrictionProvider for CompositeRestrictionProvider {
    fn name(&self) -> &str {
        "composite"
    }

    fn supported_restrictions(&self, path: Option<&str>) -> BTreeSet<RestrictionDefinition> {
        self.providers
            .iter()
            .flat_map(|p| p.supported_restrictions(path))
            .collect()
    }

    fn create_restriction(&self, path: Option<&str>, name: &str, value: Value) -> AccessControlResult<Restriction> {
        self.route(path, name)?.create_restriction(path, name, value)
    }

    fn create_multi_restriction(
        &self,
        path: Option<&str>,
        name: &str,
        values: Vec<Value>,
    ) -> AccessControlResult<Restriction> {
        self.route(path, name)?.create_multi_restriction(path, name, values)
    }

    fn read_restrictions(&self, path: Option<&str>, entry: &EntryNode) -> BTreeSet<Restriction> {
        self.providers
            .iter()
            .flat_map(|p| p.read_restrictions(path, entry))
            .collect()
    }

    fn write_restrictions(
        &self,
        path: Option<&str>,
        entry: &mut EntryNode,
        restrictions: &[Restriction],
    ) -> AccessControlResult<()> {
        for restriction in restrictions {
            self.route(path, restriction.name())?.write_restrictions(
                path,
                entry,
                std::slice::from_ref(restriction),
            )?;
        }
        Ok(())
    }

    fn validate_restrictions(&self, path: Option<&str>, entry: &EntryNode) -> AccessControlResult<()> {
        for provider in &self.providers {
            provider.validate_restrictions(path, entry)?;
        }
        Ok(())
    }

    fn pattern(&self, path: Option<&str>, entry: &EntryNode) -> RestrictionPattern {
        CompositePattern::create(
            self.providers
                .iter()
                .map(|p| p.pattern(path, entry)),
        )
    }

    fn pattern_for(&self, path: Option<&str>, restrictions: &BTreeSet<Restriction>) -> RestrictionPattern {
        CompositePattern::create(
            self.providers
                .iter()
                .map(|p| p.pattern_for(path, restrictions)),
        )
    }
}
