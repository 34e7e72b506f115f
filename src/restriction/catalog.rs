//! Shared bookkeeping for restriction providers
//!
//! A [`RestrictionCatalog`] holds one provider's definitions and implements
//! the parts of the provider contract that only depend on them: creating,
//! reading, writing and validating restrictions.

use std::collections::{BTreeMap, BTreeSet};

use super::definition::{Restriction, RestrictionDefinition};
use super::entry::EntryNode;
use crate::error::{AccessControlError, AccessControlResult};
use crate::tree::{PropertyState, Value};

#[derive(Debug, Clone, Default)]
pub struct RestrictionCatalog {
    definitions: BTreeMap<String, RestrictionDefinition>,
}

impl RestrictionCatalog {
    pub fn new(definitions: impl IntoIterator<Item = RestrictionDefinition>) -> Self {
        Self {
            definitions: definitions
                .into_iter()
                .map(|d| (d.name().to_string(), d))
                .collect(),
        }
    }

    /// Definitions available at `path`; none for repository-level entries
    pub fn supported(&self, path: Option<&str>) -> BTreeSet<RestrictionDefinition> {
        match path {
            Some(_) => self.definitions.values().cloned().collect(),
            None => BTreeSet::new(),
        }
    }

    pub fn definition(&self, name: &str) -> Option<&RestrictionDefinition> {
        self.definitions.get(name)
    }

    fn supported_definition(&self, path: Option<&str>, name: &str) -> AccessControlResult<&RestrictionDefinition> {
        match path {
            Some(_) => self
                .definition(name)
                .ok_or_else(|| AccessControlError::unsupported_restriction(path, name)),
            None => Err(AccessControlError::unsupported_restriction(path, name)),
        }
    }

    pub fn create(&self, path: Option<&str>, name: &str, value: Value) -> AccessControlResult<Restriction> {
        let definition = self.supported_definition(path, name)?;
        check_type(path, definition, std::slice::from_ref(&value))?;

        let property = if definition.is_multi_valued() {
            PropertyState::multi(name, vec![value])
        } else {
            PropertyState::single(name, value)
        };
        Ok(Restriction::new(definition.clone(), property))
    }

    pub fn create_multi(
        &self,
        path: Option<&str>,
        name: &str,
        values: Vec<Value>,
    ) -> AccessControlResult<Restriction> {
        let definition = self.supported_definition(path, name)?;
        check_type(path, definition, &values)?;

        let property = if definition.is_multi_valued() {
            PropertyState::multi(name, values)
        } else {
            match <[Value; 1]>::try_from(values) {
                Ok([value]) => PropertyState::single(name, value),
                Err(values) => {
                    return Err(AccessControlError::invalid_restriction(
                        path,
                        name,
                        format!("expected a single value, got {}", values.len()),
                    ))
                }
            }
        };
        Ok(Restriction::new(definition.clone(), property))
    }

    /// Restrictions of the catalogued kinds stored with `entry`
    pub fn read(&self, path: Option<&str>, entry: &EntryNode) -> BTreeSet<Restriction> {
        if path.is_none() {
            return BTreeSet::new();
        }
        self.definitions
            .values()
            .filter_map(|definition| {
                entry
                    .property(definition.name())
                    .map(|property| Restriction::new(definition.clone(), property.clone()))
            })
            .collect()
    }

    pub fn write(
        &self,
        path: Option<&str>,
        entry: &mut EntryNode,
        restrictions: &[Restriction],
    ) -> AccessControlResult<()> {
        for restriction in restrictions {
            let definition = self.supported_definition(path, restriction.name())?;
            if definition != restriction.definition() {
                return Err(AccessControlError::invalid_restriction(
                    path,
                    restriction.name(),
                    "definition does not match the registered one",
                ));
            }
            entry.set_property(restriction.property().clone());
        }
        Ok(())
    }

    /// Check the catalogued restrictions of `entry`; other names are left
    /// to the providers declaring them
    pub fn validate(&self, path: Option<&str>, entry: &EntryNode) -> AccessControlResult<()> {
        for property in entry.properties() {
            let Some(definition) = self.definition(property.name()) else {
                continue;
            };
            if path.is_none() {
                return Err(AccessControlError::invalid_restriction(
                    path,
                    property.name(),
                    "restrictions are not supported on repository-level entries",
                ));
            }
            if property.is_multi_valued() != definition.is_multi_valued() {
                return Err(AccessControlError::invalid_restriction(
                    path,
                    property.name(),
                    "multiplicity does not match the definition",
                ));
            }
            check_type(path, definition, property.values())?;
        }

        if path.is_some() {
            if let Some(missing) = self
                .definitions
                .values()
                .find(|d| d.is_mandatory() && entry.property(d.name()).is_none())
            {
                return Err(AccessControlError::invalid_restriction(
                    path,
                    missing.name(),
                    "mandatory restriction is missing",
                ));
            }
        }
        Ok(())
    }
}

fn check_type(path: Option<&str>, definition: &RestrictionDefinition, values: &[Value]) -> AccessControlResult<()> {
    match values.iter().find(|v| v.value_type() != definition.value_type()) {
        Some(value) => Err(AccessControlError::invalid_restriction(
            path,
            definition.name(),
            format!(
                "expected {:?} value, got {:?}",
                definition.value_type(),
                value.value_type()
            ),
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ValueType;

    fn catalog() -> RestrictionCatalog {
        RestrictionCatalog::new([
            RestrictionDefinition::new("rep:glob", ValueType::String, false),
            RestrictionDefinition::new("rep:itemNames", ValueType::Name, true),
            RestrictionDefinition::new("rep:owner", ValueType::String, false).mandatory(),
        ])
    }

    #[test]
    fn test_create_checks_type_and_path() {
        let catalog = catalog();
        let glob = catalog
            .create(Some("/test"), "rep:glob", Value::String("*".into()))
            .unwrap();
        assert!(!glob.property().is_multi_valued());

        let names = catalog
            .create(Some("/test"), "rep:itemNames", Value::Name("a".into()))
            .unwrap();
        assert!(names.property().is_multi_valued());

        assert!(matches!(
            catalog.create(Some("/test"), "rep:glob", Value::Long(1)),
            Err(AccessControlError::InvalidRestriction { .. })
        ));
        assert!(matches!(
            catalog.create(None, "rep:glob", Value::String("*".into())),
            Err(AccessControlError::UnsupportedRestriction { path: None, .. })
        ));
        assert!(matches!(
            catalog.create(Some("/test"), "rep:fly", Value::String("*".into())),
            Err(AccessControlError::UnsupportedRestriction { .. })
        ));
    }

    #[test]
    fn test_create_multi() {
        let catalog = catalog();
        let names = catalog
            .create_multi(
                Some("/test"),
                "rep:itemNames",
                vec![Value::Name("a".into()), Value::Name("b".into())],
            )
            .unwrap();
        assert_eq!(names.property().values().len(), 2);

        let glob = catalog
            .create_multi(Some("/test"), "rep:glob", vec![Value::String("*".into())])
            .unwrap();
        assert!(!glob.property().is_multi_valued());

        assert!(catalog
            .create_multi(
                Some("/test"),
                "rep:glob",
                vec![Value::String("a".into()), Value::String("b".into())]
            )
            .is_err());
    }

    #[test]
    fn test_write_then_read() {
        let catalog = catalog();
        let glob = catalog
            .create(Some("/test"), "rep:glob", Value::String("*".into()))
            .unwrap();

        let mut entry = EntryNode::new();
        catalog.write(Some("/test"), &mut entry, &[glob.clone()]).unwrap();
        entry.set_property(PropertyState::single("other:restriction", Value::Long(1)));

        let read = catalog.read(Some("/test"), &entry);
        assert_eq!(read.len(), 1);
        assert!(read.contains(&glob));
        assert!(catalog.read(None, &entry).is_empty());
    }

    #[test]
    fn test_validate() {
        let catalog = catalog();
        let mut entry = EntryNode::new();
        entry.set_property(PropertyState::single("rep:owner", Value::String("me".into())));
        entry.set_property(PropertyState::single("other:restriction", Value::Long(1)));
        assert!(catalog.validate(Some("/test"), &entry).is_ok());

        entry.set_property(PropertyState::single("rep:glob", Value::Long(1)));
        assert!(catalog.validate(Some("/test"), &entry).is_err());

        entry.set_property(PropertyState::single("rep:glob", Value::String("*".into())));
        assert!(catalog.validate(Some("/test"), &entry).is_ok());
        assert!(catalog.validate(None, &entry).is_err());

        entry.set_property(PropertyState::single("rep:itemNames", Value::Name("a".into())));
        assert!(catalog.validate(Some("/test"), &entry).is_err());

        let mut without_owner = EntryNode::new();
        without_owner.set_property(PropertyState::single("rep:glob", Value::String("*".into())));
        let err = catalog.validate(Some("/test"), &without_owner).unwrap_err();
        assert!(matches!(err, AccessControlError::InvalidRestriction { name, .. } if name == "rep:owner"));
    }
}
