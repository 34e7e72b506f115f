//! Restriction definitions and restriction values

use serde::{Deserialize, Serialize};

use crate::tree::{PropertyState, ValueType};

/// Declares a restriction kind: its name, value type and multiplicity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RestrictionDefinition {
    name: String,
    value_type: ValueType,
    #[serde(default)]
    multi_valued: bool,
    #[serde(default)]
    mandatory: bool,
}

impl RestrictionDefinition {
    pub fn new(name: impl Into<String>, value_type: ValueType, multi_valued: bool) -> Self {
        Self {
            name: name.into(),
            value_type,
            multi_valued,
            mandatory: false,
        }
    }

    /// Require the restriction on every entry
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn is_multi_valued(&self) -> bool {
        self.multi_valued
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }
}

/// A restriction value bound to an access-control entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Restriction {
    definition: RestrictionDefinition,
    property: PropertyState,
}

impl Restriction {
    pub fn new(definition: RestrictionDefinition, property: PropertyState) -> Self {
        Self {
            definition,
            property,
        }
    }

    pub fn definition(&self) -> &RestrictionDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn property(&self) -> &PropertyState {
        &self.property
    }
}
