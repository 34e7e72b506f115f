//! Restriction storage of an access-control entry

use std::collections::BTreeMap;

use crate::tree::node::JCR_PRIMARY_TYPE;
use crate::tree::{PropertyState, Tree};

/// Child node of an entry holding its restriction properties
pub const REP_RESTRICTIONS: &str = "rep:restrictions";

/// Restriction properties stored with one access-control entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryNode {
    properties: BTreeMap<String, PropertyState>,
}

impl EntryNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the restrictions stored below an entry tree
    pub fn from_tree(entry: &Tree) -> Self {
        let properties = entry
            .child(REP_RESTRICTIONS)
            .state()
            .properties()
            .filter(|p| p.name() != JCR_PRIMARY_TYPE)
            .map(|p| (p.name().to_string(), p.clone()))
            .collect();
        Self { properties }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyState> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertyState> {
        self.properties.values()
    }

    pub fn set_property(&mut self, property: PropertyState) {
        self.properties.insert(property.name().to_string(), property);
    }

    pub fn remove_property(&mut self, name: &str) -> Option<PropertyState> {
        self.properties.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
