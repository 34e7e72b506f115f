//! Immutable node and property states
//!
//! Node states are shared through `Arc`, so cloning a state or a subtree is
//! cheap. A *missing* state stands in for nodes that do not exist.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::path;

/// Property name carrying the primary node type
pub const JCR_PRIMARY_TYPE: &str = "jcr:primaryType";

/// Default primary type for nodes created without one
pub const NT_UNSTRUCTURED: &str = "nt:unstructured";

/// Type of a property value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Name,
    Path,
    Long,
    Boolean,
}

/// A single typed property value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    String(String),
    Name(String),
    Path(String),
    Long(i64),
    Boolean(bool),
}

impl Value {
    /// Type of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::String(_) => ValueType::String,
            Value::Name(_) => ValueType::Name,
            Value::Path(_) => ValueType::Path,
            Value::Long(_) => ValueType::Long,
            Value::Boolean(_) => ValueType::Boolean,
        }
    }

    /// String content for the string-like types
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Name(s) | Value::Path(s) => Some(s),
            Value::Long(_) | Value::Boolean(_) => None,
        }
    }

    /// Parse `raw` as a value of the given type
    pub fn parse(value_type: ValueType, raw: &str) -> Option<Self> {
        match value_type {
            ValueType::String => Some(Value::String(raw.to_string())),
            ValueType::Name => Some(Value::Name(raw.to_string())),
            ValueType::Path => Some(Value::Path(raw.to_string())),
            ValueType::Long => raw.parse().ok().map(Value::Long),
            ValueType::Boolean => raw.parse().ok().map(Value::Boolean),
        }
    }
}

/// A named property with one or more values
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyState {
    name: String,
    values: Vec<Value>,
    multi_valued: bool,
}

impl PropertyState {
    /// Create a single-valued property
    pub fn single(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            values: vec![value],
            multi_valued: false,
        }
    }

    /// Create a multi-valued property
    pub fn multi(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
            multi_valued: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// First value, the only one for single-valued properties
    pub fn value(&self) -> Option<&Value> {
        self.values.first()
    }

    pub fn is_multi_valued(&self) -> bool {
        self.multi_valued
    }

    /// Type of the values, `None` for an empty multi-valued property
    pub fn value_type(&self) -> Option<ValueType> {
        self.values.first().map(Value::value_type)
    }
}

#[derive(Debug, Default)]
struct NodeData {
    properties: BTreeMap<String, PropertyState>,
    children: BTreeMap<String, NodeState>,
}

/// Immutable state of a node
#[derive(Debug, Clone, Default)]
pub struct NodeState {
    data: Option<Arc<NodeData>>,
}

impl NodeState {
    /// State of a node that does not exist
    pub fn missing() -> Self {
        Self { data: None }
    }

    /// Start building a new node state
    pub fn builder() -> NodeBuilder {
        NodeBuilder::new()
    }

    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    /// Child state, missing if no such child exists
    pub fn child(&self, name: &str) -> NodeState {
        self.data
            .as_ref()
            .and_then(|d| d.children.get(name).cloned())
            .unwrap_or_default()
    }

    pub fn property(&self, name: &str) -> Option<&PropertyState> {
        self.data.as_ref().and_then(|d| d.properties.get(name))
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertyState> {
        self.data.iter().flat_map(|d| d.properties.values())
    }

    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.data
            .iter()
            .flat_map(|d| d.children.keys().map(String::as_str))
    }
}

/// Mutable builder producing a [`NodeState`]
#[derive(Debug, Default)]
pub struct NodeBuilder {
    properties: BTreeMap<String, PropertyState>,
    children: BTreeMap<String, NodeBuilder>,
}

impl NodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing any existing one with the same name
    pub fn set_property(&mut self, property: PropertyState) -> &mut Self {
        self.properties.insert(property.name().to_string(), property);
        self
    }

    /// Get or create the named child
    pub fn child(&mut self, name: &str) -> &mut NodeBuilder {
        self.children.entry(name.to_string()).or_insert_with(|| {
            let mut child = NodeBuilder::new();
            child.set_property(PropertyState::single(
                JCR_PRIMARY_TYPE,
                Value::Name(NT_UNSTRUCTURED.to_string()),
            ));
            child
        })
    }

    /// Get or create every node along an absolute path
    pub fn add_path(&mut self, absolute_path: &str) -> &mut NodeBuilder {
        path::elements(absolute_path).fold(self, |node, name| node.child(name))
    }

    /// Freeze the builder into an immutable state
    pub fn build(self) -> NodeState {
        let children = self
            .children
            .into_iter()
            .map(|(name, child)| (name, child.build()))
            .collect();
        NodeState {
            data: Some(Arc::new(NodeData {
                properties: self.properties,
                children,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_state() {
        let state = NodeState::missing();
        assert!(!state.exists());
        assert!(!state.child("any").exists());
        assert!(state.property(JCR_PRIMARY_TYPE).is_none());
    }

    #[test]
    fn test_builder_creates_intermediate_nodes() {
        let mut builder = NodeState::builder();
        builder.add_path("/test/a/b");
        let root = builder.build();

        let b = root.child("test").child("a").child("b");
        assert!(b.exists());
        assert_eq!(
            b.property(JCR_PRIMARY_TYPE).and_then(|p| p.value()),
            Some(&Value::Name(NT_UNSTRUCTURED.to_string()))
        );
        assert!(!root.child("test2").exists());
    }

    #[test]
    fn test_value_parse() {
        assert_eq!(Value::parse(ValueType::Long, "42"), Some(Value::Long(42)));
        assert_eq!(Value::parse(ValueType::Boolean, "nope"), None);
        assert_eq!(
            Value::parse(ValueType::Name, "jcr:content"),
            Some(Value::Name("jcr:content".to_string()))
        );
    }
}
