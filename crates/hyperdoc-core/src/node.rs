//! # Generic Object-Graph Nodes
//!
//! The wire shape produced by the upstream serializer reserves exactly three
//! marker keys, and this engine depends on those three and nothing else about
//! the serializer's internals:
//!
//! - [`CLASS_IDENTIFIER_KEY`] (`@type`) — an object node, tagged with the
//!   resource class it was serialized from.
//! - [`MAP_MARKER_KEY`] (`@map`) — a collection wrapper,
//!   `{"@map": true, "@value": [...]}`, holding an ordered sequence.
//! - [`SCALAR_MARKER_KEY`] (`@scalar`) — a scalar value holder,
//!   `{"@scalar": true, "@value": <scalar>}`.
//!
//! [`Node::from_wire`] parses that shape into the [`Node`] enum once, at the
//! boundary. Everything downstream dispatches on the variant tag.

use serde_json::Value;
use thiserror::Error;

/// Wire key naming the class an object node was serialized from.
pub const CLASS_IDENTIFIER_KEY: &str = "@type";

/// Wire key marking a collection wrapper.
pub const MAP_MARKER_KEY: &str = "@map";

/// Wire key marking a scalar value holder.
pub const SCALAR_MARKER_KEY: &str = "@scalar";

/// Wire key holding the payload of a collection wrapper or scalar holder.
pub const SCALAR_VALUE_KEY: &str = "@value";

/// Error parsing the serializer's wire shape into a [`Node`].
#[derive(Error, Debug)]
pub enum NodeError {
    /// A collection wrapper had no `@value` element list.
    #[error("collection wrapper at '{0}' is missing its '@value' element list")]
    MissingCollectionValues(String),

    /// A scalar holder had no `@value` member, or held a non-scalar.
    #[error("scalar holder at '{0}' does not hold a scalar '@value'")]
    InvalidScalarHolder(String),

    /// An object carried none of the three reserved markers.
    #[error("object at '{0}' carries no class identifier")]
    UntaggedObject(String),

    /// A scalar variant was constructed around a non-scalar JSON value.
    #[error("scalar node holds a non-scalar value")]
    NonScalarValue,
}

/// One node of the serializer's object graph.
///
/// The three variants mirror the three wire shapes: bare scalars (or scalar
/// holders), class-tagged objects with an ordered property map, and ordered
/// collections. Property order is preserved from the wire so that document
/// output tracks the order the serializer emitted.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A JSON scalar: string, number, boolean, or null.
    Scalar(Value),
    /// A class-tagged object with ordered properties.
    Object {
        /// Class identifier, matching a mapping alias or source class name.
        class: String,
        /// Property name → child node, in wire order.
        properties: Vec<(String, Node)>,
    },
    /// An ordered sequence of nodes (same or mixed types).
    Collection(Vec<Node>),
}

impl Node {
    /// Construct a scalar node.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::NonScalarValue`] if the value is an array or
    /// object; those must be modeled as [`Node::Collection`] or
    /// [`Node::Object`].
    pub fn scalar(value: impl Into<Value>) -> Result<Self, NodeError> {
        let value = value.into();
        if value.is_array() || value.is_object() {
            return Err(NodeError::NonScalarValue);
        }
        Ok(Node::Scalar(value))
    }

    /// Construct an empty object node tagged with the given class.
    pub fn object(class: impl Into<String>) -> Self {
        Node::Object {
            class: class.into(),
            properties: Vec::new(),
        }
    }

    /// Append a property to an object node (no-op on other variants).
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, child: Node) -> Self {
        if let Node::Object { properties, .. } = &mut self {
            properties.push((name.into(), child));
        }
        self
    }

    /// Append a scalar property to an object node (no-op on other variants).
    ///
    /// Convenience for the common case; non-scalar values are rejected by
    /// [`Node::scalar`], so this takes raw JSON scalars only.
    #[must_use]
    pub fn with_scalar(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_property(name, Node::Scalar(value.into()))
    }

    /// The class identifier, for object nodes.
    pub fn class(&self) -> Option<&str> {
        match self {
            Node::Object { class, .. } => Some(class),
            _ => None,
        }
    }

    /// Look up a property of an object node by name.
    pub fn property(&self, name: &str) -> Option<&Node> {
        match self {
            Node::Object { properties, .. } => properties
                .iter()
                .find(|(key, _)| key.as_str() == name)
                .map(|(_, child)| child),
            _ => None,
        }
    }

    /// True for the scalar variant.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Node::Scalar(_))
    }

    /// Parse the serializer's wire shape into a node tree.
    ///
    /// Bare JSON scalars and bare arrays are accepted alongside the explicit
    /// scalar-holder and collection-wrapper shapes; objects must carry one of
    /// the reserved markers.
    ///
    /// # Errors
    ///
    /// Returns a [`NodeError`] naming the offending path if a wrapper is
    /// malformed or an object is untagged.
    pub fn from_wire(value: &Value) -> Result<Self, NodeError> {
        Self::from_wire_at(value, "$")
    }

    fn from_wire_at(value: &Value, path: &str) -> Result<Self, NodeError> {
        match value {
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                Ok(Node::Scalar(value.clone()))
            }
            Value::Array(elements) => {
                let mut nodes = Vec::with_capacity(elements.len());
                for (index, element) in elements.iter().enumerate() {
                    nodes.push(Self::from_wire_at(element, &format!("{path}[{index}]"))?);
                }
                Ok(Node::Collection(nodes))
            }
            Value::Object(map) => {
                if map.contains_key(MAP_MARKER_KEY) {
                    let elements = map
                        .get(SCALAR_VALUE_KEY)
                        .and_then(Value::as_array)
                        .ok_or_else(|| NodeError::MissingCollectionValues(path.to_owned()))?;
                    let mut nodes = Vec::with_capacity(elements.len());
                    for (index, element) in elements.iter().enumerate() {
                        nodes.push(Self::from_wire_at(element, &format!("{path}[{index}]"))?);
                    }
                    return Ok(Node::Collection(nodes));
                }

                if map.contains_key(SCALAR_MARKER_KEY) {
                    let scalar = map
                        .get(SCALAR_VALUE_KEY)
                        .filter(|v| !v.is_array() && !v.is_object())
                        .ok_or_else(|| NodeError::InvalidScalarHolder(path.to_owned()))?;
                    return Ok(Node::Scalar(scalar.clone()));
                }

                let class = map
                    .get(CLASS_IDENTIFIER_KEY)
                    .and_then(Value::as_str)
                    .ok_or_else(|| NodeError::UntaggedObject(path.to_owned()))?
                    .to_owned();

                let mut properties = Vec::new();
                for (key, child) in map {
                    if key.as_str() == CLASS_IDENTIFIER_KEY {
                        continue;
                    }
                    properties.push((
                        key.clone(),
                        Self::from_wire_at(child, &format!("{path}.{key}"))?,
                    ));
                }
                Ok(Node::Object { class, properties })
            }
        }
    }

    /// Render the node back into the serializer's wire shape.
    pub fn to_wire(&self) -> Value {
        match self {
            Node::Scalar(value) => value.clone(),
            Node::Object { class, properties } => {
                let mut map = serde_json::Map::new();
                map.insert(CLASS_IDENTIFIER_KEY.to_owned(), Value::String(class.clone()));
                for (key, child) in properties {
                    map.insert(key.clone(), child.to_wire());
                }
                Value::Object(map)
            }
            Node::Collection(elements) => {
                let mut map = serde_json::Map::new();
                map.insert(MAP_MARKER_KEY.to_owned(), Value::Bool(true));
                map.insert(
                    SCALAR_VALUE_KEY.to_owned(),
                    Value::Array(elements.iter().map(Node::to_wire).collect()),
                );
                Value::Object(map)
            }
        }
    }
}
