//! # JSON:API Document Transformer
//!
//! Same algorithm as the HAL transformer — pre-serialization, embedding
//! test, link synthesis, post-serialization — with JSON:API placement:
//! primary data under `data` as `type`/`id`/`attributes`, qualifying child
//! resources become `relationships.<name>.data` references with the full
//! resource object pushed into `included`, links under `links`, metadata
//! under `meta`.
//!
//! `included` is deduplicated by `(type, id)`; relationship references are
//! not.

use std::collections::HashSet;

use hyperdoc_core::Node;
use hyperdoc_mapping::{Mapping, MappingRegistry};
use serde_json::{json, Map, Value};
use tracing::trace;

use crate::hal::{FIRST_LINK, LAST_LINK, NEXT_LINK, PREV_LINK, SELF_LINK};
use crate::links::{resolve_template, Link};
use crate::rewrite;
use crate::TransformError;

/// Reserved top-level and resource-object keys.
pub const DATA_KEY: &str = "data";
pub const TYPE_KEY: &str = "type";
pub const ID_KEY: &str = "id";
pub const ATTRIBUTES_KEY: &str = "attributes";
pub const RELATIONSHIPS_KEY: &str = "relationships";
pub const INCLUDED_KEY: &str = "included";
pub const LINKS_KEY: &str = "links";
pub const META_KEY: &str = "meta";

/// Transformer producing JSON:API documents from tagged object-graph nodes.
#[derive(Debug, Clone)]
pub struct JsonApiTransformer<'a> {
    registry: &'a MappingRegistry,
    meta: Map<String, Value>,
    pagination: Vec<(&'static str, Link)>,
}

impl<'a> JsonApiTransformer<'a> {
    /// Create a transformer over the given registry.
    pub fn new(registry: &'a MappingRegistry) -> Self {
        Self {
            registry,
            meta: Map::new(),
            pagination: Vec::new(),
        }
    }

    /// Attach one metadata entry to the top-level document.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Attach a pagination `first` link to the top-level document.
    #[must_use]
    pub fn with_first_url(self, href: impl Into<String>) -> Self {
        self.pagination_link(FIRST_LINK, href)
    }

    /// Attach a pagination `last` link to the top-level document.
    #[must_use]
    pub fn with_last_url(self, href: impl Into<String>) -> Self {
        self.pagination_link(LAST_LINK, href)
    }

    /// Attach a pagination `prev` link to the top-level document.
    #[must_use]
    pub fn with_prev_url(self, href: impl Into<String>) -> Self {
        self.pagination_link(PREV_LINK, href)
    }

    /// Attach a pagination `next` link to the top-level document.
    #[must_use]
    pub fn with_next_url(self, href: impl Into<String>) -> Self {
        self.pagination_link(NEXT_LINK, href)
    }

    fn pagination_link(mut self, name: &'static str, href: impl Into<String>) -> Self {
        self.pagination.push((name, Link::new(href)));
        self
    }

    /// Transform a node into final UTF-8 JSON text.
    pub fn serialize(&self, node: &Node) -> Result<String, TransformError> {
        let document = self.to_document(node)?;
        Ok(serde_json::to_string(&document)?)
    }

    /// Transform a node into a JSON:API document tree.
    ///
    /// # Errors
    ///
    /// [`TransformError::NoMappings`] with an empty registry (before any
    /// traversal), [`TransformError::MissingIdValue`] when a resource id or
    /// link template cannot be resolved.
    pub fn to_document(&self, node: &Node) -> Result<Value, TransformError> {
        if self.registry.is_empty() {
            return Err(TransformError::NoMappings);
        }
        trace!(class = node.class().unwrap_or(""), "jsonapi transform");

        let mut node = node.clone();
        rewrite::pre_serialize(self.registry, &mut node);

        let mut included = Vec::new();
        let mut seen = HashSet::new();
        let (data, primary_self) = match &node {
            Node::Collection(elements) => {
                let resources = elements
                    .iter()
                    .map(|element| self.resource_object(element, &mut included, &mut seen))
                    .collect::<Result<Vec<_>, _>>()?;
                (Value::Array(resources), None)
            }
            _ => {
                let resource = self.resource_object(&node, &mut included, &mut seen)?;
                let self_link = resource
                    .get(LINKS_KEY)
                    .and_then(|links| links.get(SELF_LINK))
                    .cloned();
                (resource, self_link)
            }
        };

        let mut document = Map::new();
        document.insert(DATA_KEY.to_owned(), data);
        if !included.is_empty() {
            document.insert(INCLUDED_KEY.to_owned(), Value::Array(included));
        }

        // Top-level links: primary self first, pagination after; first
        // occurrence of a name wins.
        let mut links = Map::new();
        if let Some(self_link) = primary_self {
            links.insert(SELF_LINK.to_owned(), self_link);
        }
        for (name, link) in &self.pagination {
            links
                .entry((*name).to_owned())
                .or_insert_with(|| link.to_value());
        }
        if !links.is_empty() {
            document.insert(LINKS_KEY.to_owned(), Value::Object(links));
        }

        if !self.meta.is_empty() {
            document.insert(META_KEY.to_owned(), Value::Object(self.meta.clone()));
        }

        let mut document = Value::Object(document);
        rewrite::strip_marker_keys(&mut document);
        rewrite::format_scalar_values(&mut document);
        rewrite::keys_to_snake_case(&mut document);
        Ok(document)
    }

    /// Build one resource object, pushing related resources into `included`.
    fn resource_object(
        &self,
        node: &Node,
        included: &mut Vec<Value>,
        seen: &mut HashSet<(String, String)>,
    ) -> Result<Value, TransformError> {
        let Node::Object { class, properties } = node else {
            return Ok(plain_value(node));
        };
        let mapping = self.registry.by_class_identifier(class);

        let type_name = mapping.map_or(class.as_str(), Mapping::alias).to_owned();
        let mut attributes = Map::new();
        let mut relationships = Map::new();

        for (name, child) in properties {
            match child {
                Node::Object {
                    class: child_class, ..
                } => {
                    if let Some(child_mapping) = self.registry.by_class_identifier(child_class) {
                        if !child_mapping.is_id_property(name) {
                            let reference = self.push_included(child, child_mapping, included, seen)?;
                            relationships.insert(name.clone(), json!({ DATA_KEY: reference }));
                            continue;
                        }
                    }
                    attributes.insert(name.clone(), plain_value(child));
                }
                Node::Collection(elements) => {
                    // The property becomes a to-many relationship only when
                    // every element passes the embedding test.
                    let element_mappings: Option<Vec<&Mapping>> = if elements.is_empty() {
                        None
                    } else {
                        elements
                            .iter()
                            .map(|element| {
                                element
                                    .class()
                                    .and_then(|c| self.registry.by_class_identifier(c))
                                    .filter(|m| !m.is_id_property(name))
                            })
                            .collect()
                    };
                    if let Some(element_mappings) = element_mappings {
                        let mut references = Vec::with_capacity(elements.len());
                        for (element, element_mapping) in elements.iter().zip(element_mappings) {
                            references
                                .push(self.push_included(element, element_mapping, included, seen)?);
                        }
                        relationships
                            .insert(name.clone(), json!({ DATA_KEY: Value::Array(references) }));
                    } else {
                        attributes.insert(name.clone(), plain_value(child));
                    }
                }
                Node::Scalar(value) => {
                    // Id properties live in the `id` member, not attributes.
                    let is_id = mapping
                        .is_some_and(|m| m.is_id_property(m.internal_name(name)));
                    if !is_id {
                        attributes.insert(name.clone(), value.clone());
                    }
                }
            }
        }

        // Single-attribute shorthand applies inside attribute values.
        for value in attributes.values_mut() {
            rewrite::flatten_single_key_scalars(value, &[]);
        }

        let mut resource = Map::new();
        resource.insert(TYPE_KEY.to_owned(), Value::String(type_name));
        if let Some(mapping) = mapping {
            resource.insert(
                ID_KEY.to_owned(),
                Value::String(resource_id(mapping, node)?),
            );
        }
        if !attributes.is_empty() {
            resource.insert(ATTRIBUTES_KEY.to_owned(), Value::Object(attributes));
        }
        if !relationships.is_empty() {
            resource.insert(RELATIONSHIPS_KEY.to_owned(), Value::Object(relationships));
        }

        if let Some(mapping) = mapping {
            let mut links = Map::new();
            if !mapping.resource_url_template().is_empty() {
                let href = resolve_template(mapping.resource_url_template(), mapping, node)?;
                links.insert(SELF_LINK.to_owned(), Link::new(href).to_value());
            }
            for (name, template) in mapping.additional_url_templates() {
                let href = resolve_template(template, mapping, node)?;
                links
                    .entry(name.clone())
                    .or_insert_with(|| Link::new(href).to_value());
            }
            if !links.is_empty() {
                resource.insert(LINKS_KEY.to_owned(), Value::Object(links));
            }
        }

        Ok(Value::Object(resource))
    }

    /// Push a related resource into `included` (deduplicated by type and
    /// id) and return its `{type, id}` reference.
    fn push_included(
        &self,
        node: &Node,
        mapping: &Mapping,
        included: &mut Vec<Value>,
        seen: &mut HashSet<(String, String)>,
    ) -> Result<Value, TransformError> {
        let id = resource_id(mapping, node)?;
        let type_name = mapping.alias().to_owned();
        let reference = json!({ TYPE_KEY: type_name.clone(), ID_KEY: id.clone() });
        if seen.insert((type_name, id)) {
            let resource = self.resource_object(node, included, seen)?;
            included.push(resource);
        }
        Ok(reference)
    }
}

/// Stringified id of a resource: its id-property values joined with `.`,
/// in mapping-declared order.
fn resource_id(mapping: &Mapping, node: &Node) -> Result<String, TransformError> {
    let mut parts = Vec::with_capacity(mapping.id_properties().len());
    for id_property in mapping.id_properties() {
        let value = node
            .property(id_property)
            .or_else(|| node.property(mapping.public_name(id_property)))
            .and_then(|child| match child {
                Node::Scalar(Value::String(s)) => Some(s.clone()),
                Node::Scalar(Value::Number(n)) => Some(n.to_string()),
                Node::Scalar(Value::Bool(b)) => Some(b.to_string()),
                _ => None,
            })
            .ok_or_else(|| TransformError::MissingIdValue {
                class: node.class().unwrap_or_default().to_owned(),
                property: id_property.clone(),
            })?;
        parts.push(value);
    }
    Ok(parts.join("."))
}

/// Render a node as a plain attribute value: no markers, no links.
fn plain_value(node: &Node) -> Value {
    match node {
        Node::Scalar(value) => value.clone(),
        Node::Object { properties, .. } => {
            let mut map = Map::new();
            for (name, child) in properties {
                map.insert(name.clone(), plain_value(child));
            }
            Value::Object(map)
        }
        Node::Collection(elements) => {
            Value::Array(elements.iter().map(plain_value).collect())
        }
    }
}
