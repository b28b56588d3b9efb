//! # HAL Document Transformer
//!
//! Produces HAL-shaped documents: resource attributes at the top level,
//! promoted child resources under [`EMBEDDED_KEY`], links under
//! [`LINKS_KEY`], caller metadata under [`META_KEY`].
//!
//! ## Embedding rule
//!
//! A child property qualifies for embedding when its value is a class-tagged
//! object with a registered mapping and the property name is not one of that
//! mapping's id properties. Qualifying children move to the embedded
//! section, gain a self link resolved from their mapping's URL template, and
//! mirror that self link onto the parent's links section under the property
//! name. Collections apply the same test per element, preserving order; a
//! collection mixing qualifying and unqualified elements embeds the
//! qualifying ones keyed by their original positions and drops the rest.
//!
//! ## Links precedence
//!
//! A node's links section is the union of default links (self, plus
//! pagination links at the top level), links mirrored from embedding, and
//! mapping-declared additional links — in that order, first occurrence of a
//! name wins. An empty links section is omitted.

use hyperdoc_core::Node;
use hyperdoc_mapping::MappingRegistry;
use serde_json::{Map, Value};
use tracing::trace;

use crate::links::{resolve_template, Link};
use crate::rewrite;
use crate::TransformError;

/// Reserved key for embedded resources.
pub const EMBEDDED_KEY: &str = "_embedded";
/// Reserved key for the links section.
pub const LINKS_KEY: &str = "_links";
/// Reserved key for caller-supplied metadata.
pub const META_KEY: &str = "_meta";

/// Canonical self link name.
pub const SELF_LINK: &str = "self";
/// Pagination link names.
pub const FIRST_LINK: &str = "first";
pub const LAST_LINK: &str = "last";
pub const PREV_LINK: &str = "prev";
pub const NEXT_LINK: &str = "next";

/// Transformer producing HAL documents from tagged object-graph nodes.
///
/// Holds a shared reference to the read-only registry; construction is
/// cheap and per-request. Metadata and pagination links are optional and
/// attach to the top-level document; a collection root, having no wrapper
/// object, attaches them to every element document.
#[derive(Debug, Clone)]
pub struct HalTransformer<'a> {
    registry: &'a MappingRegistry,
    meta: Map<String, Value>,
    pagination: Vec<(&'static str, Link)>,
}

impl<'a> HalTransformer<'a> {
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
    ///
    /// # Errors
    ///
    /// [`TransformError::NoMappings`] with an empty registry (before any
    /// traversal), [`TransformError::MissingIdValue`] when a link template
    /// cannot be resolved.
    pub fn serialize(&self, node: &Node) -> Result<String, TransformError> {
        let document = self.to_document(node)?;
        Ok(serde_json::to_string(&document)?)
    }

    /// Transform a node into a HAL document tree.
    ///
    /// Top-level collections serialize element-wise into a JSON array,
    /// each element carrying the pagination links and metadata; everything
    /// else produces one document.
    pub fn to_document(&self, node: &Node) -> Result<Value, TransformError> {
        if self.registry.is_empty() {
            return Err(TransformError::NoMappings);
        }
        trace!(class = node.class().unwrap_or(""), "hal transform");
        match node {
            Node::Collection(elements) => {
                // An array root has no wrapper object, so pagination links
                // and metadata attach to every element document.
                let documents = elements
                    .iter()
                    .map(|element| self.object_document(element, true))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(documents))
            }
            _ => self.object_document(node, true),
        }
    }

    /// Run the three phases over one node.
    fn object_document(&self, node: &Node, top_level: bool) -> Result<Value, TransformError> {
        let mut node = node.clone();
        rewrite::pre_serialize(self.registry, &mut node);

        let pagination = if top_level && !self.pagination.is_empty() {
            Some(self.pagination.as_slice())
        } else {
            None
        };
        let mut document = self.render(&node, pagination)?;

        rewrite::strip_marker_keys(&mut document);
        rewrite::format_scalar_values(&mut document);
        rewrite::flatten_single_key_scalars(&mut document, &[LINKS_KEY]);
        rewrite::keys_to_snake_case(&mut document);

        if top_level && !self.meta.is_empty() {
            if let Value::Object(map) = &mut document {
                map.insert(META_KEY.to_owned(), Value::Object(self.meta.clone()));
            }
        }
        Ok(document)
    }

    fn render(
        &self,
        node: &Node,
        pagination: Option<&[(&'static str, Link)]>,
    ) -> Result<Value, TransformError> {
        match node {
            Node::Scalar(value) => Ok(value.clone()),
            Node::Collection(elements) => {
                let rendered = elements
                    .iter()
                    .map(|element| self.render(element, None))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(rendered))
            }
            Node::Object { .. } => self.render_object(node, pagination),
        }
    }

    fn render_object(
        &self,
        node: &Node,
        pagination: Option<&[(&'static str, Link)]>,
    ) -> Result<Value, TransformError> {
        let Node::Object { class, properties } = node else {
            // render() only routes object variants here.
            return Ok(Value::Null);
        };
        let mapping = self.registry.by_class_identifier(class);

        let mut out = Map::new();
        let mut embedded = Map::new();
        let mut mirrored: Vec<(String, Value)> = Vec::new();

        for (name, child) in properties {
            match child {
                Node::Object {
                    class: child_class, ..
                } => {
                    if let Some(child_mapping) = self.registry.by_class_identifier(child_class) {
                        if !child_mapping.is_id_property(name) {
                            let rendered = self.render(child, None)?;
                            let self_href = resolve_template(
                                child_mapping.resource_url_template(),
                                child_mapping,
                                child,
                            )?;
                            mirrored.push((name.clone(), Link::new(self_href).to_value()));
                            embedded.insert(name.clone(), rendered);
                            continue;
                        }
                    }
                    out.insert(name.clone(), self.render(child, None)?);
                }
                Node::Collection(elements) => {
                    let mut qualifying: Vec<(usize, Value)> = Vec::new();
                    for (index, element) in elements.iter().enumerate() {
                        let qualifies = element
                            .class()
                            .and_then(|c| self.registry.by_class_identifier(c))
                            .is_some_and(|m| !m.is_id_property(name));
                        if qualifies {
                            qualifying.push((index, self.render(element, None)?));
                        }
                    }
                    if qualifying.is_empty() {
                        let rendered = elements
                            .iter()
                            .map(|element| self.render(element, None))
                            .collect::<Result<Vec<_>, _>>()?;
                        out.insert(name.clone(), Value::Array(rendered));
                    } else if qualifying.len() == elements.len() {
                        // Once elements embed, the inline property is removed.
                        let documents = qualifying.into_iter().map(|(_, v)| v).collect();
                        embedded.insert(name.clone(), Value::Array(documents));
                    } else {
                        // Mixed collections embed under the original element
                        // positions; elements without a mapping are dropped
                        // from the document.
                        trace!(property = %name, "dropping unmapped elements from embedded collection");
                        let documents: Map<String, Value> = qualifying
                            .into_iter()
                            .map(|(index, value)| (index.to_string(), value))
                            .collect();
                        embedded.insert(name.clone(), Value::Object(documents));
                    }
                }
                Node::Scalar(value) => {
                    out.insert(name.clone(), value.clone());
                }
            }
        }

        if !embedded.is_empty() {
            out.insert(EMBEDDED_KEY.to_owned(), Value::Object(embedded));
        }

        // Links precedence: default links, mirrored links, additional links.
        let mut links = Map::new();
        if let Some(mapping) = mapping {
            if !mapping.resource_url_template().is_empty() {
                let href = resolve_template(mapping.resource_url_template(), mapping, node)?;
                links.insert(SELF_LINK.to_owned(), Link::new(href).to_value());
            }
        }
        if let Some(pagination) = pagination {
            for (name, link) in pagination {
                links
                    .entry((*name).to_owned())
                    .or_insert_with(|| link.to_value());
            }
        }
        for (name, link) in mirrored {
            links.entry(name).or_insert(link);
        }
        if let Some(mapping) = mapping {
            for (name, template) in mapping.additional_url_templates() {
                let href = resolve_template(template, mapping, node)?;
                links
                    .entry(name.clone())
                    .or_insert_with(|| Link::new(href).to_value());
            }
        }
        if !links.is_empty() {
            out.insert(LINKS_KEY.to_owned(), Value::Object(links));
        }

        Ok(Value::Object(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperdoc_mapping::Mapping;
    use serde_json::json;

    fn registry() -> MappingRegistry {
        let widget = Mapping::builder("widget", "app::model::Widget")
            .properties(["id", "name", "owner"])
            .id_properties(["id"])
            .resource_url("/widgets/{id}")
            .build()
            .unwrap();
        let user = Mapping::builder("user", "app::model::User")
            .properties(["id", "name"])
            .id_properties(["id"])
            .resource_url("/users/{id}")
            .build()
            .unwrap();
        MappingRegistry::new(vec![widget, user]).unwrap()
    }

    fn widget_with_owner() -> Node {
        Node::object("widget")
            .with_scalar("id", "7")
            .with_scalar("name", "Bolt")
            .with_property(
                "owner",
                Node::object("user")
                    .with_scalar("id", "3")
                    .with_scalar("name", "Ann"),
            )
    }

    #[test]
    fn empty_registry_fails_before_traversal() {
        let registry = MappingRegistry::new(vec![]).unwrap();
        let transformer = HalTransformer::new(&registry);
        let err = transformer.to_document(&widget_with_owner()).unwrap_err();
        assert!(matches!(err, TransformError::NoMappings));
    }

    #[test]
    fn embeds_child_resource_and_mirrors_its_self_link() {
        let registry = registry();
        let document = HalTransformer::new(&registry)
            .to_document(&widget_with_owner())
            .unwrap();

        assert_eq!(document["id"], "7");
        assert_eq!(document["name"], "Bolt");
        // The inline property is gone; the child lives under _embedded with
        // its own self link.
        assert!(document.get("owner").is_none());
        assert_eq!(document["_embedded"]["owner"]["id"], "3");
        assert_eq!(document["_embedded"]["owner"]["name"], "Ann");
        assert_eq!(
            document["_embedded"]["owner"]["_links"]["self"]["href"],
            "/users/3"
        );
        // The parent mirrors the child's self link under the property name.
        assert_eq!(document["_links"]["owner"]["href"], "/users/3");
        assert_eq!(document["_links"]["self"]["href"], "/widgets/7");
    }

    #[test]
    fn embeds_collection_elements_in_order() {
        let registry = registry();
        let node = Node::object("widget")
            .with_scalar("id", "7")
            .with_property(
                "owner",
                Node::Collection(vec![
                    Node::object("user").with_scalar("id", "1").with_scalar("name", "Ann"),
                    Node::object("user").with_scalar("id", "2").with_scalar("name", "Bob"),
                ]),
            );
        let document = HalTransformer::new(&registry).to_document(&node).unwrap();

        let owners = document["_embedded"]["owner"].as_array().unwrap();
        assert_eq!(owners.len(), 2);
        assert_eq!(owners[0]["name"], "Ann");
        assert_eq!(owners[0]["_links"]["self"]["href"], "/users/1");
        assert_eq!(owners[1]["_links"]["self"]["href"], "/users/2");
        assert!(document.get("owner").is_none());
    }

    #[test]
    fn renames_aliased_properties_before_embedding() {
        let widget = Mapping::builder("widget", "app::model::Widget")
            .properties(["id", "name"])
            .aliased("name", "title")
            .id_properties(["id"])
            .resource_url("/widgets/{id}")
            .build()
            .unwrap();
        let registry = MappingRegistry::new(vec![widget]).unwrap();
        let node = Node::object("widget")
            .with_scalar("id", "7")
            .with_scalar("name", "Bolt");
        let document = HalTransformer::new(&registry).to_document(&node).unwrap();
        assert!(document.get("name").is_none());
        assert_eq!(document["title"], "Bolt");
    }

    #[test]
    fn hides_properties_marked_hidden() {
        let widget = Mapping::builder("widget", "app::model::Widget")
            .properties(["id", "name", "secret"])
            .hidden(["secret"])
            .id_properties(["id"])
            .resource_url("/widgets/{id}")
            .build()
            .unwrap();
        let registry = MappingRegistry::new(vec![widget]).unwrap();
        let node = Node::object("widget")
            .with_scalar("id", "7")
            .with_scalar("secret", "s3cret")
            .with_scalar("name", "Bolt");
        let document = HalTransformer::new(&registry).to_document(&node).unwrap();
        assert!(document.get("secret").is_none());
        assert_eq!(document["name"], "Bolt");
    }

    #[test]
    fn additional_links_do_not_override_default_or_mirrored_names() {
        let widget = Mapping::builder("widget", "app::model::Widget")
            .properties(["id", "name"])
            .id_properties(["id"])
            .resource_url("/widgets/{id}")
            .additional_url("self", "/elsewhere/{id}")
            .additional_url("search", "/widgets/{id}/search")
            .build()
            .unwrap();
        let registry = MappingRegistry::new(vec![widget]).unwrap();
        let node = Node::object("widget").with_scalar("id", "7");
        let document = HalTransformer::new(&registry).to_document(&node).unwrap();
        // First occurrence wins: the default self link stays.
        assert_eq!(document["_links"]["self"]["href"], "/widgets/7");
        assert_eq!(document["_links"]["search"]["href"], "/widgets/7/search");
    }

    #[test]
    fn pagination_links_and_meta_attach_to_the_top_level_only() {
        let registry = registry();
        let document = HalTransformer::new(&registry)
            .with_first_url("/widgets?page=1")
            .with_next_url("/widgets?page=3")
            .with_meta("page", 2)
            .to_document(&widget_with_owner())
            .unwrap();

        assert_eq!(document["_links"]["first"]["href"], "/widgets?page=1");
        assert_eq!(document["_links"]["next"]["href"], "/widgets?page=3");
        assert_eq!(document["_meta"]["page"], 2);
        let owner = &document["_embedded"]["owner"];
        assert!(owner.get("_meta").is_none());
        assert!(owner["_links"].get("first").is_none());
    }

    #[test]
    fn top_level_collection_serializes_element_wise() {
        let registry = registry();
        let node = Node::Collection(vec![
            Node::object("widget").with_scalar("id", "1").with_scalar("name", "Bolt"),
            Node::object("widget").with_scalar("id", "2").with_scalar("name", "Nut"),
        ]);
        let document = HalTransformer::new(&registry).to_document(&node).unwrap();
        let elements = document.as_array().unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0]["_links"]["self"]["href"], "/widgets/1");
        assert_eq!(elements[1]["name"], "Nut");
    }

    #[test]
    fn collection_roots_attach_pagination_and_meta_to_each_element() {
        let registry = registry();
        let node = Node::Collection(vec![
            Node::object("widget").with_scalar("id", "1").with_scalar("name", "Bolt"),
            Node::object("widget").with_scalar("id", "2").with_scalar("name", "Nut"),
        ]);
        let document = HalTransformer::new(&registry)
            .with_next_url("/widgets?page=2")
            .with_meta("total", 2)
            .to_document(&node)
            .unwrap();

        let elements = document.as_array().unwrap();
        assert_eq!(elements.len(), 2);
        for element in elements {
            assert_eq!(element["_links"]["next"]["href"], "/widgets?page=2");
            assert_eq!(element["_meta"]["total"], 2);
        }
    }

    #[test]
    fn mixed_collections_keep_embedded_elements_at_their_original_positions() {
        let registry = registry();
        let node = Node::object("widget")
            .with_scalar("id", "7")
            .with_property(
                "parts",
                Node::Collection(vec![
                    Node::Scalar(json!("loose")),
                    Node::object("user").with_scalar("id", "3").with_scalar("name", "Ann"),
                ]),
            );
        let document = HalTransformer::new(&registry).to_document(&node).unwrap();

        // The inline property is removed and the unmapped element dropped.
        assert!(document.get("parts").is_none());
        let parts = &document["_embedded"]["parts"];
        assert!(parts.get("0").is_none());
        assert_eq!(parts["1"]["name"], "Ann");
        assert_eq!(parts["1"]["_links"]["self"]["href"], "/users/3");
    }

    #[test]
    fn output_keys_are_snake_cased() {
        let widget = Mapping::builder("widget", "app::model::Widget")
            .properties(["id", "createdAt"])
            .id_properties(["id"])
            .resource_url("/widgets/{id}")
            .build()
            .unwrap();
        let registry = MappingRegistry::new(vec![widget]).unwrap();
        let node = Node::object("widget")
            .with_scalar("id", "7")
            .with_scalar("createdAt", "2024-05-01");
        let document = HalTransformer::new(&registry).to_document(&node).unwrap();
        assert_eq!(document["created_at"], "2024-05-01");
        assert!(document.get("createdAt").is_none());
    }

    #[test]
    fn serialized_text_keeps_unicode_and_slashes_unescaped() {
        let registry = registry();
        let node = Node::object("widget")
            .with_scalar("id", "7")
            .with_scalar("name", "Schraube / Tornillo ünïcode");
        let text = HalTransformer::new(&registry).serialize(&node).unwrap();
        assert!(text.contains("Schraube / Tornillo ünïcode"));
        assert!(!text.contains("\\/"));
        assert!(!text.contains("\\u"));
    }

    #[test]
    fn single_attribute_objects_flatten_to_the_bare_scalar() {
        let registry = registry();
        let node = Node::object("widget")
            .with_scalar("id", "7")
            .with_property(
                "total",
                Node::object("unmapped").with_scalar("value", json!(10)),
            );
        let document = HalTransformer::new(&registry).to_document(&node).unwrap();
        assert_eq!(document["total"], 10);
    }
}
