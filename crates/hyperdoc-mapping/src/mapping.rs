//! # Per-Type Resource Mappings
//!
//! [`Mapping`] is immutable by construction: the only way to obtain one is
//! [`MappingBuilder::build`], which checks every structural invariant up
//! front. Misconfigured mappings are a startup failure, never a per-request
//! one.
//!
//! ## Invariants
//!
//! - Every id property and every required property is a member of
//!   `properties`.
//! - Public alias names collide neither with each other nor with the
//!   internal name of an unaliased property.
//! - Every `{placeholder}` in the resource URL template and in each
//!   additional URL template names a declared id property. A template may
//!   use a subset of the id properties; a placeholder naming anything else
//!   is a configuration error.

use std::collections::HashMap;

use thiserror::Error;

/// Configuration error detected while building a mapping or registry.
#[derive(Error, Debug)]
pub enum MappingError {
    /// The public type alias was empty.
    #[error("mapping for class '{0}' has an empty alias")]
    EmptyAlias(String),

    /// The source class name was empty.
    #[error("mapping with alias '{0}' has an empty source class name")]
    EmptyClassName(String),

    /// An id property was not a member of the property set.
    #[error("mapping '{mapping}': id property '{property}' is not a declared property")]
    UnknownIdProperty {
        /// Mapping alias.
        mapping: String,
        /// Offending id property.
        property: String,
    },

    /// A required property was not a member of the property set.
    #[error("mapping '{mapping}': required property '{property}' is not a declared property")]
    UnknownRequiredProperty {
        /// Mapping alias.
        mapping: String,
        /// Offending required property.
        property: String,
    },

    /// An aliased property was not a member of the property set.
    #[error("mapping '{mapping}': aliased property '{property}' is not a declared property")]
    UnknownAliasedProperty {
        /// Mapping alias.
        mapping: String,
        /// Offending internal property name.
        property: String,
    },

    /// A public alias name collided with another public name.
    #[error("mapping '{mapping}': public name '{public_name}' is declared more than once")]
    AliasCollision {
        /// Mapping alias.
        mapping: String,
        /// Colliding public name.
        public_name: String,
    },

    /// A URL template placeholder did not name an id property.
    #[error("mapping '{mapping}': template '{template}' placeholder '{placeholder}' does not name an id property")]
    BadPlaceholder {
        /// Mapping alias.
        mapping: String,
        /// Template the placeholder appeared in.
        template: String,
        /// Offending placeholder token.
        placeholder: String,
    },

    /// Two mappings in one registry declared the same alias.
    #[error("duplicate mapping alias '{0}'")]
    DuplicateAlias(String),

    /// Two mappings in one registry declared the same source class name.
    #[error("duplicate mapping class name '{0}'")]
    DuplicateClassName(String),

    /// A declarative mapping file could not be loaded.
    #[error("mapping load error for '{file}': {reason}")]
    Load {
        /// File the failure occurred in.
        file: String,
        /// Reason the file could not be loaded.
        reason: String,
    },
}

/// Declarative schema for one resource type.
///
/// Built once at startup, immutable thereafter, shared read-only by all
/// requests. See the module documentation for the invariants the builder
/// enforces.
#[derive(Debug, Clone)]
pub struct Mapping {
    alias: String,
    source_class_name: String,
    properties: Vec<String>,
    hidden_properties: Vec<String>,
    aliased_properties: HashMap<String, String>,
    id_properties: Vec<String>,
    required_properties: Vec<String>,
    resource_url_template: String,
    additional_url_templates: Vec<(String, String)>,
}

impl Mapping {
    /// Start building a mapping for the given public alias and source class.
    pub fn builder(
        alias: impl Into<String>,
        source_class_name: impl Into<String>,
    ) -> MappingBuilder {
        MappingBuilder::new(alias, source_class_name)
    }

    /// Public type name.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Fully qualified name of the domain class this mapping covers.
    pub fn source_class_name(&self) -> &str {
        &self.source_class_name
    }

    /// Ordered internal property names.
    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    /// Properties deleted from documents during pre-serialization.
    pub fn hidden_properties(&self) -> &[String] {
        &self.hidden_properties
    }

    /// Internal name → public name alias table.
    pub fn aliased_properties(&self) -> &HashMap<String, String> {
        &self.aliased_properties
    }

    /// Ordered id properties identifying a resource of this type.
    pub fn id_properties(&self) -> &[String] {
        &self.id_properties
    }

    /// Properties required on create. Empty means all non-id properties.
    pub fn required_properties(&self) -> &[String] {
        &self.required_properties
    }

    /// URL template for the resource's self link.
    pub fn resource_url_template(&self) -> &str {
        &self.resource_url_template
    }

    /// Named extra link templates, in declaration order.
    pub fn additional_url_templates(&self) -> &[(String, String)] {
        &self.additional_url_templates
    }

    /// True if `name` is one of this mapping's id properties.
    pub fn is_id_property(&self, name: &str) -> bool {
        self.id_properties.iter().any(|p| p == name)
    }

    /// Public name for an internal property: its alias if one is declared,
    /// else the internal name itself.
    pub fn public_name<'a>(&'a self, internal: &'a str) -> &'a str {
        self.aliased_properties
            .get(internal)
            .map_or(internal, String::as_str)
    }

    /// Internal name for a public name: the alias source if the name is an
    /// alias target, else the name itself.
    pub fn internal_name<'a>(&'a self, public: &'a str) -> &'a str {
        self.aliased_properties
            .iter()
            .find(|(_, target)| target.as_str() == public)
            .map_or(public, |(source, _)| source.as_str())
    }

    /// True if `name` is a member of the property set, counting both
    /// internal names and public alias names.
    pub fn has_member(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p == name)
            || self.aliased_properties.values().any(|p| p == name)
    }

    /// Effective required-attribute set for creates, as public names:
    /// `required_properties` if non-empty else all `properties`, minus the
    /// id properties, each mapped through the alias table.
    pub fn required_public_names(&self) -> Vec<&str> {
        let base: &[String] = if self.required_properties.is_empty() {
            &self.properties
        } else {
            &self.required_properties
        };
        base.iter()
            .filter(|p| !self.is_id_property(p))
            .map(|p| self.public_name(p))
            .collect()
    }
}

/// Builder enforcing the mapping invariants at `build()` time.
#[derive(Debug, Clone)]
pub struct MappingBuilder {
    alias: String,
    source_class_name: String,
    properties: Vec<String>,
    hidden_properties: Vec<String>,
    aliased_properties: Vec<(String, String)>,
    id_properties: Vec<String>,
    required_properties: Vec<String>,
    resource_url_template: String,
    additional_url_templates: Vec<(String, String)>,
}

impl MappingBuilder {
    /// Start a builder for the given alias and source class name.
    pub fn new(alias: impl Into<String>, source_class_name: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            source_class_name: source_class_name.into(),
            properties: Vec::new(),
            hidden_properties: Vec::new(),
            aliased_properties: Vec::new(),
            id_properties: Vec::new(),
            required_properties: Vec::new(),
            resource_url_template: String::new(),
            additional_url_templates: Vec::new(),
        }
    }

    /// Declare the ordered internal property set.
    #[must_use]
    pub fn properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = properties.into_iter().map(Into::into).collect();
        self
    }

    /// Declare properties deleted during pre-serialization.
    #[must_use]
    pub fn hidden<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hidden_properties = properties.into_iter().map(Into::into).collect();
        self
    }

    /// Declare one internal → public property alias.
    #[must_use]
    pub fn aliased(mut self, internal: impl Into<String>, public: impl Into<String>) -> Self {
        self.aliased_properties.push((internal.into(), public.into()));
        self
    }

    /// Declare the ordered id property subset.
    #[must_use]
    pub fn id_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.id_properties = properties.into_iter().map(Into::into).collect();
        self
    }

    /// Declare the properties required on create.
    #[must_use]
    pub fn required<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_properties = properties.into_iter().map(Into::into).collect();
        self
    }

    /// Declare the resource URL template for self links.
    #[must_use]
    pub fn resource_url(mut self, template: impl Into<String>) -> Self {
        self.resource_url_template = template.into();
        self
    }

    /// Declare one named additional link template.
    #[must_use]
    pub fn additional_url(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.additional_url_templates.push((name.into(), template.into()));
        self
    }

    /// Check every invariant and produce the immutable [`Mapping`].
    ///
    /// # Errors
    ///
    /// Returns the first [`MappingError`] violated; mapping construction is
    /// a startup concern and fails fast.
    pub fn build(self) -> Result<Mapping, MappingError> {
        if self.alias.is_empty() {
            return Err(MappingError::EmptyAlias(self.source_class_name));
        }
        if self.source_class_name.is_empty() {
            return Err(MappingError::EmptyClassName(self.alias));
        }

        for property in &self.id_properties {
            if !self.properties.contains(property) {
                return Err(MappingError::UnknownIdProperty {
                    mapping: self.alias.clone(),
                    property: property.clone(),
                });
            }
        }
        for property in &self.required_properties {
            if !self.properties.contains(property) {
                return Err(MappingError::UnknownRequiredProperty {
                    mapping: self.alias.clone(),
                    property: property.clone(),
                });
            }
        }

        let mut aliased_properties = HashMap::new();
        for (internal, public) in &self.aliased_properties {
            if !self.properties.contains(internal) {
                return Err(MappingError::UnknownAliasedProperty {
                    mapping: self.alias.clone(),
                    property: internal.clone(),
                });
            }
            if aliased_properties
                .insert(internal.clone(), public.clone())
                .is_some()
            {
                return Err(MappingError::AliasCollision {
                    mapping: self.alias.clone(),
                    public_name: public.clone(),
                });
            }
        }
        // Public names must stay unambiguous: no two aliases may share a
        // target, and a target may not shadow an unaliased internal name.
        for (internal, public) in &self.aliased_properties {
            let collides_with_alias = self
                .aliased_properties
                .iter()
                .any(|(other_internal, other_public)| {
                    other_internal != internal && other_public == public
                });
            let collides_with_property = self
                .properties
                .iter()
                .any(|p| p == public && !aliased_properties.contains_key(p));
            if collides_with_alias || collides_with_property {
                return Err(MappingError::AliasCollision {
                    mapping: self.alias.clone(),
                    public_name: public.clone(),
                });
            }
        }

        let mut templates: Vec<(&str, &str)> =
            vec![("resource", self.resource_url_template.as_str())];
        templates.extend(
            self.additional_url_templates
                .iter()
                .map(|(name, template)| (name.as_str(), template.as_str())),
        );
        for (name, template) in templates {
            for placeholder in placeholders(template) {
                if !self.id_properties.iter().any(|p| p == placeholder) {
                    return Err(MappingError::BadPlaceholder {
                        mapping: self.alias.clone(),
                        template: name.to_owned(),
                        placeholder: placeholder.to_owned(),
                    });
                }
            }
        }

        Ok(Mapping {
            alias: self.alias,
            source_class_name: self.source_class_name,
            properties: self.properties,
            hidden_properties: self.hidden_properties,
            aliased_properties,
            id_properties: self.id_properties,
            required_properties: self.required_properties,
            resource_url_template: self.resource_url_template,
            additional_url_templates: self.additional_url_templates,
        })
    }
}

/// Extract `{placeholder}` tokens from a URL template, in order.
pub(crate) fn placeholders(template: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open + 1..].find('}') else {
            break;
        };
        tokens.push(&rest[open + 1..open + 1 + close]);
        rest = &rest[open + 1 + close + 1..];
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> MappingBuilder {
        Mapping::builder("widget", "app::model::Widget")
            .properties(["id", "name", "color"])
            .id_properties(["id"])
            .resource_url("/widgets/{id}")
    }

    #[test]
    fn builds_a_minimal_mapping() {
        let mapping = widget().build().unwrap();
        assert_eq!(mapping.alias(), "widget");
        assert_eq!(mapping.properties(), ["id", "name", "color"]);
        assert!(mapping.is_id_property("id"));
        assert!(!mapping.is_id_property("name"));
    }

    #[test]
    fn alias_round_trip_is_identity() {
        let mapping = widget().aliased("name", "title").build().unwrap();
        for internal in mapping.properties() {
            let public = mapping.public_name(internal);
            assert_eq!(mapping.internal_name(public), internal);
        }
        assert_eq!(mapping.public_name("name"), "title");
        assert_eq!(mapping.internal_name("title"), "name");
    }

    #[test]
    fn required_public_names_default_to_all_non_id_properties() {
        let mapping = widget().aliased("name", "title").build().unwrap();
        assert_eq!(mapping.required_public_names(), ["title", "color"]);
    }

    #[test]
    fn required_public_names_honor_an_explicit_set() {
        let mapping = widget().required(["name"]).build().unwrap();
        assert_eq!(mapping.required_public_names(), ["name"]);
    }

    #[test]
    fn rejects_unknown_id_property() {
        let err = Mapping::builder("widget", "app::model::Widget")
            .properties(["name"])
            .id_properties(["id"])
            .build()
            .unwrap_err();
        assert!(matches!(err, MappingError::UnknownIdProperty { .. }));
    }

    #[test]
    fn rejects_unknown_required_property() {
        let err = widget().required(["weight"]).build().unwrap_err();
        assert!(matches!(err, MappingError::UnknownRequiredProperty { .. }));
    }

    #[test]
    fn rejects_placeholder_that_is_not_an_id_property() {
        let err = widget()
            .additional_url("owner", "/widgets/{id}/owners/{owner_id}")
            .build()
            .unwrap_err();
        match err {
            MappingError::BadPlaceholder { placeholder, .. } => {
                assert_eq!(placeholder, "owner_id");
            }
            other => panic!("expected BadPlaceholder, got {other}"),
        }
    }

    #[test]
    fn rejects_alias_target_shadowing_another_property() {
        let err = widget().aliased("name", "color").build().unwrap_err();
        assert!(matches!(err, MappingError::AliasCollision { .. }));
    }

    #[test]
    fn has_member_counts_aliases_and_internals() {
        let mapping = widget().aliased("name", "title").build().unwrap();
        assert!(mapping.has_member("name"));
        assert!(mapping.has_member("title"));
        assert!(mapping.has_member("color"));
        assert!(!mapping.has_member("weight"));
    }

    #[test]
    fn extracts_placeholders_in_order() {
        assert_eq!(
            placeholders("/a/{x}/b/{y}"),
            vec!["x", "y"]
        );
        assert!(placeholders("/plain").is_empty());
    }
}
