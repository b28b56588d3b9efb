//! # The Mapping Registry
//!
//! Read-only per-resource-type schema store, indexed by public alias and by
//! source class name. Built once at process start — programmatically or from
//! a directory of declarative mapping files — and shared across concurrent
//! requests without locking.
//!
//! Lookup misses are a normal result (`None`), never an error; callers
//! decide what an unknown alias means in their context.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::mapping::{Mapping, MappingError};

/// Immutable store of [`Mapping`]s, indexed by alias and by class name.
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    mappings: Vec<Mapping>,
    by_alias: HashMap<String, usize>,
    by_class_name: HashMap<String, usize>,
}

impl MappingRegistry {
    /// Build a registry from already-constructed mappings.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::DuplicateAlias`] or
    /// [`MappingError::DuplicateClassName`] if two mappings collide.
    pub fn new(mappings: Vec<Mapping>) -> Result<Self, MappingError> {
        let mut registry = Self::default();
        for mapping in mappings {
            registry.insert(mapping)?;
        }
        debug!(mappings = registry.len(), "mapping registry constructed");
        Ok(registry)
    }

    /// Load every `*.mapping.json` and `*.mapping.yaml` file in a directory.
    ///
    /// Each file holds one declarative mapping definition; definitions go
    /// through [`crate::MappingBuilder`] so file-provided mappings satisfy
    /// the same invariants as programmatic ones.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::Load`] naming the file for unreadable or
    /// unparsable definitions, or the builder's error for invalid ones.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, MappingError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| MappingError::Load {
            file: dir.display().to_string(),
            reason: format!("cannot read mapping directory: {e}"),
        })?;

        let mut files: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| {
                        n.ends_with(".mapping.json") || n.ends_with(".mapping.yaml")
                    })
            })
            .collect();
        // Directory iteration order is platform-dependent; sort for a
        // deterministic registry.
        files.sort();

        let mut mappings = Vec::with_capacity(files.len());
        for path in files {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_owned();
            let content = std::fs::read_to_string(&path).map_err(|e| MappingError::Load {
                file: name.clone(),
                reason: format!("cannot read file: {e}"),
            })?;
            let definition: MappingDefinition = if name.ends_with(".mapping.json") {
                serde_json::from_str(&content).map_err(|e| MappingError::Load {
                    file: name.clone(),
                    reason: format!("invalid JSON: {e}"),
                })?
            } else {
                serde_yaml::from_str(&content).map_err(|e| MappingError::Load {
                    file: name.clone(),
                    reason: format!("invalid YAML: {e}"),
                })?
            };
            debug!(file = %name, alias = %definition.alias, "loaded mapping definition");
            mappings.push(definition.into_mapping()?);
        }

        Self::new(mappings)
    }

    fn insert(&mut self, mapping: Mapping) -> Result<(), MappingError> {
        if self.by_alias.contains_key(mapping.alias()) {
            return Err(MappingError::DuplicateAlias(mapping.alias().to_owned()));
        }
        if self.by_class_name.contains_key(mapping.source_class_name()) {
            return Err(MappingError::DuplicateClassName(
                mapping.source_class_name().to_owned(),
            ));
        }
        let index = self.mappings.len();
        self.by_alias.insert(mapping.alias().to_owned(), index);
        self.by_class_name
            .insert(mapping.source_class_name().to_owned(), index);
        self.mappings.push(mapping);
        Ok(())
    }

    /// Look up a mapping by public type alias. Case-sensitive exact match.
    pub fn by_alias(&self, alias: &str) -> Option<&Mapping> {
        self.by_alias.get(alias).map(|&i| &self.mappings[i])
    }

    /// Look up a mapping by source class name. Case-sensitive exact match.
    pub fn by_class_name(&self, class_name: &str) -> Option<&Mapping> {
        self.by_class_name.get(class_name).map(|&i| &self.mappings[i])
    }

    /// Look up a mapping by a node's class identifier, which may be either
    /// a source class name or a public alias.
    pub fn by_class_identifier(&self, identifier: &str) -> Option<&Mapping> {
        self.by_class_name(identifier)
            .or_else(|| self.by_alias(identifier))
    }

    /// Number of registered mappings.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// True when no mapping is registered.
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Iterate mappings in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter()
    }
}

/// On-disk shape of one declarative mapping file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MappingDefinition {
    alias: String,
    source_class_name: String,
    #[serde(default)]
    properties: Vec<String>,
    #[serde(default)]
    hidden_properties: Vec<String>,
    #[serde(default)]
    aliased_properties: Vec<(String, String)>,
    #[serde(default)]
    id_properties: Vec<String>,
    #[serde(default)]
    required_properties: Vec<String>,
    #[serde(default)]
    resource_url_template: String,
    #[serde(default)]
    additional_url_templates: Vec<(String, String)>,
}

impl MappingDefinition {
    fn into_mapping(self) -> Result<Mapping, MappingError> {
        let mut builder = Mapping::builder(self.alias, self.source_class_name)
            .properties(self.properties)
            .hidden(self.hidden_properties)
            .id_properties(self.id_properties)
            .required(self.required_properties)
            .resource_url(self.resource_url_template);
        for (internal, public) in self.aliased_properties {
            builder = builder.aliased(internal, public);
        }
        for (name, template) in self.additional_url_templates {
            builder = builder.additional_url(name, template);
        }
        builder.build()
    }
}
