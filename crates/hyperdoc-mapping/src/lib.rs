//! # hyperdoc-mapping — Resource Mapping Schemas
//!
//! A [`Mapping`] is the declarative schema for one resource type: its public
//! alias, its ordered property set, public aliases for internal property
//! names, the id properties that identify a resource, the properties required
//! on create, and the URL templates its links resolve from.
//!
//! Mappings are built once at startup — programmatically through
//! [`MappingBuilder`] or from declarative `*.mapping.json` / `*.mapping.yaml`
//! files via [`MappingRegistry::from_dir`] — and are immutable thereafter.
//! The [`MappingRegistry`] is `Send + Sync` and shared read-only by every
//! request; lookups that find nothing return `None`, which callers must
//! treat as a normal result.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `hyperdoc-*` crates: mappings are pure
//!   configuration and this crate sits beside the core leaf.
//! - Every invariant a mapping must uphold is checked in
//!   [`MappingBuilder::build`]; a `Mapping` that exists is a valid one.

pub mod mapping;
pub mod registry;

pub use mapping::{Mapping, MappingBuilder, MappingError};
pub use registry::MappingRegistry;
