//! # hyperdoc-transform — Hypermedia Document Transformers
//!
//! Turns a tagged object-graph [`Node`](hyperdoc_core::Node) into a
//! hypermedia document, driven entirely by the
//! [`MappingRegistry`](hyperdoc_mapping::MappingRegistry). Two document
//! shapes share one algorithm:
//!
//! - [`HalTransformer`] — `_embedded` / `_links` / `_meta` placement.
//! - [`JsonApiTransformer`] — `data` / `attributes` / `relationships` /
//!   `included` / `links` / `meta` placement.
//!
//! Every transform runs three ordered phases per object node:
//!
//! 1. **Pre-serialization** — delete hidden properties, rename internal
//!    property keys to their public aliases. Runs before descending, so
//!    renamed keys are stable for the later phases.
//! 2. **Serialization** — promote qualifying child resources into the
//!    embedded section, synthesize their self links from the mapping URL
//!    templates, mirror those links onto the parent, and build the node's
//!    own links section (default links first, mirrored links second,
//!    mapping-declared additional links last; first occurrence of a name
//!    wins).
//! 3. **Post-serialization** — strip any residual wire markers, normalize
//!    scalars, flatten single-key scalar objects, snake_case the keys, and
//!    attach caller-supplied meta.
//!
//! Output is UTF-8 JSON text; `serde_json` leaves unicode and `/` in string
//! values unescaped, which is exactly the wire contract.
//!
//! Transforming against an empty registry is a configuration error and
//! fails before any traversal.

pub mod hal;
pub mod jsonapi;
pub mod links;
pub mod rewrite;

use thiserror::Error;

pub use hal::HalTransformer;
pub use jsonapi::JsonApiTransformer;
pub use links::{resolve_template, Link};

/// Fatal transformation failure.
///
/// Per-request validation problems never surface here; these are
/// configuration or contract violations.
#[derive(Error, Debug)]
pub enum TransformError {
    /// The registry holds no mapping at all. Raised before traversal.
    #[error("no mapping configured; a transformer requires at least one registered mapping")]
    NoMappings,

    /// A node was missing a scalar value for an id property named by its
    /// mapping's URL template.
    #[error("node of class '{class}' has no scalar value for id property '{property}'")]
    MissingIdValue {
        /// Class identifier of the offending node.
        class: String,
        /// Id property the template needed.
        property: String,
    },

    /// Rendering the final document as JSON text failed.
    #[error("document serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
