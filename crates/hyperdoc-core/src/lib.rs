//! # hyperdoc-core — Foundational Types for Hyperdoc
//!
//! This crate is the leaf of the Hyperdoc workspace DAG. It defines the two
//! contracts every other crate builds on:
//!
//! 1. **The tagged object-graph node.** The upstream generic serializer hands
//!    this engine an already-serialized object graph whose objects carry a
//!    class-identifier marker and whose sequences are wrapped in a collection
//!    marker. [`Node`] models that contract as an explicit tagged-variant
//!    enum — all recursive traversal in the transformer dispatches on the
//!    variant, never on duck-typed map inspection.
//!
//! 2. **Structured, aggregated errors.** Request validation never fails on
//!    the first violation. Each violated rule produces one [`ErrorEntry`];
//!    entries accumulate in an ordered [`ErrorBag`] and only the aggregate
//!    count decides pass/fail.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `hyperdoc-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug` and `Clone`.

pub mod error;
pub mod node;

// Re-export primary types for ergonomic imports.
pub use error::{ErrorBag, ErrorEntry};
pub use node::{
    Node, NodeError, CLASS_IDENTIFIER_KEY, MAP_MARKER_KEY, SCALAR_MARKER_KEY, SCALAR_VALUE_KEY,
};
