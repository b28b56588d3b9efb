//! # hyperdoc-server — Request Validation and Write Actions
//!
//! The server-facing edge of the engine: everything that inspects an
//! incoming request before domain code runs.
//!
//! - [`params`] — typed query parameters ([`Fields`], [`Included`],
//!   [`Sorting`]) parsed from their raw wire forms.
//! - [`query`] — read-request validation of those parameters against the
//!   registry.
//! - [`data`] — write-payload validation; returns the attributes re-keyed
//!   to internal property names on success.
//! - [`actions`] — [`CreateResource`] / [`UpdateResource`] flows with
//!   three-way outcome classification.
//!
//! ## Crate Policy
//!
//! Validation never short-circuits: every violated rule appends one
//! [`ErrorEntry`](hyperdoc_core::ErrorEntry) to the request's
//! [`ErrorBag`](hyperdoc_core::ErrorBag), and only the aggregate decides
//! the outcome. Nothing in this crate encodes transport status codes; the
//! outcome variants are the only contract an HTTP layer needs.

pub mod actions;
pub mod data;
pub mod params;
pub mod query;

pub use actions::{ActionError, CreateResource, HandlerError, UpdateResource};
pub use data::{assert_create, assert_update, RequestError};
pub use params::{Fields, Included, SortField, Sorting};
pub use query::QueryError;
