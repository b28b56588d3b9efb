//! # Write Actions and Outcome Classification
//!
//! [`CreateResource`] and [`UpdateResource`] tie the write-payload
//! validator to a caller-supplied handler and classify the result into
//! exactly three failure shapes. The classification is transport-neutral:
//! nothing here knows about status codes, but the three variants map
//! cleanly onto the 422/403/400 split an HTTP layer would use.
//!
//! The handler receives the validated attributes keyed by internal
//! property name and returns the domain node to publish. A handler that
//! refuses on authorization grounds raises [`HandlerError::Forbidden`];
//! any other handler failure collapses into [`ActionError::BadRequest`]
//! with a fixed generic payload, never leaking domain detail.

use hyperdoc_core::{ErrorBag, ErrorEntry, Node};
use hyperdoc_mapping::MappingRegistry;
use hyperdoc_transform::HalTransformer;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::data::{self, RequestError};

/// Why a write action failed.
#[derive(Error, Debug)]
pub enum ActionError {
    /// The payload failed validation; the bag holds every violation.
    #[error("unprocessable payload:\n{0}")]
    Unprocessable(ErrorBag),

    /// The handler refused the write on authorization grounds.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The handler failed for any other reason. Carries a fixed generic
    /// payload so domain failures never leak detail to clients.
    #[error("bad request")]
    BadRequest(ErrorBag),
}

impl ActionError {
    /// The generic catch-all failure.
    fn bad_request() -> Self {
        let mut bag = ErrorBag::new();
        bag.push(ErrorEntry::bad_request());
        Self::BadRequest(bag)
    }
}

/// Failure raised by a write handler.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The caller's domain logic refused the write.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Anything else that went wrong inside the handler.
    #[error("{0}")]
    Other(String),
}

/// Validate a create payload, run the handler, publish the result.
pub struct CreateResource<'a> {
    registry: &'a MappingRegistry,
}

impl<'a> CreateResource<'a> {
    /// An action bound to the given registry.
    pub fn new(registry: &'a MappingRegistry) -> Self {
        Self { registry }
    }

    /// Run the full create flow.
    ///
    /// # Errors
    ///
    /// [`ActionError::Unprocessable`] when validation fails,
    /// [`ActionError::Forbidden`] when the handler refuses, and
    /// [`ActionError::BadRequest`] for every other handler or
    /// transformation failure.
    pub fn execute<F>(
        &self,
        payload: &Value,
        type_hint: Option<&str>,
        handler: F,
    ) -> Result<Value, ActionError>
    where
        F: FnOnce(Map<String, Value>) -> Result<Node, HandlerError>,
    {
        run(self.registry, payload, type_hint, data::assert_create, handler)
    }
}

/// Validate an update payload, run the handler, publish the result.
pub struct UpdateResource<'a> {
    registry: &'a MappingRegistry,
}

impl<'a> UpdateResource<'a> {
    /// An action bound to the given registry.
    pub fn new(registry: &'a MappingRegistry) -> Self {
        Self { registry }
    }

    /// Run the full update flow. Outcomes as for
    /// [`CreateResource::execute`].
    ///
    /// # Errors
    ///
    /// See [`CreateResource::execute`].
    pub fn execute<F>(
        &self,
        payload: &Value,
        type_hint: Option<&str>,
        handler: F,
    ) -> Result<Value, ActionError>
    where
        F: FnOnce(Map<String, Value>) -> Result<Node, HandlerError>,
    {
        run(self.registry, payload, type_hint, data::assert_update, handler)
    }
}

type Validator = fn(
    &Value,
    &MappingRegistry,
    Option<&str>,
    &mut ErrorBag,
) -> Result<Map<String, Value>, RequestError>;

fn run<F>(
    registry: &MappingRegistry,
    payload: &Value,
    type_hint: Option<&str>,
    validate: Validator,
    handler: F,
) -> Result<Value, ActionError>
where
    F: FnOnce(Map<String, Value>) -> Result<Node, HandlerError>,
{
    let mut bag = ErrorBag::new();
    let values = validate(payload, registry, type_hint, &mut bag)
        .map_err(|RequestError::Invalid(bag)| ActionError::Unprocessable(bag))?;

    let node = handler(values).map_err(|err| match err {
        HandlerError::Forbidden(reason) => ActionError::Forbidden(reason),
        HandlerError::Other(reason) => {
            debug!(%reason, "write handler failed");
            ActionError::bad_request()
        }
    })?;

    HalTransformer::new(registry)
        .to_document(&node)
        .map_err(|err| {
            debug!(error = %err, "result transformation failed");
            ActionError::bad_request()
        })
}
