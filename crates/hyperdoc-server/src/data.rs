//! # Write-Payload Validation
//!
//! Validates incoming create and update payloads against the mapping
//! registry. Validation is a trust boundary here and it never
//! short-circuits: every violated rule appends one entry to the caller's
//! [`ErrorBag`], and only the aggregate decides pass/fail. On success the
//! supplied attributes come back re-keyed to internal property names,
//! ready for domain code.
//!
//! ## Rule order
//!
//! 1. Structural shape of the `data` wrapper and its `type` member.
//! 2. Declared type resolves against the registry and matches the caller's
//!    expected alias when one is supplied.
//! 3. Required attributes are present, one error per absent name.
//! 4. Relationship entries carry a usable `data` member; every reference
//!    declares a resolvable `type`, and reference attributes belong to
//!    that type's member set.

use hyperdoc_core::{ErrorBag, ErrorEntry};
use hyperdoc_mapping::{Mapping, MappingRegistry};
use hyperdoc_transform::jsonapi::{ATTRIBUTES_KEY, DATA_KEY, RELATIONSHIPS_KEY, TYPE_KEY};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// A write payload failed validation.
#[derive(Error, Debug)]
pub enum RequestError {
    /// One or more rules were violated; the bag holds every entry.
    #[error("write payload failed validation:\n{0}")]
    Invalid(ErrorBag),
}

/// Validate a create payload.
///
/// `type_hint` is the alias the route expects; when supplied, a payload
/// declaring any other type gets an invalid-type entry even if that type
/// is otherwise registered.
///
/// # Errors
///
/// Returns [`RequestError::Invalid`] with the full bag when any rule was
/// violated. On success, returns the supplied attributes keyed by
/// internal property name.
pub fn assert_create(
    payload: &Value,
    registry: &MappingRegistry,
    type_hint: Option<&str>,
    bag: &mut ErrorBag,
) -> Result<Map<String, Value>, RequestError> {
    let before = bag.len();

    let Some(data) = payload.get(DATA_KEY).and_then(Value::as_object) else {
        bag.push(ErrorEntry::missing_data());
        return Err(RequestError::Invalid(bag.clone()));
    };

    let mapping = resolve_declared_type(data, registry, type_hint, bag);

    let empty = Map::new();
    let attributes = match data.get(ATTRIBUTES_KEY) {
        Some(Value::Object(map)) => map,
        // Present but not an object is a shape violation; absent just means
        // the required-attribute rule reports each missing name.
        Some(_) => {
            bag.push(ErrorEntry::malformed_attributes());
            &empty
        }
        None => &empty,
    };

    if let Some(mapping) = mapping {
        bag.extend(check_required_attributes(mapping, attributes));
    }
    bag.extend(check_relationships(data, registry));

    if !bag.is_empty() {
        debug!(
            entries = bag.len() - before,
            "write payload rejected"
        );
        return Err(RequestError::Invalid(bag.clone()));
    }
    match mapping {
        Some(mapping) => Ok(internal_attributes(mapping, attributes)),
        None => Err(RequestError::Invalid(bag.clone())),
    }
}

/// Validate an update payload. Updates obey the same rules as creates.
///
/// # Errors
///
/// See [`assert_create`].
pub fn assert_update(
    payload: &Value,
    registry: &MappingRegistry,
    type_hint: Option<&str>,
    bag: &mut ErrorBag,
) -> Result<Map<String, Value>, RequestError> {
    assert_create(payload, registry, type_hint, bag)
}

/// Check the `type` member and resolve it to a mapping, recording one
/// entry per failed rule. Returns `None` when no mapping can anchor the
/// later attribute checks.
fn resolve_declared_type<'a>(
    data: &Map<String, Value>,
    registry: &'a MappingRegistry,
    type_hint: Option<&str>,
    bag: &mut ErrorBag,
) -> Option<&'a Mapping> {
    let Some(declared) = data
        .get(TYPE_KEY)
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
    else {
        bag.push(ErrorEntry::missing_type());
        return None;
    };
    let Some(mapping) = registry.by_alias(declared) else {
        bag.push(ErrorEntry::invalid_type(declared));
        return None;
    };
    if let Some(expected) = type_hint {
        if expected != declared {
            bag.push(ErrorEntry::invalid_type(declared));
            return None;
        }
    }
    Some(mapping)
}

/// One missing-attribute entry per required public name absent from the
/// supplied attributes.
fn check_required_attributes(
    mapping: &Mapping,
    attributes: &Map<String, Value>,
) -> Vec<ErrorEntry> {
    mapping
        .required_public_names()
        .into_iter()
        .filter(|name| !attributes.contains_key(*name))
        .map(ErrorEntry::missing_attribute)
        .collect()
}

/// Walk the `relationships` member, if any, checking each entry's `data`
/// member and every reference inside it.
fn check_relationships(data: &Map<String, Value>, registry: &MappingRegistry) -> Vec<ErrorEntry> {
    let mut entries = Vec::new();
    let Some(relationships) = data.get(RELATIONSHIPS_KEY).and_then(Value::as_object) else {
        return entries;
    };
    for relationship in relationships.values() {
        let Some(related) = relationship.get(DATA_KEY) else {
            entries.push(ErrorEntry::missing_data());
            continue;
        };
        match related {
            Value::Array(references) => {
                for reference in references {
                    check_reference(reference, registry, &mut entries);
                }
            }
            Value::Object(map) => {
                // An object whose first key looks numeric is a sequence of
                // references on the wire, not a single reference.
                if map.keys().next().is_some_and(|k| k.parse::<usize>().is_ok()) {
                    for reference in map.values() {
                        check_reference(reference, registry, &mut entries);
                    }
                } else {
                    check_reference(related, registry, &mut entries);
                }
            }
            _ => entries.push(ErrorEntry::missing_data()),
        }
    }
    entries
}

/// Check one related-resource reference: a resolvable `type`, then each
/// reference attribute against that type's member set. An unresolvable
/// type records a single entry and skips the attribute checks.
fn check_reference(reference: &Value, registry: &MappingRegistry, entries: &mut Vec<ErrorEntry>) {
    let Some(declared) = reference
        .get(TYPE_KEY)
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
    else {
        entries.push(ErrorEntry::missing_type());
        return;
    };
    let Some(mapping) = registry.by_alias(declared) else {
        entries.push(ErrorEntry::invalid_type(declared));
        return;
    };
    let Some(attributes) = reference.get(ATTRIBUTES_KEY).and_then(Value::as_object) else {
        return;
    };
    for name in attributes.keys() {
        if !mapping.has_member(name) {
            entries.push(ErrorEntry::invalid_attribute(name, declared));
        }
    }
}

/// Re-key the supplied attributes to internal property names through the
/// mapping's alias table.
fn internal_attributes(mapping: &Mapping, attributes: &Map<String, Value>) -> Map<String, Value> {
    attributes
        .iter()
        .map(|(public, value)| (mapping.internal_name(public).to_owned(), value.clone()))
        .collect()
}
