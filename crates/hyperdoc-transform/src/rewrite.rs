//! # Recursive Document Rewriting
//!
//! The post-serialization rules, each one a small recursive pass over a
//! `serde_json::Value` tree. They run in a fixed order (see
//! [`crate::hal::HalTransformer`]):
//!
//! 1. [`strip_marker_keys`] — drop residual serializer markers.
//! 2. [`format_scalar_values`] — canonical scalar representation.
//! 3. [`flatten_single_key_scalars`] — single-attribute shorthand.
//! 4. [`keys_to_snake_case`] — one casing convention for all keys.
//!
//! The flatten pass works bottom-up, which makes it idempotent: after one
//! pass no non-reserved object holds exactly one scalar-valued key.

use hyperdoc_core::{Node, CLASS_IDENTIFIER_KEY, MAP_MARKER_KEY, SCALAR_MARKER_KEY};
use hyperdoc_mapping::MappingRegistry;
use serde_json::Value;

/// Pre-serialization: delete hidden properties and rename internal property
/// keys to their public aliases, recursively, each object node under its
/// own mapping.
///
/// Runs before any embedding or link synthesis so that renamed keys are
/// stable for the later phases. Nodes whose class has no registered mapping
/// pass through untouched.
pub fn pre_serialize(registry: &MappingRegistry, node: &mut Node) {
    match node {
        Node::Object { class, properties } => {
            if let Some(mapping) = registry.by_class_identifier(class) {
                properties.retain(|(name, _)| {
                    !mapping.hidden_properties().iter().any(|hidden| hidden == name)
                });
                for (name, _) in properties.iter_mut() {
                    let public = mapping.public_name(name).to_owned();
                    if public != *name {
                        *name = public;
                    }
                }
            }
            for (_, child) in properties.iter_mut() {
                pre_serialize(registry, child);
            }
        }
        Node::Collection(elements) => {
            for element in elements {
                pre_serialize(registry, element);
            }
        }
        Node::Scalar(_) => {}
    }
}

/// True for JSON scalars: null, booleans, numbers, and strings.
pub fn is_scalar(value: &Value) -> bool {
    !value.is_object() && !value.is_array()
}

/// Recursively delete the serializer's reserved marker keys.
///
/// Documents built from a parsed [`hyperdoc_core::Node`] carry no markers;
/// this pass guards against marker keys smuggled inside attribute values.
pub fn strip_marker_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove(CLASS_IDENTIFIER_KEY);
            map.remove(MAP_MARKER_KEY);
            map.remove(SCALAR_MARKER_KEY);
            for child in map.values_mut() {
                strip_marker_keys(child);
            }
        }
        Value::Array(elements) => {
            for child in elements {
                strip_marker_keys(child);
            }
        }
        _ => {}
    }
}

/// Recursively normalize scalar leaves to their canonical wire form.
///
/// Integral floats collapse to integers (`1.0` becomes `1`); booleans,
/// strings, and null pass through unchanged.
pub fn format_scalar_values(value: &mut Value) {
    match value {
        Value::Number(number) => {
            if let Some(f) = number.as_f64() {
                if number.as_i64().is_none() && number.as_u64().is_none() && f.fract() == 0.0 {
                    // f64 with zero fraction inside i64 range renders as an
                    // integer; anything else keeps its float form.
                    if f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                        *value = Value::from(f as i64);
                    }
                }
            }
        }
        Value::Object(map) => {
            for child in map.values_mut() {
                format_scalar_values(child);
            }
        }
        Value::Array(elements) => {
            for child in elements {
                format_scalar_values(child);
            }
        }
        _ => {}
    }
}

/// Recursively replace any object holding exactly one scalar-valued key
/// with that bare scalar, skipping subtrees under `reserved` keys.
///
/// Children first, then the node itself, so one pass reaches a fixpoint
/// and the operation is idempotent.
pub fn flatten_single_key_scalars(value: &mut Value, reserved: &[&str]) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if reserved.contains(&key.as_str()) {
                    continue;
                }
                flatten_single_key_scalars(child, reserved);
            }
            if map.len() == 1 {
                let only = map.values().next().map(Value::clone);
                if let Some(only) = only {
                    if is_scalar(&only) {
                        *value = only;
                    }
                }
            }
        }
        Value::Array(elements) => {
            for child in elements {
                flatten_single_key_scalars(child, reserved);
            }
        }
        _ => {}
    }
}

/// Recursively rewrite every object key to snake_case, preserving key order.
pub fn keys_to_snake_case(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let entries: Vec<(String, Value)> = std::mem::take(map).into_iter().collect();
            for (key, mut child) in entries {
                keys_to_snake_case(&mut child);
                map.insert(snake_case(&key), child);
            }
        }
        Value::Array(elements) => {
            for child in elements {
                keys_to_snake_case(child);
            }
        }
        _ => {}
    }
}

/// Convert one key to snake_case. Leading underscores (reserved HAL keys)
/// and existing snake_case keys pass through unchanged.
pub fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev_lower_or_digit = false;
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower_or_digit {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower_or_digit = false;
        } else {
            out.push(ch);
            prev_lower_or_digit = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        }
    }
    out
}
