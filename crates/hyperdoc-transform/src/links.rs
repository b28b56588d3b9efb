//! # Link Objects and URL Template Resolution
//!
//! A [`Link`] is a HAL link object: an `href` plus the optional fields the
//! HAL specification reserves. [`resolve_template`] turns a mapping's URL
//! template into a concrete `href` by substituting each `{id_property}`
//! placeholder with the stringified id value read off the node, in the
//! order the mapping declares its id properties.
//!
//! Builder-time checks in `hyperdoc-mapping` guarantee every placeholder
//! names an id property; what can still fail here is the node itself not
//! carrying a scalar value for one of them, which is a fatal
//! [`TransformError::MissingIdValue`] rather than a half-resolved URL.

use hyperdoc_core::Node;
use hyperdoc_mapping::Mapping;
use serde::Serialize;
use serde_json::Value;

use crate::TransformError;

/// HAL link object. Only `href` is mandatory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    /// Target URL of the link.
    pub href: String,
    /// Whether `href` is itself a URI template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templated: Option<bool>,
    /// URL pointing at deprecation information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation: Option<String>,
    /// Media type hint for the target.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Secondary key selecting between links of the same relation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Profile URI of the target resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Human-readable label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Language of the target resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hreflang: Option<String>,
}

impl Link {
    /// A plain link with only an `href`.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            templated: None,
            deprecation: None,
            media_type: None,
            name: None,
            profile: None,
            title: None,
            hreflang: None,
        }
    }

    /// Render as a JSON link object.
    pub fn to_value(&self) -> Value {
        // Serialization of this struct cannot fail: every field is a string
        // or bool.
        serde_json::to_value(self).unwrap_or_else(|_| Value::String(self.href.clone()))
    }
}

/// Resolve a URL template against a node's id values.
///
/// Substitution happens in the order the mapping declares its id
/// properties. Id values are read by internal property name first, falling
/// back to the public alias (pre-serialization may already have renamed the
/// keys).
///
/// # Errors
///
/// Returns [`TransformError::MissingIdValue`] if the template references an
/// id property the node holds no scalar value for.
pub fn resolve_template(
    template: &str,
    mapping: &Mapping,
    node: &Node,
) -> Result<String, TransformError> {
    let mut resolved = template.to_owned();
    for id_property in mapping.id_properties() {
        let token = format!("{{{id_property}}}");
        if !resolved.contains(&token) {
            continue;
        }
        let value = node
            .property(id_property)
            .or_else(|| node.property(mapping.public_name(id_property)))
            .and_then(|child| match child {
                Node::Scalar(value) => scalar_to_string(value),
                _ => None,
            })
            .ok_or_else(|| TransformError::MissingIdValue {
                class: node.class().unwrap_or_default().to_owned(),
                property: id_property.clone(),
            })?;
        resolved = resolved.replace(&token, &value);
    }
    Ok(resolved)
}

/// Stringify a scalar id value. Null is not a usable id.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        _ => None,
    }
}
