//! # Error Entries and the Error Bag
//!
//! Validation in this engine is a trust boundary, and it never stops at the
//! first violation: every violated rule produces one [`ErrorEntry`], entries
//! accumulate in an ordered [`ErrorBag`], and only the aggregate count
//! decides pass/fail. There is no deduplication — two identical violations
//! are two entries.
//!
//! Configuration failures (an empty registry, a malformed mapping) are *not*
//! entries; they are fatal errors raised immediately by the crate that
//! detects them.

use std::fmt;

use serde::Serialize;

/// One structured validation error.
///
/// `code` is a stable machine-readable identifier, `title` a short
/// per-code summary, `detail` the occurrence-specific explanation, and
/// `source_member` the offending payload member where one exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    /// Stable machine-readable error code.
    pub code: String,
    /// Short, human-readable summary of the error class.
    pub title: String,
    /// Human-readable explanation of this occurrence.
    pub detail: String,
    /// Payload member or parameter the error points at, where applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_member: Option<String>,
}

impl ErrorEntry {
    /// A required attribute was absent from the supplied attributes.
    pub fn missing_attribute(attribute: &str) -> Self {
        Self {
            code: "missing_attribute".to_owned(),
            title: "Missing Attribute".to_owned(),
            detail: format!("The attribute '{attribute}' is required but was not provided."),
            source_member: Some(attribute.to_owned()),
        }
    }

    /// A related-resource reference declared no usable `type` member.
    pub fn missing_type() -> Self {
        Self {
            code: "missing_type".to_owned(),
            title: "Missing Type".to_owned(),
            detail: "A related resource reference must declare a non-empty string 'type' member."
                .to_owned(),
            source_member: Some("type".to_owned()),
        }
    }

    /// A relationship entry declared no usable `data` member.
    pub fn missing_data() -> Self {
        Self {
            code: "missing_data".to_owned(),
            title: "Missing Data".to_owned(),
            detail: "A relationship entry must declare a 'data' member holding one reference or a sequence of references."
                .to_owned(),
            source_member: Some("data".to_owned()),
        }
    }

    /// The `attributes` member was present but held something other than
    /// an object.
    pub fn malformed_attributes() -> Self {
        Self {
            code: "missing_data".to_owned(),
            title: "Missing Data".to_owned(),
            detail: "The 'attributes' member must be an object of attribute values.".to_owned(),
            source_member: Some("attributes".to_owned()),
        }
    }

    /// A declared resource type does not resolve against the registry.
    pub fn invalid_type(type_value: &str) -> Self {
        Self {
            code: "invalid_type".to_owned(),
            title: "Invalid Type".to_owned(),
            detail: format!("The resource type '{type_value}' is not recognized."),
            source_member: Some("type".to_owned()),
        }
    }

    /// A supplied attribute does not belong to the declared type's mapping.
    pub fn invalid_attribute(attribute: &str, type_value: &str) -> Self {
        Self {
            code: "invalid_attribute".to_owned(),
            title: "Invalid Attribute".to_owned(),
            detail: format!(
                "The attribute '{attribute}' does not exist on resource type '{type_value}'."
            ),
            source_member: Some(attribute.to_owned()),
        }
    }

    /// A query parameter referenced an unknown resource type.
    pub fn invalid_parameter(value: &str, parameter: &str) -> Self {
        Self {
            code: "invalid_parameter".to_owned(),
            title: "Invalid Parameter".to_owned(),
            detail: format!(
                "The value '{value}' of the '{parameter}' parameter is not recognized."
            ),
            source_member: Some(parameter.to_owned()),
        }
    }

    /// A query parameter referenced an unknown member of a known type.
    pub fn invalid_parameter_member(member: &str, type_value: &str, parameter: &str) -> Self {
        Self {
            code: "invalid_parameter_member".to_owned(),
            title: "Invalid Parameter Member".to_owned(),
            detail: format!(
                "The member '{member}' of resource type '{type_value}' is not valid for the '{parameter}' parameter."
            ),
            source_member: Some(parameter.to_owned()),
        }
    }

    /// A sort field does not belong to the base resource's mapping.
    pub fn invalid_sort(field: &str) -> Self {
        Self {
            code: "invalid_sort".to_owned(),
            title: "Invalid Sort".to_owned(),
            detail: format!("The field '{field}' cannot be used for sorting."),
            source_member: Some("sort".to_owned()),
        }
    }

    /// Fixed generic entry for failures with no finer classification.
    pub fn bad_request() -> Self {
        Self {
            code: "bad_request".to_owned(),
            title: "Bad Request".to_owned(),
            detail: "Request could not be served.".to_owned(),
            source_member: None,
        }
    }
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source_member {
            Some(member) => write!(f, "[{}] {} ({})", self.code, self.detail, member),
            None => write!(f, "[{}] {}", self.code, self.detail),
        }
    }
}

/// Ordered, append-only collection of [`ErrorEntry`] values.
///
/// Serializes transparently as a JSON array of entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorBag {
    entries: Vec<ErrorEntry>,
}

impl ErrorBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry, preserving insertion order.
    pub fn push(&mut self, entry: ErrorEntry) {
        self.entries.push(entry);
    }

    /// Append a batch of entries produced by one validation rule.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = ErrorEntry>) {
        self.entries.extend(entries);
    }

    /// Number of accumulated entries; non-zero means the request fails.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no rule has been violated.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, in the order they were recorded.
    pub fn entries(&self) -> &[ErrorEntry] {
        &self.entries
    }

    /// Consumes the bag and returns the inner entries.
    pub fn into_inner(self) -> Vec<ErrorEntry> {
        self.entries
    }
}

impl fmt::Display for ErrorBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, entry) in self.entries.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ErrorBag {
    type Item = &'a ErrorEntry;
    type IntoIter = std::slice::Iter<'a, ErrorEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
