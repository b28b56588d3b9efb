//! # Query-Parameter Validation
//!
//! Validates the three query parameters of a read request against the
//! registry: sparse field sets, include paths, and sort fields. Like the
//! write-payload validator, every violated rule records one entry and the
//! aggregate decides the outcome.

use hyperdoc_core::{ErrorBag, ErrorEntry};
use hyperdoc_mapping::MappingRegistry;
use thiserror::Error;
use tracing::debug;

use crate::params::{Fields, Included, Sorting};

/// Parameter name the field-set entries point at.
const FIELDS_PARAMETER: &str = "fields";
/// Parameter name the include entries point at.
const INCLUDE_PARAMETER: &str = "include";

/// A read request's query parameters failed validation.
#[derive(Error, Debug)]
pub enum QueryError {
    /// One or more rules were violated; the bag holds every entry.
    #[error("query parameters failed validation:\n{0}")]
    Invalid(ErrorBag),
}

/// Validate field sets, include paths, and sort fields in one pass.
///
/// `class_name` is the source class of the resource the request reads;
/// sort fields are only checked when it is non-empty and a sort order was
/// requested.
///
/// # Errors
///
/// Returns [`QueryError::Invalid`] with the full bag when any rule was
/// violated.
pub fn assert(
    registry: &MappingRegistry,
    fields: &Fields,
    included: &Included,
    sorting: &Sorting,
    bag: &mut ErrorBag,
    class_name: &str,
) -> Result<(), QueryError> {
    bag.extend(check_fields(registry, fields));
    bag.extend(check_included(registry, included));
    if !class_name.is_empty() && !sorting.is_empty() {
        bag.extend(check_sorting(registry, sorting, class_name));
    }
    if bag.is_empty() {
        Ok(())
    } else {
        debug!(entries = bag.len(), "query parameters rejected");
        Err(QueryError::Invalid(bag.clone()))
    }
}

/// Every requested member of a resolvable type must belong to that type's
/// member set; an unresolvable type records one entry and its members are
/// not checked.
fn check_fields(registry: &MappingRegistry, fields: &Fields) -> Vec<ErrorEntry> {
    let mut entries = Vec::new();
    for (type_name, members) in fields.entries() {
        match registry.by_alias(type_name) {
            Some(mapping) => {
                for member in members {
                    if !mapping.has_member(member) {
                        entries.push(ErrorEntry::invalid_parameter_member(
                            member,
                            type_name,
                            FIELDS_PARAMETER,
                        ));
                    }
                }
            }
            None => entries.push(ErrorEntry::invalid_parameter(type_name, FIELDS_PARAMETER)),
        }
    }
    entries
}

/// Include targets and their nested names must each resolve as registered
/// types; nested names under an unresolvable target are not checked.
fn check_included(registry: &MappingRegistry, included: &Included) -> Vec<ErrorEntry> {
    let mut entries = Vec::new();
    for (target, nested) in included.entries() {
        if registry.by_alias(target).is_none() {
            entries.push(ErrorEntry::invalid_parameter(target, INCLUDE_PARAMETER));
            continue;
        }
        for name in nested {
            if registry.by_alias(name).is_none() {
                entries.push(ErrorEntry::invalid_parameter(name, INCLUDE_PARAMETER));
            }
        }
    }
    entries
}

/// Sort fields, translated public to internal, must name properties of
/// the base resource's mapping. An unregistered base class checks nothing.
fn check_sorting(
    registry: &MappingRegistry,
    sorting: &Sorting,
    class_name: &str,
) -> Vec<ErrorEntry> {
    let Some(mapping) = registry.by_class_name(class_name) else {
        return Vec::new();
    };
    sorting
        .fields()
        .iter()
        .filter(|field| {
            let internal = mapping.internal_name(&field.name);
            !mapping.properties().iter().any(|p| p == internal)
        })
        .map(|field| ErrorEntry::invalid_sort(&field.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperdoc_mapping::Mapping;

    fn registry() -> MappingRegistry {
        let widget = Mapping::builder("widgets", "app::model::Widget")
            .properties(["id", "name", "created_at"])
            .aliased("created_at", "created")
            .id_properties(["id"])
            .resource_url("/widgets/{id}")
            .build()
            .unwrap();
        let user = Mapping::builder("users", "app::model::User")
            .properties(["id", "name"])
            .id_properties(["id"])
            .resource_url("/users/{id}")
            .build()
            .unwrap();
        MappingRegistry::new(vec![widget, user]).unwrap()
    }

    #[test]
    fn valid_parameters_pass() {
        let fields = Fields::from_query_pairs([("fields[widgets]", "name,created")]);
        let included = Included::from_query_value("users");
        let sorting = Sorting::from_query_value("-created,name");
        let mut bag = ErrorBag::new();
        assert(
            &registry(),
            &fields,
            &included,
            &sorting,
            &mut bag,
            "app::model::Widget",
        )
        .unwrap();
        assert!(bag.is_empty());
    }

    #[test]
    fn unknown_member_of_a_known_type_is_flagged_alone() {
        let fields = Fields::from_query_pairs([("fields[widgets]", "name,color")]);
        let mut bag = ErrorBag::new();
        let err = assert(
            &registry(),
            &fields,
            &Included::new(),
            &Sorting::new(),
            &mut bag,
            "",
        )
        .unwrap_err();
        let QueryError::Invalid(bag) = err;
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.entries()[0].code, "invalid_parameter_member");
        assert!(bag.entries()[0].detail.contains("color"));
        assert!(bag.entries()[0].detail.contains("widgets"));
    }

    #[test]
    fn unknown_field_type_is_invalid_parameter() {
        let fields = Fields::from_query_pairs([("fields[gadgets]", "name")]);
        let mut bag = ErrorBag::new();
        let err = assert(
            &registry(),
            &fields,
            &Included::new(),
            &Sorting::new(),
            &mut bag,
            "",
        )
        .unwrap_err();
        let QueryError::Invalid(bag) = err;
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.entries()[0].code, "invalid_parameter");
        assert_eq!(bag.entries()[0].source_member.as_deref(), Some("fields"));
    }

    #[test]
    fn include_checks_targets_and_nested_names() {
        let included = Included::from_query_value("users.gadgets,ghosts.users");
        let mut bag = ErrorBag::new();
        let err = assert(
            &registry(),
            &Fields::new(),
            &included,
            &Sorting::new(),
            &mut bag,
            "",
        )
        .unwrap_err();
        let QueryError::Invalid(bag) = err;
        // One entry for the bad nested name, one for the bad target; the
        // nested name under the bad target is not checked.
        let values: Vec<_> = bag.entries().iter().map(|e| e.detail.as_str()).collect();
        assert_eq!(bag.len(), 2);
        assert!(values[0].contains("gadgets"));
        assert!(values[1].contains("ghosts"));
    }

    #[test]
    fn sort_translates_aliases_before_checking() {
        let sorting = Sorting::from_query_value("-created");
        let mut bag = ErrorBag::new();
        assert(
            &registry(),
            &Fields::new(),
            &Included::new(),
            &sorting,
            &mut bag,
            "app::model::Widget",
        )
        .unwrap();
    }

    #[test]
    fn unknown_sort_field_is_invalid_sort() {
        let sorting = Sorting::from_query_value("speed");
        let mut bag = ErrorBag::new();
        let err = assert(
            &registry(),
            &Fields::new(),
            &Included::new(),
            &sorting,
            &mut bag,
            "app::model::Widget",
        )
        .unwrap_err();
        let QueryError::Invalid(bag) = err;
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.entries()[0].code, "invalid_sort");
    }

    #[test]
    fn sort_is_skipped_without_a_base_class() {
        let sorting = Sorting::from_query_value("speed");
        let mut bag = ErrorBag::new();
        assert(
            &registry(),
            &Fields::new(),
            &Included::new(),
            &sorting,
            &mut bag,
            "",
        )
        .unwrap();
        assert!(bag.is_empty());
    }
}
