//! # Query Parameter Types
//!
//! Typed holders for the three validated query parameters: sparse field
//! sets, include paths, and sort fields. Each type parses the raw wire
//! form of its parameter and exposes the normalized view the validator
//! consumes; parsing never fails, it only collects what the wire carries,
//! and validation against the registry happens later in
//! [`crate::query::assert`].

/// Sparse field sets, keyed by public resource type.
///
/// Wire form: one `fields[<type>]=<member>,<member>` pair per type.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    types: Vec<(String, Vec<String>)>,
}

impl Fields {
    /// An empty field-set selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the requested members for one resource type, merging with
    /// any members already recorded for that type.
    pub fn add<I, S>(&mut self, type_name: impl Into<String>, members: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let type_name = type_name.into();
        let members = members.into_iter().map(Into::into);
        match self.types.iter_mut().find(|(name, _)| *name == type_name) {
            Some((_, existing)) => existing.extend(members),
            None => self.types.push((type_name, members.collect())),
        }
    }

    /// Parse `fields[<type>]` query pairs. Keys without the bracketed type
    /// segment and empty member names are ignored.
    pub fn from_query_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut fields = Self::new();
        for (key, value) in pairs {
            let Some(type_name) = key
                .strip_prefix("fields[")
                .and_then(|rest| rest.strip_suffix(']'))
            else {
                continue;
            };
            if type_name.is_empty() {
                continue;
            }
            fields.add(type_name, csv(value));
        }
        fields
    }

    /// True when no field set was requested.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Requested types with their member lists, in request order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.types
            .iter()
            .map(|(name, members)| (name.as_str(), members.as_slice()))
    }

    /// Members requested for one type, if any were.
    pub fn members(&self, type_name: &str) -> Option<&[String]> {
        self.types
            .iter()
            .find(|(name, _)| name == type_name)
            .map(|(_, members)| members.as_slice())
    }
}

/// Requested include paths: top-level related resources, each with at most
/// one level of nested names.
///
/// Wire form: `include=<target>,<target>.<nested>`.
#[derive(Debug, Clone, Default)]
pub struct Included {
    targets: Vec<(String, Vec<String>)>,
}

impl Included {
    /// An empty include selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one include path, merging nested names under a repeated
    /// target.
    pub fn add(&mut self, target: impl Into<String>, nested: Option<String>) {
        let target = target.into();
        match self.targets.iter_mut().find(|(name, _)| *name == target) {
            Some((_, existing)) => existing.extend(nested),
            None => self.targets.push((target, nested.into_iter().collect())),
        }
    }

    /// Parse an `include` parameter value. Each comma-separated path is
    /// split on its first dot; anything past one nested level is ignored.
    pub fn from_query_value(value: &str) -> Self {
        let mut included = Self::new();
        for path in csv(value) {
            match path.split_once('.') {
                Some((target, nested)) => {
                    let nested = nested.split('.').next().unwrap_or(nested);
                    included.add(target, Some(nested.to_owned()));
                }
                None => included.add(path, None),
            }
        }
        included
    }

    /// True when nothing was asked to be included.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Include targets with their nested names, in request order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.targets
            .iter()
            .map(|(name, nested)| (name.as_str(), nested.as_slice()))
    }
}

/// One requested sort field, direction already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    /// Public member name, leading `-` stripped.
    pub name: String,
    /// True when the wire form carried a leading `-`.
    pub descending: bool,
}

/// Requested sort order.
///
/// Wire form: `sort=-created,name`; a leading `-` marks descending and is
/// stripped from the name before validation.
#[derive(Debug, Clone, Default)]
pub struct Sorting {
    fields: Vec<SortField>,
}

impl Sorting {
    /// An empty sort order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `sort` parameter value.
    pub fn from_query_value(value: &str) -> Self {
        let fields = csv(value)
            .map(|field| match field.strip_prefix('-') {
                Some(name) => SortField {
                    name: name.to_owned(),
                    descending: true,
                },
                None => SortField {
                    name: field.to_owned(),
                    descending: false,
                },
            })
            .filter(|field| !field.name.is_empty())
            .collect();
        Self { fields }
    }

    /// True when no sort order was requested.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Sort fields in request order.
    pub fn fields(&self) -> &[SortField] {
        &self.fields
    }
}

/// Split a comma-separated value, trimming and dropping empty segments.
fn csv(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_field_sets_from_bracketed_keys() {
        let fields = Fields::from_query_pairs([
            ("fields[widget]", "name,color"),
            ("fields[user]", "name"),
            ("page[size]", "10"),
        ]);
        assert_eq!(
            fields.members("widget"),
            Some(["name".to_owned(), "color".to_owned()].as_slice())
        );
        assert_eq!(fields.members("user"), Some(["name".to_owned()].as_slice()));
        assert_eq!(fields.members("page"), None);
    }

    #[test]
    fn repeated_field_types_merge() {
        let fields = Fields::from_query_pairs([
            ("fields[widget]", "name"),
            ("fields[widget]", "color"),
        ]);
        assert_eq!(fields.entries().count(), 1);
        assert_eq!(
            fields.members("widget"),
            Some(["name".to_owned(), "color".to_owned()].as_slice())
        );
    }

    #[test]
    fn parses_include_paths_one_nested_level_deep() {
        let included = Included::from_query_value("owner.avatar,comments");
        let entries: Vec<_> = included.entries().collect();
        assert_eq!(entries[0].0, "owner");
        assert_eq!(entries[0].1, ["avatar".to_owned()]);
        assert_eq!(entries[1].0, "comments");
        assert!(entries[1].1.is_empty());
    }

    #[test]
    fn include_ignores_levels_past_the_first_nested_name() {
        let included = Included::from_query_value("a.b.c");
        let entries: Vec<_> = included.entries().collect();
        assert_eq!(entries[0].0, "a");
        assert_eq!(entries[0].1, ["b".to_owned()]);
    }

    #[test]
    fn sort_strips_descending_markers() {
        let sorting = Sorting::from_query_value("-created,name");
        assert_eq!(
            sorting.fields(),
            [
                SortField {
                    name: "created".to_owned(),
                    descending: true
                },
                SortField {
                    name: "name".to_owned(),
                    descending: false
                },
            ]
        );
    }

    #[test]
    fn empty_segments_are_dropped() {
        assert!(Sorting::from_query_value(",-,").is_empty());
        assert!(Included::from_query_value("").is_empty());
    }
}
