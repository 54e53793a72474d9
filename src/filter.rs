//! Free-text search on the student name plus categorical selections.

use std::collections::{BTreeMap, BTreeSet};

use crate::directory::NormalizedRecord;
use crate::record::Tags;

/// How a multi-valued dimension matches a multi-value selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// At least one selected value is present on the record.
    Any,
    /// Every selected value is present on the record.
    All,
}

/// One filterable categorical field of a record kind.
pub struct Dimension<R> {
    pub key: &'static str,
    pub label: &'static str,
    pub accessor: fn(&R) -> Tags<'_>,
    pub policy: MatchPolicy,
}

impl<R> Dimension<R> {
    pub fn tags<'r>(&self, record: &'r R) -> Tags<'r> {
        (self.accessor)(record)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub search: String,
    pub selections: BTreeMap<String, BTreeSet<String>>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = text.into();
        self
    }

    pub fn select(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.selections
            .entry(key.into())
            .or_default()
            .insert(value.into());
        self
    }

    pub fn selected(&self, key: &str) -> Option<&BTreeSet<String>> {
        self.selections.get(key).filter(|values| !values.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty() && self.selections.values().all(BTreeSet::is_empty)
    }
}

pub fn matches_search(name: &str, query: &str) -> bool {
    let query = query.trim();
    query.is_empty() || name.to_lowercase().contains(&query.to_lowercase())
}

/// An empty selection never filters. Scalar tags ignore the policy and
/// only need to be one of the selected values.
pub fn matches_selection(tags: Tags<'_>, selected: &BTreeSet<String>, policy: MatchPolicy) -> bool {
    if selected.is_empty() {
        return true;
    }

    match tags {
        Tags::One(value) => selected.contains(value),
        Tags::Many(_) => match policy {
            MatchPolicy::Any => selected.iter().any(|value| tags.contains(value)),
            MatchPolicy::All => selected.iter().all(|value| tags.contains(value)),
        },
    }
}

pub fn filter_records<'a, R>(
    records: Vec<NormalizedRecord<'a, R>>,
    dimensions: &[Dimension<R>],
    query: &Query,
) -> Vec<NormalizedRecord<'a, R>> {
    let active: Vec<(&Dimension<R>, &BTreeSet<String>)> = dimensions
        .iter()
        .filter_map(|dimension| query.selected(dimension.key).map(|values| (dimension, values)))
        .collect();

    records
        .into_iter()
        .filter(|normalized| matches_search(&normalized.student.name, &query.search))
        .filter(|normalized| {
            active.iter().all(|(dimension, selected)| {
                matches_selection(dimension.tags(normalized.record), selected, dimension.policy)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn search_ignores_case_and_padding() {
        assert!(matches_search("Ana López", "ana"));
        assert!(matches_search("Ana López", "  LÓPEZ "));
        assert!(matches_search("Ana López", ""));
        assert!(!matches_search("Ana López", "luis"));
    }

    #[test]
    fn all_policy_needs_every_selected_tag() {
        let tags = vec!["Bullying".to_string(), "Vandalism".to_string()];
        let selected = set(&["Bullying", "Theft"]);

        assert!(!matches_selection(Tags::Many(&tags), &selected, MatchPolicy::All));
        assert!(matches_selection(Tags::Many(&tags), &selected, MatchPolicy::Any));
        assert!(matches_selection(
            Tags::Many(&tags),
            &set(&["Bullying", "Vandalism"]),
            MatchPolicy::All
        ));
    }

    #[test]
    fn scalar_tags_match_membership() {
        let selected = set(&["High", "Medium"]);
        assert!(matches_selection(Tags::One("High"), &selected, MatchPolicy::All));
        assert!(!matches_selection(Tags::One("Low"), &selected, MatchPolicy::Any));
    }

    #[test]
    fn empty_selection_is_not_a_filter() {
        assert!(matches_selection(Tags::One("Low"), &BTreeSet::new(), MatchPolicy::All));
        assert!(matches_selection(Tags::Many(&[]), &BTreeSet::new(), MatchPolicy::Any));
    }

    #[test]
    fn unknown_value_matches_nothing() {
        let tags = vec!["Bullying".to_string()];
        assert!(!matches_selection(Tags::Many(&tags), &set(&["Arson"]), MatchPolicy::Any));
    }

    #[test]
    fn query_builder_groups_values_by_key() {
        let query = Query::new()
            .search("ana")
            .select("types", "Bullying")
            .select("types", "Theft");

        assert_eq!(query.selected("types"), Some(&set(&["Bullying", "Theft"])));
        assert_eq!(query.selected("status"), None);
        assert!(!query.is_empty());
        assert!(Query::new().is_empty());
    }
}
