//! Node search.
//!
//! Built once per graph generation. Every node contributes its lower-cased
//! label and, for scalars, its lower-cased value text; a query is a
//! case-insensitive substring match over those keys. Entries are stored
//! shallowest-first, then in build order, so results come out in that order
//! without sorting per query.

use rayon::prelude::*;

use crate::error::BuildError;
use crate::graph::{Graph, Node, NodeId};

struct Entry {
    id: NodeId,
    slot: usize,
    label: String,
    value: Option<String>,
}

impl Entry {
    fn matches(&self, needle: &str) -> bool {
        self.label.contains(needle) || self.value.as_deref().is_some_and(|v| v.contains(needle))
    }
}

/// Read-only index derived from one [`Graph`].
pub struct SearchIndex {
    entries: Vec<Entry>,
}

impl SearchIndex {
    /// Index of an empty graph.
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn rebuild(graph: &Graph) -> Self {
        let mut entries: Vec<Entry> = graph
            .nodes()
            .par_iter()
            .enumerate()
            .map(|(slot, node)| Entry {
                id: node.id.clone(),
                slot,
                label: node.label.to_lowercase(),
                value: node.scalar_value().map(str::to_lowercase),
            })
            .collect();
        // stable: equal depths keep build order
        entries.sort_by_key(|e| graph.nodes()[e.slot].depth);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identities of matching nodes, shallowest first, then build order.
    /// An empty term matches nothing.
    pub fn query(&self, term: &str) -> Vec<NodeId> {
        if term.is_empty() {
            return Vec::new();
        }
        let needle = term.to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.matches(&needle))
            .map(|e| e.id.clone())
            .collect()
    }

    /// First hit of [`query`](Self::query), for search-to-focus.
    pub fn first_match(&self, term: &str) -> Option<NodeId> {
        if term.is_empty() {
            return None;
        }
        let needle = term.to_lowercase();
        self.entries.iter().find(|e| e.matches(&needle)).map(|e| e.id.clone())
    }

    /// Resolve a query against the graph this index was built from.
    pub fn search<'g>(&self, graph: &'g Graph, term: &str) -> Vec<&'g Node> {
        self.query(term).iter().filter_map(|id| graph.node(id)).collect()
    }

    /// Check that this index covers exactly the nodes of `graph`.
    pub fn verify(&self, graph: &Graph) -> Result<(), BuildError> {
        if self.entries.len() != graph.len() {
            return Err(BuildError::InvariantViolation(format!(
                "search index has {} entries for {} nodes",
                self.entries.len(),
                graph.len()
            )));
        }
        match self.entries.iter().find(|e| graph.slot(&e.id) != Some(e.slot)) {
            Some(stale) => Err(BuildError::InvariantViolation(format!(
                "search index entry {} does not match the graph",
                stale.id
            ))),
            None => Ok(()),
        }
    }
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex").field("entries", &self.entries.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parser::parse;
    use crate::document::Format;
    use crate::graph::builder::build;
    use crate::layout::direction::Direction;

    fn indexed(json: &str) -> (Graph, SearchIndex) {
        let graph = build(&parse(json, Format::Json).unwrap().unwrap(), Direction::Right).unwrap();
        let index = SearchIndex::rebuild(&graph);
        (graph, index)
    }

    fn strs(ids: Vec<NodeId>) -> Vec<String> {
        ids.into_iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn empty_term_matches_nothing() {
        let (_, index) = indexed(r#"{"a":"b"}"#);
        assert!(index.query("").is_empty());
        assert_eq!(index.first_match(""), None);
    }

    #[test]
    fn case_insensitive_on_label_and_value() {
        let (_, index) = indexed(r#"{"Name":"Ada","other":{"nickname":"ADA L"}}"#);
        assert_eq!(strs(index.query("name")), vec!["$.Name", "$.other.nickname"]);
        assert_eq!(strs(index.query("ada")), vec!["$.Name", "$.other.nickname"]);
        assert!(index.query("zzz").is_empty());
    }

    #[test]
    fn shallowest_first_then_build_order() {
        let (_, index) = indexed(r#"{"deep":{"hit":1},"hit":2,"z":{"hit":3}}"#);
        assert_eq!(strs(index.query("hit")), vec!["$.hit", "$.deep.hit", "$.z.hit"]);
    }

    #[test]
    fn container_summaries_are_not_searchable() {
        let (_, index) = indexed(r#"{"list":[1,2]}"#);
        assert!(index.query("items").is_empty());
        assert_eq!(strs(index.query("2")), vec!["$.list[1]"]);
    }

    #[test]
    fn verify_detects_mismatch() {
        let (graph, index) = indexed(r#"{"a":1}"#);
        assert!(index.verify(&graph).is_ok());
        let (other, _) = indexed(r#"{"b":1,"c":2}"#);
        assert!(matches!(index.verify(&other), Err(BuildError::InvariantViolation(_))));
    }

    #[test]
    fn search_resolves_nodes() {
        let (graph, index) = indexed(r#"{"k":"needle"}"#);
        let nodes = index.search(&graph, "NEED");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].label, "k");
    }
}
