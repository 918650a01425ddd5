//! Graph model: nodes keyed by structural path, parent→child edges, and the
//! direction hint the graph was built with.
//!
//! Nodes are stored in pre-order build order, so the descendants of a node
//! occupy the contiguous slots right after it.

pub mod builder;
pub mod diff;

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::error::BuildError;
use crate::layout::direction::Direction;

/// Stable identity of a node: the structural path from the root.
///
/// The root is `$`. Object members append `.key` when the key is a plain
/// identifier and `["key"]` (JSON-quoted) otherwise; array elements append
/// `[index]`. Two different paths never render to the same string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn root() -> Self {
        Self("$".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn member(&self, key: &str) -> Self {
        if is_identifier(key) {
            Self(format!("{}.{key}", self.0))
        } else {
            let quoted = serde_json::to_string(key).unwrap_or_else(|_| format!("{key:?}"));
            Self(format!("{}[{quoted}]", self.0))
        }
    }

    pub fn element(&self, index: usize) -> Self {
        Self(format!("{}[{index}]", self.0))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(path: &str) -> Self {
        Self(path.to_string())
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Structural role of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Root,
    Object,
    Array,
    Scalar,
}

/// Type of the value a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Null,
    Boolean,
    Number,
    String,
    Object,
    Array,
}

impl ValueType {
    pub fn is_container(self) -> bool {
        matches!(self, ValueType::Object | ValueType::Array)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub value_type: ValueType,
    /// Key, array index, or `root`.
    pub label: String,
    /// Scalar text, or a `{n keys}` / `[n items]` summary for containers.
    pub value: String,
    pub depth: usize,
    pub child_count: usize,
    /// Rendering hint: large containers start collapsed. The effective state
    /// lives in [`crate::layout::hints::ViewHints`].
    pub collapsed_by_default: bool,
}

impl Node {
    pub fn is_container(&self) -> bool {
        self.value_type.is_container()
    }

    /// Scalar text a search may match; `None` for containers.
    pub fn scalar_value(&self) -> Option<&str> {
        (!self.is_container()).then_some(self.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
}

/// One generation of the document graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Graph {
    direction: Direction,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    #[serde(skip)]
    slots: HashMap<NodeId, usize>,
    #[serde(skip)]
    parents: Vec<Option<usize>>,
    #[serde(skip)]
    children: Vec<Vec<usize>>,
    /// One past the last descendant slot of each node.
    #[serde(skip)]
    subtree_end: Vec<usize>,
}

impl Graph {
    /// Graph of an empty document.
    pub fn empty(direction: Direction) -> Self {
        Self {
            direction,
            nodes: Vec::new(),
            edges: Vec::new(),
            slots: HashMap::new(),
            parents: Vec::new(),
            children: Vec::new(),
            subtree_end: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(direction: Direction, capacity: usize) -> Self {
        Self {
            direction,
            nodes: Vec::with_capacity(capacity),
            edges: Vec::with_capacity(capacity.saturating_sub(1)),
            slots: HashMap::with_capacity(capacity),
            parents: Vec::with_capacity(capacity),
            children: Vec::with_capacity(capacity),
            subtree_end: Vec::with_capacity(capacity),
        }
    }

    /// Append a node under `parent` (a slot already present). Nodes must
    /// arrive in pre-order.
    pub(crate) fn push(&mut self, node: Node, parent: Option<usize>) -> usize {
        let slot = self.nodes.len();
        if let Some(parent) = parent {
            self.edges.push(Edge {
                source: self.nodes[parent].id.clone(),
                target: node.id.clone(),
            });
            self.children[parent].push(slot);
        }
        self.slots.insert(node.id.clone(), slot);
        self.nodes.push(node);
        self.parents.push(parent);
        self.children.push(Vec::new());
        self.subtree_end.push(slot + 1);
        slot
    }

    /// Fill in subtree extents once every node is in place.
    pub(crate) fn seal(&mut self) {
        for slot in (0..self.nodes.len()).rev() {
            let end = self.children[slot]
                .last()
                .map_or(slot + 1, |&last| self.subtree_end[last]);
            self.subtree_end[slot] = end;
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.slot(id).map(|slot| &self.nodes[slot])
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.slots.contains_key(id)
    }

    /// Build-order position of a node.
    pub fn slot(&self, id: &NodeId) -> Option<usize> {
        self.slots.get(id).copied()
    }

    pub fn parent(&self, id: &NodeId) -> Option<&Node> {
        let slot = self.slot(id)?;
        self.parents[slot].map(|p| &self.nodes[p])
    }

    pub fn children(&self, id: &NodeId) -> impl Iterator<Item = &Node> {
        let slots = self.slot(id).map_or(&[][..], |slot| &self.children[slot][..]);
        slots.iter().map(move |&child| &self.nodes[child])
    }

    pub(crate) fn child_slots(&self, slot: usize) -> &[usize] {
        &self.children[slot]
    }

    pub(crate) fn subtree_end(&self, slot: usize) -> usize {
        self.subtree_end[slot]
    }

    /// The node and all of its descendants, in build order.
    pub fn subtree(&self, id: &NodeId) -> &[Node] {
        match self.slot(id) {
            Some(slot) => &self.nodes[slot..self.subtree_end[slot]],
            None => &[],
        }
    }

    /// Check the structural invariants: every edge joins two nodes of this
    /// graph, every node but the root has exactly one parent edge, and every
    /// node is reachable from the root.
    pub fn verify(&self) -> Result<(), BuildError> {
        let violation = |msg: String| Err(BuildError::InvariantViolation(msg));

        if self.nodes.len() != self.slots.len() {
            return violation(format!(
                "{} nodes but {} distinct identities",
                self.nodes.len(),
                self.slots.len()
            ));
        }
        if !self.nodes.is_empty() && self.edges.len() != self.nodes.len() - 1 {
            return violation(format!(
                "{} edges for {} nodes",
                self.edges.len(),
                self.nodes.len()
            ));
        }

        let mut has_parent = vec![false; self.nodes.len()];
        for edge in &self.edges {
            let (Some(_), Some(target)) = (self.slot(&edge.source), self.slot(&edge.target)) else {
                return violation(format!("edge {} -> {} has a missing endpoint", edge.source, edge.target));
            };
            if std::mem::replace(&mut has_parent[target], true) {
                return violation(format!("node {} has more than one parent", edge.target));
            }
        }

        let mut reached = vec![false; self.nodes.len()];
        let mut stack: Vec<usize> = if self.nodes.is_empty() { Vec::new() } else { vec![0] };
        while let Some(slot) = stack.pop() {
            if std::mem::replace(&mut reached[slot], true) {
                return violation(format!("node {} reached twice", self.nodes[slot].id));
            }
            stack.extend(self.children[slot].iter().copied());
        }
        if let Some(orphan) = reached.iter().position(|r| !r) {
            return violation(format!("node {} unreachable from root", self.nodes[orphan].id));
        }
        Ok(())
    }

    /// Pretty JSON of nodes, edges and direction, for external exporters.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_quote_non_identifier_keys() {
        let root = NodeId::root();
        assert_eq!(root.member("a").as_str(), "$.a");
        assert_eq!(root.member("a.b").as_str(), r#"$["a.b"]"#);
        assert_eq!(root.member("9lives").as_str(), r#"$["9lives"]"#);
        assert_eq!(root.member("").as_str(), r#"$[""]"#);
        assert_eq!(root.member("x").element(3).as_str(), "$.x[3]");
        assert_ne!(root.member("a").member("b"), root.member("a.b"));
    }

    #[test]
    fn empty_graph_is_valid() {
        let graph = Graph::empty(Direction::Right);
        assert!(graph.is_empty());
        assert!(graph.root().is_none());
        assert!(graph.verify().is_ok());
    }
}
