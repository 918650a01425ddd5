//! Identity-keyed difference between two graph generations.
//!
//! Node identities are structural paths, so a renderer can keep the
//! position of every node not listed here.

use super::{Graph, NodeId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphDiff {
    /// In the new graph only, in its build order.
    pub added: Vec<NodeId>,
    /// In the old graph only, in its build order.
    pub removed: Vec<NodeId>,
    /// In both, with a different label, value, type or child count.
    pub changed: Vec<NodeId>,
    pub direction_changed: bool,
}

impl GraphDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty() && !self.direction_changed
    }

    /// True when only the direction moved and every node kept its identity
    /// and content.
    pub fn is_direction_only(&self) -> bool {
        self.direction_changed && self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

pub fn diff(previous: &Graph, next: &Graph) -> GraphDiff {
    let mut result = GraphDiff {
        direction_changed: previous.direction() != next.direction(),
        ..GraphDiff::default()
    };

    for node in next.nodes() {
        match previous.node(&node.id) {
            None => result.added.push(node.id.clone()),
            Some(old) => {
                let same = old.label == node.label
                    && old.value == node.value
                    && old.value_type == node.value_type
                    && old.child_count == node.child_count;
                if !same {
                    result.changed.push(node.id.clone());
                }
            }
        }
    }
    result.removed = previous
        .nodes()
        .iter()
        .filter(|node| !next.contains(&node.id))
        .map(|node| node.id.clone())
        .collect();
    result
}
