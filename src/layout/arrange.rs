//! Placement hints for an external renderer.
//!
//! Layered tree placement over the visible nodes: one layer per depth along
//! the current direction, leaves stacked `sibling_gap` apart across it, and
//! every expanded parent centered on its first and last child.

use serde::Serialize;

use super::hints::ViewHints;
use crate::graph::{Graph, NodeId};

/// Distances used by [`arrange`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacing {
    pub layer_gap: f32,
    pub sibling_gap: f32,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            layer_gap: 240.0,
            sibling_gap: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
}

/// Position every visible node. Output follows build order; the view root
/// sits at depth 0.
pub fn arrange(graph: &Graph, hints: &ViewHints, spacing: Spacing) -> Vec<Placement> {
    let Some(start) = hints.start_slot(graph) else {
        return Vec::new();
    };
    let visible = hints.visible_nodes(graph);
    let base_depth = graph.nodes()[start].depth;

    // slot → breadth, for visible slots only
    let end = graph.subtree_end(start);
    let mut breadth: Vec<Option<f32>> = vec![None; end - start];
    let mut expanded = vec![false; end - start];

    // leaves first, in build order
    let mut next_leaf = 0.0f32;
    for node in &visible {
        let Some(slot) = graph.slot(&node.id) else {
            continue;
        };
        let open = !hints.is_collapsed(node) && !graph.child_slots(slot).is_empty();
        expanded[slot - start] = open;
        if !open {
            breadth[slot - start] = Some(next_leaf);
            next_leaf += 1.0;
        }
    }

    // then parents, deepest first
    for node in visible.iter().rev() {
        let Some(slot) = graph.slot(&node.id) else {
            continue;
        };
        if !expanded[slot - start] {
            continue;
        }
        let children = graph.child_slots(slot);
        let (Some(&first), Some(&last)) = (children.first(), children.last()) else {
            continue;
        };
        let first = breadth[first - start].unwrap_or(0.0);
        let last = breadth[last - start].unwrap_or(first);
        breadth[slot - start] = Some((first + last) / 2.0);
    }

    let direction = graph.direction();
    visible
        .iter()
        .filter_map(|node| {
            let slot = graph.slot(&node.id)?;
            let across = breadth[slot - start]? * spacing.sibling_gap;
            let along = (node.depth - base_depth) as f32 * spacing.layer_gap;
            let (x, y) = direction.orient(along, across);
            Some(Placement {
                id: node.id.clone(),
                x,
                y,
            })
        })
        .collect()
}
