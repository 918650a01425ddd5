//! View hints kept beside the graph, keyed by node identity.
//!
//! Collapse overrides and the focus root never touch the graph's structural
//! fields; a rebuild keeps the hints of every identity that survives.

use std::collections::HashMap;

use crate::graph::{Graph, Node, NodeId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewHints {
    collapsed: HashMap<NodeId, bool>,
    focus: Option<NodeId>,
}

impl ViewHints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective collapse state: the override if any, else the node's default.
    pub fn is_collapsed(&self, node: &Node) -> bool {
        node.is_container()
            && self
                .collapsed
                .get(&node.id)
                .copied()
                .unwrap_or(node.collapsed_by_default)
    }

    pub fn set_collapsed(&mut self, id: NodeId, collapsed: bool) {
        self.collapsed.insert(id, collapsed);
    }

    /// Flip a container's collapse state. Returns the new state, or `None`
    /// when `id` is not a container of `graph`.
    pub fn toggle(&mut self, graph: &Graph, id: &NodeId) -> Option<bool> {
        let node = graph.node(id).filter(|n| n.is_container())?;
        let collapsed = !self.is_collapsed(node);
        self.collapsed.insert(id.clone(), collapsed);
        Some(collapsed)
    }

    pub fn expand_all(&mut self, graph: &Graph) {
        self.set_all(graph, false);
    }

    pub fn collapse_all(&mut self, graph: &Graph) {
        self.set_all(graph, true);
    }

    fn set_all(&mut self, graph: &Graph, collapsed: bool) {
        self.collapsed = graph
            .nodes()
            .iter()
            .filter(|n| n.is_container())
            .map(|n| (n.id.clone(), collapsed))
            .collect();
    }

    /// Re-root the view at `id`. Returns false when `id` is not in `graph`.
    pub fn focus(&mut self, graph: &Graph, id: &NodeId) -> bool {
        if !graph.contains(id) {
            return false;
        }
        self.focus = Some(id.clone());
        true
    }

    pub fn clear_focus(&mut self) {
        self.focus = None;
    }

    pub fn focused(&self) -> Option<&NodeId> {
        self.focus.as_ref()
    }

    /// Drop hints for identities that no longer exist in `graph`.
    pub fn retain_existing(&mut self, graph: &Graph) {
        let before = self.collapsed.len();
        self.collapsed.retain(|id, _| graph.contains(id));
        if before != self.collapsed.len() {
            log::debug!("pruned {} stale collapse hints", before - self.collapsed.len());
        }
        if self.focus.as_ref().is_some_and(|id| !graph.contains(id)) {
            log::debug!("focus root vanished, clearing focus");
            self.focus = None;
        }
    }

    /// Slot of the node the view starts at: the focus root, else the graph root.
    pub(crate) fn start_slot(&self, graph: &Graph) -> Option<usize> {
        match &self.focus {
            Some(id) => graph.slot(id),
            None => (!graph.is_empty()).then_some(0),
        }
    }

    /// Nodes on screen: the subtree of the view root, minus everything below
    /// a collapsed container. Build order.
    pub fn visible_nodes<'g>(&self, graph: &'g Graph) -> Vec<&'g Node> {
        let Some(start) = self.start_slot(graph) else {
            return Vec::new();
        };
        let nodes = graph.nodes();
        let end = graph.subtree_end(start);
        let mut visible = Vec::new();
        let mut slot = start;
        while slot < end {
            let node = &nodes[slot];
            visible.push(node);
            slot = if self.is_collapsed(node) {
                graph.subtree_end(slot)
            } else {
                slot + 1
            };
        }
        visible
    }
}
