//! NormalizedValue → Graph.
//!
//! Walks the value with an explicit work stack (no call-stack recursion),
//! emitting nodes in pre-order with path-derived identities. Same input,
//! same graph.

use super::{Graph, Node, NodeId, NodeKind, ValueType};
use crate::document::NormalizedValue;
use crate::error::BuildError;
use crate::layout::direction::Direction;

/// Bounds and thresholds for a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildLimits {
    /// Deepest node depth allowed (root is depth 0).
    pub max_depth: usize,
    pub max_nodes: usize,
    /// Containers with more children than this start collapsed.
    pub collapse_threshold: usize,
}

impl Default for BuildLimits {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_nodes: 100_000,
            collapse_threshold: 50,
        }
    }
}

struct Pending<'a> {
    value: &'a NormalizedValue,
    id: NodeId,
    label: String,
    parent: Option<usize>,
    depth: usize,
}

/// Build a graph with the default limits.
pub fn build(value: &NormalizedValue, direction: Direction) -> Result<Graph, BuildError> {
    build_with_limits(value, direction, &BuildLimits::default())
}

pub fn build_with_limits(
    value: &NormalizedValue,
    direction: Direction,
    limits: &BuildLimits,
) -> Result<Graph, BuildError> {
    let mut graph = Graph::with_capacity(direction, value.count().min(limits.max_nodes));
    let mut stack = vec![Pending {
        value,
        id: NodeId::root(),
        label: "root".to_string(),
        parent: None,
        depth: 0,
    }];

    while let Some(item) = stack.pop() {
        if item.depth > limits.max_depth {
            return Err(BuildError::TooDeep {
                limit: limits.max_depth,
            });
        }
        if graph.len() >= limits.max_nodes {
            return Err(BuildError::GraphTooLarge {
                limit: limits.max_nodes,
            });
        }

        let node = make_node(&item, limits.collapse_threshold);
        let slot = graph.push(node, item.parent);

        // reversed so children pop, and land in the arena, in document order
        match item.value {
            NormalizedValue::Mapping(map) => {
                for (key, child) in map.iter().rev() {
                    stack.push(Pending {
                        value: child,
                        id: item.id.member(key),
                        label: key.to_string(),
                        parent: Some(slot),
                        depth: item.depth + 1,
                    });
                }
            }
            NormalizedValue::Sequence(items) => {
                for (index, child) in items.iter().enumerate().rev() {
                    stack.push(Pending {
                        value: child,
                        id: item.id.element(index),
                        label: index.to_string(),
                        parent: Some(slot),
                        depth: item.depth + 1,
                    });
                }
            }
            _ => {}
        }
    }

    graph.seal();
    log::debug!(
        "built graph: {} nodes, {} edges, direction {}",
        graph.len(),
        graph.edges().len(),
        direction
    );
    Ok(graph)
}

fn make_node(item: &Pending<'_>, collapse_threshold: usize) -> Node {
    let value_type = match item.value {
        NormalizedValue::Null => ValueType::Null,
        NormalizedValue::Bool(_) => ValueType::Boolean,
        NormalizedValue::Number(_) => ValueType::Number,
        NormalizedValue::String(_) => ValueType::String,
        NormalizedValue::Sequence(_) => ValueType::Array,
        NormalizedValue::Mapping(_) => ValueType::Object,
    };
    let kind = match (item.parent, value_type) {
        (None, _) => NodeKind::Root,
        (Some(_), ValueType::Object) => NodeKind::Object,
        (Some(_), ValueType::Array) => NodeKind::Array,
        (Some(_), _) => NodeKind::Scalar,
    };
    let child_count = item.value.len();
    let value = match item.value.scalar_text() {
        Some(text) => text.to_string(),
        None => summary(value_type, child_count),
    };

    Node {
        id: item.id.clone(),
        kind,
        value_type,
        label: item.label.clone(),
        value,
        depth: item.depth,
        child_count,
        collapsed_by_default: item.value.is_container() && child_count > collapse_threshold,
    }
}

fn summary(value_type: ValueType, count: usize) -> String {
    let plural = if count == 1 { "" } else { "s" };
    match value_type {
        ValueType::Object => format!("{{{count} key{plural}}}"),
        _ => format!("[{count} item{plural}]"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parser::parse;
    use crate::document::Format;

    fn graph_of(json: &str) -> Graph {
        let value = parse(json, Format::Json).unwrap().unwrap();
        build(&value, Direction::default()).unwrap()
    }

    fn ids(graph: &Graph) -> Vec<&str> {
        graph.nodes().iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn nested_object_scenario() {
        let graph = graph_of(r#"{"a":{"b":1,"c":[1,2]}}"#);
        assert_eq!(ids(&graph), vec!["$", "$.a", "$.a.b", "$.a.c", "$.a.c[0]", "$.a.c[1]"]);
        let edges: Vec<(&str, &str)> = graph
            .edges()
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();
        assert_eq!(
            edges,
            vec![
                ("$", "$.a"),
                ("$.a", "$.a.b"),
                ("$.a", "$.a.c"),
                ("$.a.c", "$.a.c[0]"),
                ("$.a.c", "$.a.c[1]"),
            ]
        );
        assert_eq!(graph.direction(), Direction::Right);
        assert!(graph.verify().is_ok());
    }

    #[test]
    fn node_metadata() {
        let graph = graph_of(r#"{"name":"ada","tags":["x"],"meta":{}}"#);
        let root = graph.root().unwrap();
        assert_eq!(root.kind, NodeKind::Root);
        assert_eq!(root.value, "{3 keys}");
        let name = graph.node(&"$.name".into()).unwrap();
        assert_eq!(name.kind, NodeKind::Scalar);
        assert_eq!(name.value_type, ValueType::String);
        assert_eq!(name.label, "name");
        assert_eq!(name.value, "ada");
        let tags = graph.node(&"$.tags".into()).unwrap();
        assert_eq!(tags.kind, NodeKind::Array);
        assert_eq!(tags.value, "[1 item]");
        assert_eq!(graph.node(&"$.tags[0]".into()).unwrap().label, "0");
    }

    #[test]
    fn scalar_document_is_single_root() {
        let graph = graph_of("42");
        assert_eq!(graph.len(), 1);
        assert!(graph.edges().is_empty());
        assert_eq!(graph.root().unwrap().value, "42");
    }

    #[test]
    fn build_is_deterministic() {
        let value = parse(r#"{"k":[{"x":null},true,"s"]}"#, Format::Json).unwrap().unwrap();
        let first = build(&value, Direction::Left).unwrap();
        let second = build(&value, Direction::Left).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn direction_does_not_change_structure() {
        let value = parse(r#"{"a":[1,2,3]}"#, Format::Json).unwrap().unwrap();
        let right = build(&value, Direction::Right).unwrap();
        let up = build(&value, Direction::Up).unwrap();
        assert_eq!(right.nodes(), up.nodes());
        assert_eq!(right.edges(), up.edges());
        assert_eq!(up.direction(), Direction::Up);
    }

    #[test]
    fn large_containers_start_collapsed_but_keep_children() {
        let items: Vec<String> = (0..5).map(|i| i.to_string()).collect();
        let json = format!("{{\"big\":[{}],\"small\":[1]}}", items.join(","));
        let value = parse(&json, Format::Json).unwrap().unwrap();
        let limits = BuildLimits {
            collapse_threshold: 3,
            ..BuildLimits::default()
        };
        let graph = build_with_limits(&value, Direction::Right, &limits).unwrap();
        assert!(graph.node(&"$.big".into()).unwrap().collapsed_by_default);
        assert!(!graph.node(&"$.small".into()).unwrap().collapsed_by_default);
        assert_eq!(graph.children(&"$.big".into()).count(), 5);
    }

    #[test]
    fn node_bound_is_graph_too_large() {
        let value = parse("[1,2,3,4]", Format::Json).unwrap().unwrap();
        let limits = BuildLimits {
            max_nodes: 3,
            ..BuildLimits::default()
        };
        assert_eq!(
            build_with_limits(&value, Direction::Right, &limits),
            Err(BuildError::GraphTooLarge { limit: 3 })
        );
    }

    #[test]
    fn depth_bound_is_too_deep() {
        let value = parse("[[[1]]]", Format::Json).unwrap().unwrap();
        let limits = BuildLimits {
            max_depth: 2,
            ..BuildLimits::default()
        };
        assert_eq!(
            build_with_limits(&value, Direction::Right, &limits),
            Err(BuildError::TooDeep { limit: 2 })
        );
    }

    #[test]
    fn subtree_is_contiguous() {
        let graph = graph_of(r#"{"a":{"b":[1,2]},"c":3}"#);
        let subtree: Vec<&str> = graph.subtree(&"$.a".into()).iter().map(|n| n.id.as_str()).collect();
        assert_eq!(subtree, vec!["$.a", "$.a.b", "$.a.b[0]", "$.a.b[1]"]);
        assert_eq!(graph.parent(&"$.c".into()).unwrap().id, NodeId::root());
    }
}
