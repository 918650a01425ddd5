use crate::config::ViewerConfig;
use crate::document::parser::{parse_with_limits, ParseLimits};
use crate::document::{Document, NormalizedValue};
use crate::error::{ParseError, ViewerError};
use crate::graph::builder::{build_with_limits, BuildLimits};
use crate::graph::Graph;
use crate::layout::direction::Direction;
use crate::search::SearchIndex;

/// Result of one successful build: the graph and the index derived from it.
pub struct BuildOutput {
    pub graph: Graph,
    pub index: SearchIndex,
}

/// The document pipeline: Parse → Build → Index → Verify.
///
/// Stateless apart from its limits; the session decides when to run which
/// half.
#[derive(Debug, Clone, Default)]
pub struct GraphPipeline {
    parse_limits: ParseLimits,
    build_limits: BuildLimits,
}

impl GraphPipeline {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            parse_limits: config.parse_limits(),
            build_limits: config.build_limits(),
        }
    }

    pub fn with_build_limits(mut self, limits: BuildLimits) -> Self {
        self.build_limits = limits;
        self
    }

    pub fn with_parse_limits(mut self, limits: ParseLimits) -> Self {
        self.parse_limits = limits;
        self
    }

    /// Phase 1: Parse. `Ok(None)` is an empty document.
    pub fn parse(&self, document: &Document) -> Result<Option<NormalizedValue>, ParseError> {
        parse_with_limits(&document.text, document.format, self.parse_limits).map_err(|e| {
            log::debug!("revision {} failed to parse as {}: {}", document.revision, document.format, e);
            e
        })
    }

    /// Phases 2-4: Build, Index, Verify. Any invariant violation aborts the
    /// build instead of handing out an inconsistent graph.
    pub fn build(&self, value: Option<&NormalizedValue>, direction: Direction) -> Result<BuildOutput, ViewerError> {
        let graph = match value {
            Some(value) => build_with_limits(value, direction, &self.build_limits)?,
            None => Graph::empty(direction),
        };
        let index = SearchIndex::rebuild(&graph);

        if let Err(defect) = graph.verify().and_then(|()| index.verify(&graph)) {
            log::error!("discarding build: {defect}");
            return Err(defect.into());
        }
        Ok(BuildOutput { graph, index })
    }

    /// Whole pipeline for one document.
    pub fn process(&self, document: &Document, direction: Direction) -> Result<BuildOutput, ViewerError> {
        let value = self.parse(document)?;
        self.build(value.as_ref(), direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Format;
    use crate::error::BuildError;

    fn doc(text: &str) -> Document {
        Document {
            text: text.to_string(),
            format: Format::Json,
            revision: 1,
        }
    }

    #[test]
    fn process_builds_graph_and_index_together() {
        let pipeline = GraphPipeline::default();
        let out = pipeline.process(&doc(r#"{"a":{"b":1,"c":[1,2]}}"#), Direction::Right).unwrap();
        assert_eq!(out.graph.len(), 6);
        assert_eq!(out.graph.edges().len(), 5);
        assert_eq!(out.index.len(), out.graph.len());
    }

    #[test]
    fn parse_failure_stops_before_build() {
        let pipeline = GraphPipeline::default();
        let err = pipeline.process(&doc(r#"{"a":}"#), Direction::Right).err().unwrap();
        assert!(matches!(err, ViewerError::Parse(ParseError::Syntax { .. })));
    }

    #[test]
    fn empty_document_builds_empty_graph() {
        let pipeline = GraphPipeline::default();
        let out = pipeline.process(&doc("   "), Direction::Down).unwrap();
        assert!(out.graph.is_empty());
        assert_eq!(out.graph.direction(), Direction::Down);
        assert!(out.index.is_empty());
    }

    #[test]
    fn build_limits_surface_as_resource_errors() {
        let pipeline = GraphPipeline::default().with_build_limits(BuildLimits {
            max_nodes: 2,
            ..BuildLimits::default()
        });
        let err = pipeline.process(&doc("[1,2,3]"), Direction::Right).err().unwrap();
        assert_eq!(err, ViewerError::Build(BuildError::GraphTooLarge { limit: 2 }));
        assert!(err.is_resource_limit());
    }
}
