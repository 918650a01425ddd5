//! Error taxonomy.
//!
//! Everything recoverable travels as a value: [`ParseError`] for input the
//! parser rejects, [`BuildError`] for resource bounds hit while building the
//! graph, and [`ViewerError`] for what a session publishes to its consumers.
//! [`BuildError::InvariantViolation`] is the one defect class; it aborts the
//! build and keeps the previous graph.

use std::fmt;

use thiserror::Error;

use crate::document::Format;

/// Location of a parse failure inside the raw text.
///
/// `line` and `column` are 1-based; `offset` is a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub offset: Option<usize>,
}

impl Position {
    /// Position of a byte offset, with line and column derived from `text`.
    pub fn at_offset(text: &str, offset: usize) -> Self {
        let offset = offset.min(text.len());
        let before = &text.as_bytes()[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |nl| nl + 1);
        Self {
            line: Some(line),
            column: Some(offset - line_start + 1),
            offset: Some(offset),
        }
    }

    /// Position of a 1-based line/column pair, with the byte offset derived
    /// from `text` when the pair falls inside it.
    pub fn at_line_column(text: &str, line: usize, column: usize) -> Self {
        let offset = text
            .split_inclusive('\n')
            .take(line.saturating_sub(1))
            .map(str::len)
            .sum::<usize>()
            .checked_add(column.saturating_sub(1))
            .filter(|&off| off <= text.len());
        Self {
            line: Some(line),
            column: Some(column),
            offset,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column, self.offset) {
            (Some(line), Some(column), _) => write!(f, "line {line}, column {column}"),
            (Some(line), None, _) => write!(f, "line {line}"),
            (None, _, Some(offset)) => write!(f, "byte {offset}"),
            _ => f.write_str("unknown position"),
        }
    }
}

fn at(position: &Option<Position>) -> String {
    position.map(|p| format!(" at {p}")).unwrap_or_default()
}

/// Input rejected by the parser/validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{format} syntax error{}: {message}", at(.position))]
    Syntax {
        format: Format,
        message: String,
        position: Option<Position>,
    },
    #[error("document nested deeper than {limit} levels{}", at(.position))]
    TooDeep {
        limit: usize,
        position: Option<Position>,
    },
    #[error("{format} input not supported: {message}")]
    Unsupported { format: Format, message: String },
}

impl ParseError {
    pub(crate) fn syntax(format: Format, message: impl Into<String>, position: Option<Position>) -> Self {
        Self::Syntax {
            format,
            message: message.into(),
            position,
        }
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            Self::Syntax { position, .. } | Self::TooDeep { position, .. } => *position,
            Self::Unsupported { .. } => None,
        }
    }
}

/// Failure while turning a normalized value into a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("graph exceeds the limit of {limit} nodes")]
    GraphTooLarge { limit: usize },
    #[error("document nested deeper than {limit} levels")]
    TooDeep { limit: usize },
    #[error("graph invariant violated: {0}")]
    InvariantViolation(String),
}

/// Error state published by a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewerError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Build(#[from] BuildError),
}

impl ViewerError {
    /// True when a size or depth bound was hit; the UI should suggest a
    /// smaller document rather than a syntax fix.
    pub fn is_resource_limit(&self) -> bool {
        matches!(
            self,
            Self::Parse(ParseError::TooDeep { .. })
                | Self::Build(BuildError::TooDeep { .. } | BuildError::GraphTooLarge { .. })
        )
    }

    /// True for programming defects rather than user errors.
    pub fn is_defect(&self) -> bool {
        matches!(self, Self::Build(BuildError::InvariantViolation(_)))
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            Self::Parse(e) => e.position(),
            Self::Build(_) => None,
        }
    }
}

/// Unknown name passed where a [`Format`] was expected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown format `{0}` (expected one of json, yaml, toml, xml, csv)")]
pub struct UnknownFormat(pub String);

/// Failure loading or validating a [`crate::config::ViewerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Syntax(#[from] toml::de::Error),
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
