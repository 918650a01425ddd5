pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod graph;
pub mod layout;
pub mod search;

pub use config::ViewerConfig;
pub use document::{Document, Format, NormalizedValue};
pub use engine::pipeline::GraphPipeline;
pub use engine::session::{PublishedState, RecomputeOutcome, Session, SessionEvent, Snapshot};
pub use error::{BuildError, ParseError, ViewerError};
pub use graph::{Edge, Graph, Node, NodeId};
pub use layout::direction::Direction;
