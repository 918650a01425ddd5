//! Viewing session: the recomputation controller and the published state.
//!
//! One session per open document. It owns the pending document, the last
//! good value, the direction, view hints and the current [`Snapshot`]. A
//! snapshot pairs a graph with the index built from it and is swapped in as
//! one `Arc`, so a reader never sees one without the other.
//!
//! Time is an input. `*_at` methods take the current `Instant`; the plain
//! variants read the clock.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Instant;

use super::pipeline::GraphPipeline;
use crate::config::ViewerConfig;
use crate::document::{Document, Format, NormalizedValue};
use crate::error::{ConfigError, ViewerError};
use crate::graph::diff::{diff, GraphDiff};
use crate::graph::{Graph, Node, NodeId};
use crate::layout::arrange::{arrange, Placement};
use crate::layout::direction::Direction;
use crate::layout::hints::ViewHints;
use crate::search::SearchIndex;

/// A graph generation and its search index.
#[derive(Debug)]
pub struct Snapshot {
    graph: Graph,
    index: SearchIndex,
    revision: u64,
}

impl Snapshot {
    fn initial(direction: Direction) -> Self {
        Self {
            graph: Graph::empty(direction),
            index: SearchIndex::empty(),
            revision: 0,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    /// Document revision this graph was built from (0 before the first build).
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn direction(&self) -> Direction {
        self.graph.direction()
    }

    pub fn search(&self, term: &str) -> Vec<&Node> {
        self.index.search(&self.graph, term)
    }
}

/// What a renderer reads.
#[derive(Debug, Clone)]
pub struct PublishedState {
    pub snapshot: Arc<Snapshot>,
    pub error: Option<ViewerError>,
    pub direction: Direction,
    pub live: bool,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Published(Arc<Snapshot>),
    ErrorChanged(Option<ViewerError>),
    DirectionChanged(Direction),
}

/// What a recompute request did.
#[derive(Debug, Clone, PartialEq)]
pub enum RecomputeOutcome {
    /// A new snapshot was published.
    Rebuilt(GraphDiff),
    /// The new input matched the current graph; nothing was rebuilt.
    Skipped,
    /// The pipeline failed; the previous snapshot stays current.
    Failed(ViewerError),
    /// Nothing was due.
    Idle,
}

/// Counters for the lifetime of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub rebuilds: u64,
    pub skipped: u64,
    pub failures: u64,
    /// Revisions replaced by a newer one before they were built.
    pub superseded: u64,
}

pub struct Session {
    config: ViewerConfig,
    pipeline: GraphPipeline,
    live: bool,
    direction: Direction,
    document: Option<Document>,
    /// Latest document not yet run through the pipeline.
    dirty: bool,
    deadline: Option<Instant>,
    last_revision: u64,
    /// Value behind the current snapshot; `None` for an empty document.
    source: Option<NormalizedValue>,
    snapshot: Arc<Snapshot>,
    error: Option<ViewerError>,
    hints: ViewHints,
    subscribers: Vec<Sender<SessionEvent>>,
    stats: SessionStats,
}

impl Default for Session {
    fn default() -> Self {
        Self::from_valid(ViewerConfig::default())
    }
}

impl Session {
    /// Start a session with `config`, rejecting values the pipeline cannot
    /// honour (see [`ViewerConfig::validate`]).
    pub fn new(config: ViewerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: ViewerConfig) -> Self {
        let direction = Direction::default();
        Self {
            pipeline: GraphPipeline::new(&config),
            live: config.live,
            config,
            direction,
            document: None,
            dirty: false,
            deadline: None,
            last_revision: 0,
            source: None,
            snapshot: Arc::new(Snapshot::initial(direction)),
            error: None,
            hints: ViewHints::new(),
            subscribers: Vec::new(),
            stats: SessionStats::default(),
        }
    }

    // ── inputs ────────────────────────────────────────────────────────────

    /// Accept new editor text. Returns the revision assigned to it.
    pub fn set_document(&mut self, text: impl Into<String>, format: Format) -> u64 {
        self.set_document_at(text, format, Instant::now())
    }

    /// Accept new editor text at `now`.
    ///
    /// Live mode schedules a rebuild one debounce window after the latest
    /// edit; manual mode only records the text. Either way a revision that
    /// is replaced before it is built is dropped, never queued.
    pub fn set_document_at(&mut self, text: impl Into<String>, format: Format, now: Instant) -> u64 {
        self.last_revision += 1;
        let revision = self.last_revision;
        if self.dirty {
            self.stats.superseded += 1;
            log::debug!("revision {} superseded by {}", revision - 1, revision);
        }
        self.document = Some(Document {
            text: text.into(),
            format,
            revision,
        });
        self.dirty = true;
        self.deadline = self.live.then(|| now + self.config.debounce());
        revision
    }

    pub fn set_live_mode(&mut self, enabled: bool) {
        self.set_live_mode_at(enabled, Instant::now());
    }

    /// Switch between live and manual recompute. Turning live mode on with
    /// an unbuilt edit pending schedules it.
    pub fn set_live_mode_at(&mut self, enabled: bool, now: Instant) {
        self.live = enabled;
        self.deadline = (enabled && self.dirty).then(|| now + self.config.debounce());
    }

    /// Run a live-mode rebuild if its debounce window has passed.
    pub fn tick(&mut self) -> RecomputeOutcome {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> RecomputeOutcome {
        match self.deadline {
            Some(deadline) if self.live && self.dirty && now >= deadline => self.recompute_pending(),
            _ => RecomputeOutcome::Idle,
        }
    }

    /// Run a pending live-mode rebuild without waiting for the window.
    pub fn flush(&mut self) -> RecomputeOutcome {
        if self.live && self.dirty {
            self.recompute_pending()
        } else {
            RecomputeOutcome::Idle
        }
    }

    /// Explicit "transform now". Rebuilds the latest document in any mode.
    pub fn trigger_recompute(&mut self) -> RecomputeOutcome {
        if self.document.is_none() {
            return RecomputeOutcome::Idle;
        }
        self.recompute_pending()
    }

    /// Turn the layout a quarter step and rebuild from the last good value.
    /// No reparse and no live/manual gate. A pending error stays: it belongs
    /// to the editor text, which a rotation does not touch.
    ///
    /// The direction only moves once the rebuild succeeds. A failed rotation
    /// leaves direction, snapshot and error as they were.
    pub fn rotate_direction(&mut self) -> RecomputeOutcome {
        let next = self.direction.rotate();
        let revision = self.snapshot.revision;
        let outcome = match self.pipeline.build(self.source.as_ref(), next) {
            Ok(out) => {
                self.direction = next;
                log::debug!("direction now {next}");
                self.notify(SessionEvent::DirectionChanged(next));
                self.publish(out.graph, out.index, revision)
            }
            Err(err) => {
                self.stats.failures += 1;
                RecomputeOutcome::Failed(err)
            }
        };
        self.log_outcome(revision, &outcome);
        outcome
    }

    // ── queries ───────────────────────────────────────────────────────────

    pub fn search(&self, term: &str) -> Vec<&Node> {
        self.snapshot.search(term)
    }

    /// First search hit, focused as the new view root.
    pub fn search_and_focus(&mut self, term: &str) -> Option<NodeId> {
        let hit = self.snapshot.index().first_match(term)?;
        self.hints.focus(self.snapshot.graph(), &hit);
        Some(hit)
    }

    pub fn state(&self) -> PublishedState {
        PublishedState {
            snapshot: Arc::clone(&self.snapshot),
            error: self.error.clone(),
            direction: self.direction,
            live: self.live,
        }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn current_graph(&self) -> &Graph {
        self.snapshot.graph()
    }

    pub fn current_error(&self) -> Option<&ViewerError> {
        self.error.as_ref()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Revision of the latest accepted edit, built or not.
    pub fn latest_revision(&self) -> u64 {
        self.last_revision
    }

    pub fn has_pending(&self) -> bool {
        self.dirty
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    // ── view hints ────────────────────────────────────────────────────────

    pub fn hints(&self) -> &ViewHints {
        &self.hints
    }

    pub fn toggle_collapse(&mut self, id: &NodeId) -> Option<bool> {
        self.hints.toggle(self.snapshot.graph(), id)
    }

    pub fn expand_all(&mut self) {
        self.hints.expand_all(self.snapshot.graph());
    }

    pub fn collapse_all(&mut self) {
        self.hints.collapse_all(self.snapshot.graph());
    }

    pub fn focus(&mut self, id: &NodeId) -> bool {
        self.hints.focus(self.snapshot.graph(), id)
    }

    pub fn clear_focus(&mut self) {
        self.hints.clear_focus();
    }

    pub fn visible_nodes(&self) -> Vec<&Node> {
        self.hints.visible_nodes(self.snapshot.graph())
    }

    pub fn placements(&self) -> Vec<Placement> {
        arrange(self.snapshot.graph(), &self.hints, self.config.spacing())
    }

    // ── internals ─────────────────────────────────────────────────────────

    fn recompute_pending(&mut self) -> RecomputeOutcome {
        self.dirty = false;
        self.deadline = None;
        let Some(document) = self.document.as_ref() else {
            return RecomputeOutcome::Idle;
        };
        let revision = document.revision;

        let outcome = match self.pipeline.parse(document) {
            Err(err) => self.fail(err.into()),
            Ok(value) if value == self.source && self.snapshot.direction() == self.direction => {
                self.stats.skipped += 1;
                self.set_error(None);
                RecomputeOutcome::Skipped
            }
            Ok(value) => match self.pipeline.build(value.as_ref(), self.direction) {
                Ok(out) => {
                    self.source = value;
                    let outcome = self.publish(out.graph, out.index, revision);
                    self.set_error(None);
                    outcome
                }
                Err(err) => self.fail(err),
            },
        };
        self.log_outcome(revision, &outcome);
        outcome
    }

    fn publish(&mut self, graph: Graph, index: SearchIndex, revision: u64) -> RecomputeOutcome {
        let changes = diff(self.snapshot.graph(), &graph);
        self.hints.retain_existing(&graph);
        self.snapshot = Arc::new(Snapshot { graph, index, revision });
        self.stats.rebuilds += 1;
        self.notify(SessionEvent::Published(Arc::clone(&self.snapshot)));
        RecomputeOutcome::Rebuilt(changes)
    }

    fn fail(&mut self, err: ViewerError) -> RecomputeOutcome {
        self.stats.failures += 1;
        self.set_error(Some(err.clone()));
        RecomputeOutcome::Failed(err)
    }

    fn set_error(&mut self, error: Option<ViewerError>) {
        if self.error != error {
            self.error = error.clone();
            self.notify(SessionEvent::ErrorChanged(error));
        }
    }

    fn notify(&mut self, event: SessionEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn log_outcome(&self, revision: u64, outcome: &RecomputeOutcome) {
        match outcome {
            RecomputeOutcome::Rebuilt(changes) => log::debug!(
                "revision {revision}: rebuilt {} nodes (+{} -{} ~{})",
                self.snapshot.graph().len(),
                changes.added.len(),
                changes.removed.len(),
                changes.changed.len()
            ),
            RecomputeOutcome::Skipped => log::debug!("revision {revision}: unchanged, skipped"),
            RecomputeOutcome::Failed(err) => log::debug!("revision {revision}: failed: {err}"),
            RecomputeOutcome::Idle => {}
        }
    }
}
