//! In-memory record of what a sequencer did and when

use crate::annotation::AnnotationKind;
use crate::axes::Axis;
use crate::layout::ChartPlacement;
use crate::phase::Phase;
use ghost_kernel::clock::Millis;
use ghost_kernel::generation::Generation;
use ghost_kernel::AnnotationState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Something observable the sequencer did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    /// `start()` called
    RunStarted { skip: bool },
    /// Container probe came back unusable
    Deferred { attempt: u32 },
    /// Phase began
    PhaseStarted { phase: Phase },
    /// Phase finished
    PhaseCompleted { phase: Phase },
    /// Axis finished growing
    AxisGrown { axis: Axis },
    /// Series began drawing
    SeriesStarted { index: usize },
    /// Series finished drawing
    SeriesDrawn { index: usize },
    /// Annotation changed state
    Annotation { kind: AnnotationKind, state: AnnotationState },
    /// Chart moved in or out of the sidebar
    LayoutChanged { placement: ChartPlacement },
    /// Sidebar card appended
    MetricCardAppended { index: usize },
    /// An entry from an older generation reached dispatch
    StaleDropped { from: Generation },
    /// `stop()` cancelled the run
    Stopped,
    /// Error handed to the host
    ErrorReported { message: String },
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::RunStarted { skip } => write!(f, "run started (skip={skip})"),
            TraceEvent::Deferred { attempt } => write!(f, "deferred, container probe {attempt}"),
            TraceEvent::PhaseStarted { phase } => write!(f, "{phase} started"),
            TraceEvent::PhaseCompleted { phase } => write!(f, "{phase} completed"),
            TraceEvent::AxisGrown { axis } => write!(f, "{axis} grown"),
            TraceEvent::SeriesStarted { index } => write!(f, "series {index} started"),
            TraceEvent::SeriesDrawn { index } => write!(f, "series {index} drawn"),
            TraceEvent::Annotation { kind, state } => write!(f, "{kind} -> {state:?}"),
            TraceEvent::LayoutChanged { placement } => write!(f, "layout -> {placement:?}"),
            TraceEvent::MetricCardAppended { index } => write!(f, "metric card {index} appended"),
            TraceEvent::StaleDropped { from } => write!(f, "stale entry from {from} dropped"),
            TraceEvent::Stopped => f.write_str("stopped"),
            TraceEvent::ErrorReported { message } => write!(f, "error reported: {message}"),
        }
    }
}

/// One recorded event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Virtual time of the event
    pub at: Millis,
    /// Run the event belongs to
    pub generation: Generation,
    /// What happened
    #[serde(flatten)]
    pub event: TraceEvent,
}

/// Append-only event log, kept across runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trace {
    entries: Vec<TraceEntry>,
}

impl Trace {
    /// Empty trace
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, at: Millis, generation: Generation, event: TraceEvent) {
        tracing::trace!(%at, %generation, %event, "trace");
        self.entries.push(TraceEntry { at, generation, event });
    }

    /// Every entry in record order
    #[must_use]
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// Entries recorded under `generation`
    pub fn for_generation(&self, generation: Generation) -> impl Iterator<Item = &TraceEntry> {
        self.entries.iter().filter(move |e| e.generation == generation)
    }

    /// First time `event` was recorded
    #[must_use]
    pub fn time_of(&self, event: &TraceEvent) -> Option<Millis> {
        self.entries.iter().find(|e| &e.event == event).map(|e| e.at)
    }

    /// Number of entries equal to `event`
    #[must_use]
    pub fn count(&self, event: &TraceEvent) -> usize {
        self.entries.iter().filter(|e| &e.event == event).count()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// One line per entry
    #[must_use]
    pub fn render_text(&self) -> String {
        use std::fmt::Write;
        let mut out = String::new();
        for entry in &self.entries {
            let _ = writeln!(out, "{:>8} {:<6} {}", entry.at.to_string(), entry.generation.to_string(), entry.event);
        }
        out
    }
}
