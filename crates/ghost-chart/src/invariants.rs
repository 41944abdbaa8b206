//! Ordering checks over a recorded [`Trace`]
//!
//! Each check looks at one generation at a time, in record order, and
//! returns every violation it finds. The simulator runs all of them after
//! every scenario.

use crate::axes::Axis;
use crate::phase::Phase;
use crate::trace::{Trace, TraceEntry, TraceEvent};
use ghost_kernel::clock::Millis;
use ghost_kernel::generation::Generation;
use std::collections::BTreeMap;

/// An ordering rule broken by a trace
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// Phases started out of play order
    #[error("{generation}: {phase} started after {previous}")]
    PhaseOutOfOrder {
        generation: Generation,
        phase: Phase,
        previous: Phase,
    },

    /// Gridlines started before both axes landed exactly once
    #[error("{generation}: gridlines started with x grown {x} times and y grown {y} times")]
    GridlinesBeforeAxes { generation: Generation, x: usize, y: usize },

    /// An axis signalled completion more than once
    #[error("{generation}: {axis} grown {count} times")]
    AxisGrownTwice {
        generation: Generation,
        axis: Axis,
        count: usize,
    },

    /// A series began before the previous one finished plus the pause
    #[error("{generation}: series {index} started at {at}, expected no earlier than {earliest}")]
    SeriesOverlap {
        generation: Generation,
        index: usize,
        at: Millis,
        earliest: Millis,
    },

    /// Series started out of index order
    #[error("{generation}: series {index} started, expected series {expected}")]
    SeriesSkipped {
        generation: Generation,
        index: usize,
        expected: usize,
    },

    /// Work was recorded after a stop without a restart in between
    #[error("{generation}: '{event}' recorded after stop")]
    WorkAfterStop { generation: Generation, event: String },
}

fn by_generation(trace: &Trace) -> BTreeMap<Generation, Vec<&TraceEntry>> {
    let mut groups: BTreeMap<Generation, Vec<&TraceEntry>> = BTreeMap::new();
    for entry in trace.entries() {
        groups.entry(entry.generation).or_default().push(entry);
    }
    groups
}

/// Phases start in play order within a run
#[must_use]
pub fn check_phase_order(trace: &Trace) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    for (generation, entries) in by_generation(trace) {
        let mut previous: Option<Phase> = None;
        for entry in entries {
            if let TraceEvent::PhaseStarted { phase } = entry.event {
                if let Some(previous) = previous.filter(|p| *p >= phase) {
                    violations.push(InvariantViolation::PhaseOutOfOrder {
                        generation,
                        phase,
                        previous,
                    });
                }
                previous = Some(phase);
            }
        }
    }
    violations
}

/// Gridlines start only after both axes grew, and each axis grows once
#[must_use]
pub fn check_gridlines_after_axes(trace: &Trace) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    for (generation, entries) in by_generation(trace) {
        let (mut x, mut y) = (0, 0);
        for entry in entries {
            match entry.event {
                TraceEvent::AxisGrown { axis: Axis::X } => x += 1,
                TraceEvent::AxisGrown { axis: Axis::Y } => y += 1,
                TraceEvent::PhaseStarted {
                    phase: Phase::Gridlines,
                } if x != 1 || y != 1 => {
                    violations.push(InvariantViolation::GridlinesBeforeAxes { generation, x, y });
                }
                _ => {}
            }
        }
        for (axis, count) in [(Axis::X, x), (Axis::Y, y)] {
            if count > 1 {
                violations.push(InvariantViolation::AxisGrownTwice {
                    generation,
                    axis,
                    count,
                });
            }
        }
    }
    violations
}

/// Series `i + 1` starts no earlier than series `i` finished plus `pause`
#[must_use]
pub fn check_series_sequential(trace: &Trace, pause: Millis) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    for (generation, entries) in by_generation(trace) {
        let mut expected = 0;
        let mut earliest = Millis::ZERO;
        for entry in entries {
            match entry.event {
                TraceEvent::SeriesStarted { index } => {
                    if index != expected {
                        violations.push(InvariantViolation::SeriesSkipped {
                            generation,
                            index,
                            expected,
                        });
                    }
                    if index > 0 && entry.at < earliest {
                        violations.push(InvariantViolation::SeriesOverlap {
                            generation,
                            index,
                            at: entry.at,
                            earliest,
                        });
                    }
                    expected = index + 1;
                    // Nothing may start until this one is drawn
                    earliest = Millis(u64::MAX);
                }
                TraceEvent::SeriesDrawn { .. } => earliest = entry.at + pause,
                _ => {}
            }
        }
    }
    violations
}

/// Between a stop and the next start nothing but stale drops is recorded
#[must_use]
pub fn check_quiet_after_stop(trace: &Trace) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut stopped = false;
    for entry in trace.entries() {
        match &entry.event {
            TraceEvent::Stopped => stopped = true,
            TraceEvent::RunStarted { .. } => stopped = false,
            TraceEvent::StaleDropped { .. } => {}
            event if stopped => violations.push(InvariantViolation::WorkAfterStop {
                generation: entry.generation,
                event: event.to_string(),
            }),
            _ => {}
        }
    }
    violations
}

/// Every check above
#[must_use]
pub fn check_all(trace: &Trace, series_pause: Millis) -> Vec<InvariantViolation> {
    let mut violations = check_phase_order(trace);
    violations.extend(check_gridlines_after_axes(trace));
    violations.extend(check_series_sequential(trace, series_pause));
    violations.extend(check_quiet_after_stop(trace));
    violations
}
