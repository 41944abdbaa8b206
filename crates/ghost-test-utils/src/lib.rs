//! Testing utilities for the ghost chart workspace
//!
//! Shared hosts, fixtures, and assertions.

#![allow(missing_docs)]

use ghost_chart::prelude::*;
use ghost_chart::trace::TraceEntry;
use parking_lot::Mutex;
use std::sync::Arc;

/// Host whose container size can change mid-run and which keeps every
/// reported error
#[derive(Debug, Default)]
pub struct RecordingHost {
    size: Mutex<Option<Size>>,
    errors: Mutex<Vec<AnimationError>>,
}

impl RecordingHost {
    pub fn new(size: Option<Size>) -> Arc<Self> {
        Arc::new(Self {
            size: Mutex::new(size),
            errors: Mutex::new(Vec::new()),
        })
    }

    pub fn sized(width: f64, height: f64) -> Arc<Self> {
        Self::new(Some(Size::new(width, height)))
    }

    pub fn detached() -> Arc<Self> {
        Self::new(None)
    }

    pub fn set_size(&self, size: Option<Size>) {
        *self.size.lock() = size;
    }

    pub fn errors(&self) -> Vec<AnimationError> {
        self.errors.lock().clone()
    }

    pub fn error_count(&self) -> usize {
        self.errors.lock().len()
    }
}

impl ChartHost for RecordingHost {
    fn container_size(&self) -> Option<Size> {
        *self.size.lock()
    }

    fn report_error(&self, error: &AnimationError) {
        self.errors.lock().push(error.clone());
    }
}

pub fn standard_size() -> Size {
    Size::new(800.0, 480.0)
}

/// Default timings with a fixed jitter seed
pub fn seeded_config(seed: u64) -> SequencerConfig {
    SequencerConfig::default().with_jitter_seed(seed)
}

/// Every span shortened so whole runs stay cheap
pub fn fast_config() -> SequencerConfig {
    let timing = TimingConfig {
        dot_stagger_ms: 2,
        dot_settle_ms: 20,
        after_grid_ms: 5,
        x_axis_ms: 10,
        y_axis_ms: 14,
        gridline_fade_ms: 6,
        after_gridlines_ms: 5,
        series_draw_ms: 30,
        series_pause_ms: 8,
        legend_delay_ms: 2,
        confidence_delay_ms: 4,
        coverage_delay_ms: 6,
        insight_delay_ms: 8,
        data_quality_delay_ms: 10,
        ask_button_delay_ms: 12,
        annotation_fade_ms: 5,
        data_quality_dismiss_ms: 50,
        sidebar_open_ms: 10,
        metric_card_stagger_ms: 3,
    };
    seeded_config(7).with_timing(timing)
}

pub fn demo_sequencer(config: SequencerConfig) -> (Sequencer<Arc<RecordingHost>>, Arc<RecordingHost>) {
    let host = RecordingHost::sized(800.0, 480.0);
    let sequencer = Sequencer::new(config, Arc::clone(&host), LayoutHandle::new()).unwrap();
    (sequencer, host)
}

/// Start and play to the end
pub fn interactive_sequencer(config: SequencerConfig) -> (Sequencer<Arc<RecordingHost>>, Arc<RecordingHost>) {
    let (mut sequencer, host) = demo_sequencer(config);
    sequencer.start().unwrap();
    sequencer.run_until_idle();
    assert_eq!(sequencer.run_state(), RunState::Interactive);
    (sequencer, host)
}

/// Entries of the current run only
pub fn current_run(sequencer: &Sequencer<Arc<RecordingHost>>) -> Vec<TraceEntry> {
    sequencer
        .trace()
        .for_generation(sequencer.generation())
        .cloned()
        .collect()
}

/// Index of the first entry equal to `event`
pub fn position_of(entries: &[TraceEntry], event: &TraceEvent) -> Option<usize> {
    entries.iter().position(|e| &e.event == event)
}

pub fn assert_no_errors(host: &RecordingHost) {
    let errors = host.errors();
    assert!(errors.is_empty(), "unexpected host errors: {errors:?}");
}
