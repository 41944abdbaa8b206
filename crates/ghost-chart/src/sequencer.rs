//! The ghost-chart script
//!
//! A run is a fixed list of named phases:
//!
//! ```text
//! ProbeContainer -> SettleGrid -> GrowAxes -> Gridlines -> DrawSeries(0..N) -> Annotations
//! ```
//!
//! after which the chart is interactive. Every step is a [`TimerQueue`] entry
//! stamped with the current [`Generation`]. `start()` and `stop()` bump the
//! generation and drain the queue in one call, and dispatch ignores anything
//! from an older generation, so a cancelled run can never touch the scene
//! again.
//!
//! Live mode skips the dot-grid intro and draws the caller's series. The skip
//! flag plays the whole timeline to the end inside `start()`, so the host
//! never sees an intermediate frame and lands on exactly the scene an
//! animated run ends on.

use crate::annotation::{AnnotationKind, AnnotationLayer};
use crate::axes::{Axis, AxisRenderer};
use crate::cohort::{demo_cohorts, CohortSeries, LineRenderer};
use crate::config::{validate_speed, PlaybackMode, SequencerConfig};
use crate::error::{AnimationError, SceneError};
use crate::grid::{generate_grid, place_dots};
use crate::host::{ChartHost, Size};
use crate::interaction::{InteractionLayer, SeriesTargets};
use crate::layout::{demo_metric_cards, ChartPlacement, LayoutHandle, MetricCard, Thumbnail};
use crate::phase::Phase;
use crate::scale::{ChartScales, PlotArea};
use crate::scene::{ElementId, ElementKind, Scene, SceneSnapshot};
use crate::svg;
use crate::trace::{Trace, TraceEvent};
use crate::tween::{Easing, Tween, TweenSet, TweenTarget};
use ghost_kernel::clock::{Millis, VirtualClock};
use ghost_kernel::generation::{Generation, GenerationCounter};
use ghost_kernel::join::JoinStatus;
use ghost_kernel::state_machine::validate_transition;
use ghost_kernel::timer::{Scheduled, TimerHandle, TimerQueue};
use ghost_kernel::{AnnotationState, RunState};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, warn};

/// One scheduled step of the script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    ProbeContainer { attempt: u32 },
    SettleGrid,
    GridSettled,
    GrowAxes,
    AxisGrown(Axis),
    GridlinesShown,
    DrawSeries(usize),
    SeriesDrawn(usize),
    ShowAnnotation(AnnotationKind),
    AnnotationShown(AnnotationKind),
    DismissAnnotation(AnnotationKind),
    SidebarOpened,
    AppendMetricCard(usize),
}

/// What the host may observe about playback
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaybackState {
    /// Demo or live data
    pub mode: PlaybackMode,
    /// Timers pending or transitions in flight
    pub is_animating: bool,
    /// Current playback speed
    pub speed_multiplier: f64,
}

/// Top-level groups, back to front
#[derive(Debug, Clone, Copy)]
struct Layers {
    grid: ElementId,
    axes: ElementId,
    gridlines: ElementId,
    series: ElementId,
    annotations: ElementId,
}

impl Layers {
    fn build(scene: &mut Scene) -> Result<Self, SceneError> {
        let mut layer = |class: &str| scene.append_with_class(Scene::ROOT, ElementKind::Group, class);
        Ok(Self {
            grid: layer("grid-layer")?,
            axes: layer("axes-layer")?,
            gridlines: layer("gridline-layer")?,
            series: layer("series-layer")?,
            annotations: layer("annotation-layer")?,
        })
    }
}

/// Everything that lives for exactly one run
#[derive(Debug)]
struct RunContext {
    size: Size,
    area: PlotArea,
    scales: ChartScales,
    layers: Layers,
    series: Vec<CohortSeries>,
    axes: Option<AxisRenderer>,
    lines: LineRenderer,
    annotations: AnnotationLayer,
    annotations_done: bool,
    interaction: InteractionLayer,
}

/// Plays the ghost chart against a host and a shared layout
pub struct Sequencer<H: ChartHost> {
    config: SequencerConfig,
    host: H,
    layout: LayoutHandle,
    clock: VirtualClock,
    generations: GenerationCounter,
    timers: TimerQueue<Step>,
    scene: Scene,
    tweens: TweenSet,
    run_state: RunState,
    playback: PlaybackState,
    live_series: Vec<CohortSeries>,
    metric_cards: Vec<MetricCard>,
    sidebar_timers: Vec<TimerHandle>,
    run: Option<RunContext>,
    trace: Trace,
    stale_dropped: u64,
}

impl<H: ChartHost> Sequencer<H> {
    /// New idle sequencer
    ///
    /// # Errors
    /// [`AnimationError::InvalidConfig`] if `config` does not validate.
    pub fn new(config: SequencerConfig, host: H, layout: LayoutHandle) -> Result<Self, AnimationError> {
        config.validate()?;
        let playback = PlaybackState {
            mode: config.mode,
            is_animating: false,
            speed_multiplier: config.speed_multiplier,
        };
        Ok(Self {
            config,
            host,
            layout,
            clock: VirtualClock::new(),
            generations: GenerationCounter::new(),
            timers: TimerQueue::new(),
            scene: Scene::new(),
            tweens: TweenSet::new(),
            run_state: RunState::Idle,
            playback,
            live_series: Vec::new(),
            metric_cards: demo_metric_cards(),
            sidebar_timers: Vec::new(),
            run: None,
            trace: Trace::new(),
            stale_dropped: 0,
        })
    }

    /// Series drawn in live mode, from the next `start()` on
    ///
    /// # Errors
    /// [`AnimationError::InvalidConfig`] if any series is empty or non-finite.
    pub fn set_series(&mut self, series: Vec<CohortSeries>) -> Result<(), AnimationError> {
        for s in &series {
            s.validate()?;
        }
        self.live_series = series;
        Ok(())
    }

    /// Cards appended to the sidebar after `ask_about_chart`
    pub fn set_metric_cards(&mut self, cards: Vec<MetricCard>) {
        self.metric_cards = cards;
    }

    /// Playback mode for the next `start()`
    pub fn set_mode(&mut self, mode: PlaybackMode) {
        self.config.mode = mode;
        self.playback.mode = mode;
    }

    /// Speed multiplier for everything scheduled from now on
    ///
    /// # Errors
    /// [`AnimationError::InvalidConfig`] unless finite and positive.
    pub fn set_speed(&mut self, speed_multiplier: f64) -> Result<(), AnimationError> {
        validate_speed(speed_multiplier)?;
        self.config.speed_multiplier = speed_multiplier;
        self.playback.speed_multiplier = speed_multiplier;
        Ok(())
    }

    // ---- lifecycle -------------------------------------------------------

    /// Clear everything from any previous run and play from the top.
    ///
    /// A container that is not measurable yet defers the run instead of
    /// failing it; the host hears about it through `report_error`.
    ///
    /// # Errors
    /// Only if the run lifecycle rejects the restart.
    pub fn start(&mut self) -> Result<(), AnimationError> {
        let drained = self.cancel_all();
        self.scene.clear();
        self.layout.reset();
        self.run = None;
        self.transition(RunState::Running)?;
        self.playback.is_animating = true;

        info!(
            generation = %self.generations.current(),
            drained,
            skip = self.config.skip,
            mode = ?self.config.mode,
            "Ghost chart run started"
        );
        self.record(TraceEvent::RunStarted { skip: self.config.skip });
        self.record(TraceEvent::PhaseStarted { phase: Phase::ProbeContainer });
        self.execute(Step::ProbeContainer { attempt: 0 });

        if self.config.skip {
            let dispatched = self.advance_to(self.clock.now());
            debug!(dispatched, "skipped ahead");
        }
        self.refresh_playback();
        Ok(())
    }

    /// Cancel everything outstanding and clear the scene
    pub fn stop(&mut self) {
        let drained = self.cancel_all();
        self.scene.clear();
        self.layout.reset();
        self.run = None;
        self.playback.is_animating = false;
        if validate_transition(self.run_state, RunState::Stopped).is_ok() {
            self.run_state = RunState::Stopped;
            self.record(TraceEvent::Stopped);
            info!(drained, "Ghost chart run stopped");
        }
    }

    // ---- clock -----------------------------------------------------------

    /// Move the clock to `t`, dispatching every entry due on the way in
    /// `(due, sequence)` order. Returns the number of entries dispatched.
    ///
    /// With the skip flag set, a run whose container has been measured plays
    /// straight through to its end regardless of `t`.
    pub fn advance_to(&mut self, t: Millis) -> usize {
        let mut dispatched = 0;
        while let Some(due) = self.timers.next_due() {
            if due > t && !self.skipping() {
                break;
            }
            self.clock.advance_to(due);
            self.tweens.sample(&mut self.scene, &self.layout, self.clock.now());
            let Some(entry) = self.timers.pop_due(self.clock.now()) else {
                break;
            };
            dispatched += 1;
            self.dispatch(entry);
        }

        let mut target = t;
        if self.skipping() {
            if let Some(end) = self.tweens.last_end() {
                target = target.max(end);
            }
        }
        self.clock.advance_to(target);
        self.tweens.sample(&mut self.scene, &self.layout, self.clock.now());
        self.refresh_playback();
        dispatched
    }

    /// Move the clock forward by `span`
    pub fn advance_by(&mut self, span: Millis) -> usize {
        self.advance_to(self.clock.now() + span)
    }

    /// Play until no entry is pending and every transition has landed
    pub fn run_until_idle(&mut self) -> usize {
        let mut dispatched = 0;
        while let Some(due) = self.timers.next_due() {
            dispatched += self.advance_to(due);
        }
        if let Some(end) = self.tweens.last_end() {
            dispatched += self.advance_to(end);
        }
        dispatched
    }

    // ---- interaction -----------------------------------------------------

    /// Highlight series `index`, dimming the rest
    ///
    /// # Errors
    /// [`AnimationError::NotInteractive`] before the lines are drawn,
    /// [`AnimationError::UnknownSeries`] for a bad index.
    pub fn hover(&mut self, index: usize) -> Result<(), AnimationError> {
        self.require_interactive()?;
        let run = self.run.as_mut().ok_or(AnimationError::NotInteractive)?;
        let targets = SeriesTargets {
            lines: run.lines.drawn(),
            legend: run.annotations.legend_entries(),
        };
        run.interaction
            .hover(&mut self.scene, targets, &self.config.geometry, index)
    }

    /// Return to the resting state
    ///
    /// # Errors
    /// [`AnimationError::NotInteractive`] before the lines are drawn.
    pub fn hover_end(&mut self) -> Result<(), AnimationError> {
        self.require_interactive()?;
        let run = self.run.as_mut().ok_or(AnimationError::NotInteractive)?;
        let targets = SeriesTargets {
            lines: run.lines.drawn(),
            legend: run.annotations.legend_entries(),
        };
        run.interaction
            .hover_end(&mut self.scene, targets, &self.config.geometry)?;
        Ok(())
    }

    /// Show or hide series `index`; returns whether it is now visible
    ///
    /// # Errors
    /// As [`Self::hover`].
    pub fn toggle_series(&mut self, index: usize) -> Result<bool, AnimationError> {
        self.require_interactive()?;
        let run = self.run.as_mut().ok_or(AnimationError::NotInteractive)?;
        let targets = SeriesTargets {
            lines: run.lines.drawn(),
            legend: run.annotations.legend_entries(),
        };
        let visible = run
            .interaction
            .toggle(&mut self.scene, targets, &self.config.geometry, index)?;
        debug!(index, visible, "series toggled");
        Ok(visible)
    }

    /// Click on the insight icon
    ///
    /// # Errors
    /// [`AnimationError::NotInteractive`] until the callout has been shown.
    pub fn click_insight_icon(&mut self) -> Result<AnnotationState, AnimationError> {
        self.require_interactive()?;
        let run = self.run.as_mut().ok_or(AnimationError::NotInteractive)?;
        let state = run.annotations.toggle_insight(&mut self.scene)?;
        self.record(TraceEvent::Annotation {
            kind: AnnotationKind::InsightCallout,
            state,
        });
        Ok(state)
    }

    /// Close an annotation for the rest of the run
    ///
    /// # Errors
    /// [`AnimationError::NotInteractive`] before the lines are drawn; a state
    /// machine error if `kind` is not showing.
    pub fn dismiss_annotation(&mut self, kind: AnnotationKind) -> Result<(), AnimationError> {
        self.require_interactive()?;
        let run = self.run.as_mut().ok_or(AnimationError::NotInteractive)?;
        run.annotations
            .dismiss(&mut self.scene, &mut self.tweens, kind)?;
        self.record(TraceEvent::Annotation {
            kind,
            state: AnnotationState::Dismissed,
        });
        self.note_annotations_settled();
        self.refresh_playback();
        Ok(())
    }

    /// Move the chart into the sidebar.
    ///
    /// The chart is serialized, hidden and the sidebar inserted in one layout
    /// write; the sidebar then animates open and metric cards follow one by
    /// one on the timeline.
    ///
    /// # Errors
    /// [`AnimationError::NotInteractive`] before the lines are drawn,
    /// [`AnimationError::Layout`] if the chart is already minimized.
    pub fn ask_about_chart(&mut self) -> Result<Thumbnail, AnimationError> {
        self.require_interactive()?;
        let size = self.run.as_ref().ok_or(AnimationError::NotInteractive)?.size;
        let width = self.config.geometry.sidebar_width;

        let thumbnail = svg::thumbnail(&self.scene, size);
        self.layout.minimize_to_sidebar(thumbnail.clone(), width)?;
        self.scene.set_attr(Scene::ROOT, "display", "none")?;
        self.record(TraceEvent::LayoutChanged {
            placement: ChartPlacement::MinimizedToSidebar,
        });
        info!(digest = %thumbnail.digest, "Chart minimized to sidebar");

        let now = self.clock.now();
        let end = self.tweens.start(Tween {
            target: TweenTarget::SidebarWidth,
            from: 0.0,
            to: width,
            start: now,
            duration: self.span(self.config.timing.sidebar_open_ms),
            easing: Easing::CubicInOut,
        });
        let handle = self.schedule_at(end, Step::SidebarOpened);
        self.sidebar_timers.push(handle);

        if self.config.skip {
            self.advance_to(now);
        }
        self.refresh_playback();
        Ok(thumbnail)
    }

    /// Bring the chart back inline, cancelling any sidebar animation
    ///
    /// # Errors
    /// [`AnimationError::Layout`] if the chart is not minimized.
    pub fn restore_chart(&mut self) -> Result<(), AnimationError> {
        self.layout.restore_inline()?;
        for handle in self.sidebar_timers.drain(..) {
            // Handles that already fired are simply gone
            let _ = self.timers.cancel(handle);
        }
        self.tweens.cancel(TweenTarget::SidebarWidth);
        if self.scene.get(Scene::ROOT).is_some() {
            self.scene.remove_attr(Scene::ROOT, "display")?;
        }
        self.record(TraceEvent::LayoutChanged {
            placement: ChartPlacement::Inline,
        });
        self.refresh_playback();
        Ok(())
    }

    // ---- accessors -------------------------------------------------------

    /// Current scene
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Order-stable copy of the scene
    #[must_use]
    pub fn snapshot(&self) -> SceneSnapshot {
        self.scene.snapshot()
    }

    /// Scene as an SVG document, sized to the measured container
    #[must_use]
    pub fn render_svg(&self) -> String {
        let size = self
            .run
            .as_ref()
            .map_or_else(|| Size::new(0.0, 0.0), |run| run.size);
        svg::render(&self.scene, size)
    }

    /// Read-only playback state
    #[must_use]
    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    /// Where the run is in its lifecycle
    #[must_use]
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Everything recorded so far, across runs
    #[must_use]
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// The shared layout
    #[must_use]
    pub fn layout(&self) -> &LayoutHandle {
        &self.layout
    }

    /// Virtual time
    #[must_use]
    pub fn now(&self) -> Millis {
        self.clock.now()
    }

    /// Entries waiting in the timer queue
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Entries that reached dispatch after their generation was retired
    #[must_use]
    pub fn stale_dropped(&self) -> u64 {
        self.stale_dropped
    }

    /// Generation of the current run
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generations.current()
    }

    /// State of one annotation in the current run
    #[must_use]
    pub fn annotation_state(&self, kind: AnnotationKind) -> AnnotationState {
        self.run
            .as_ref()
            .map_or(AnnotationState::Hidden, |run| run.annotations.state(kind))
    }

    /// Series currently hovered
    #[must_use]
    pub fn hovered(&self) -> Option<usize> {
        self.run.as_ref().and_then(|run| run.interaction.hovered())
    }

    /// Configuration in effect
    #[must_use]
    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Host the sequencer reports to
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Nothing pending and nothing in flight
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.timers.is_empty() && self.tweens.is_empty()
    }

    // ---- internals -------------------------------------------------------

    fn skipping(&self) -> bool {
        self.config.skip && self.run.is_some()
    }

    fn span(&self, ms: u64) -> Millis {
        Millis(ms).scaled(self.playback.speed_multiplier)
    }

    fn record(&mut self, event: TraceEvent) {
        self.trace
            .record(self.clock.now(), self.generations.current(), event);
    }

    fn transition(&mut self, to: RunState) -> Result<(), AnimationError> {
        validate_transition(self.run_state, to)?;
        debug!(from = ?self.run_state, ?to, "run state");
        self.run_state = to;
        Ok(())
    }

    fn require_interactive(&self) -> Result<(), AnimationError> {
        if self.run_state == RunState::Interactive {
            Ok(())
        } else {
            Err(AnimationError::NotInteractive)
        }
    }

    fn refresh_playback(&mut self) {
        self.playback.is_animating = !self.is_idle();
    }

    fn schedule_at(&mut self, due: Millis, step: Step) -> TimerHandle {
        self.timers.schedule(due, self.generations.current(), step)
    }

    fn schedule(&mut self, delay: Millis, step: Step) -> TimerHandle {
        self.schedule_at(self.clock.now() + delay, step)
    }

    /// Retire the current generation and everything queued under it
    fn cancel_all(&mut self) -> usize {
        self.generations.bump();
        let drained = self.timers.drain();
        self.tweens.clear();
        self.sidebar_timers.clear();
        drained
    }

    fn dispatch(&mut self, entry: Scheduled<Step>) {
        if !self.generations.is_current(entry.generation) {
            self.stale_dropped += 1;
            warn!(
                stale = %entry.generation,
                current = %self.generations.current(),
                step = ?entry.payload,
                "Dropping entry from a retired generation"
            );
            self.record(TraceEvent::StaleDropped { from: entry.generation });
            return;
        }
        self.execute(entry.payload);
    }

    fn execute(&mut self, step: Step) {
        if let Err(error) = self.handle(step) {
            if error.halts_run() {
                self.fail(error);
            } else {
                self.report(&error);
            }
        }
    }

    fn report(&mut self, error: &AnimationError) {
        warn!(%error, "Reporting animation error to host");
        self.host.report_error(error);
        self.record(TraceEvent::ErrorReported {
            message: error.to_string(),
        });
    }

    fn fail(&mut self, error: AnimationError) {
        self.report(&error);
        self.cancel_all();
        if validate_transition(self.run_state, RunState::Failed).is_ok() {
            self.run_state = RunState::Failed;
        }
        self.playback.is_animating = false;
        info!(%error, "Ghost chart run halted");
    }

    fn handle(&mut self, step: Step) -> Result<(), AnimationError> {
        match step {
            Step::ProbeContainer { attempt } => self.probe(attempt),
            Step::SettleGrid => self.settle_grid(),
            Step::GridSettled => {
                self.record(TraceEvent::PhaseCompleted { phase: Phase::SettleGrid });
                self.schedule(self.span(self.config.timing.after_grid_ms), Step::GrowAxes);
                Ok(())
            }
            Step::GrowAxes => self.grow_axes(),
            Step::AxisGrown(axis) => self.axis_grown(axis),
            Step::GridlinesShown => {
                self.record(TraceEvent::PhaseCompleted { phase: Phase::Gridlines });
                let has_series = self.run.as_ref().is_some_and(|run| !run.series.is_empty());
                if has_series {
                    self.schedule(
                        self.span(self.config.timing.after_gridlines_ms),
                        Step::DrawSeries(0),
                    );
                    Ok(())
                } else {
                    self.lines_complete()
                }
            }
            Step::DrawSeries(index) => self.draw_series(index),
            Step::SeriesDrawn(index) => {
                self.record(TraceEvent::SeriesDrawn { index });
                let count = self.run.as_ref().map_or(0, |run| run.series.len());
                if index + 1 < count {
                    self.schedule(
                        self.span(self.config.timing.series_pause_ms),
                        Step::DrawSeries(index + 1),
                    );
                    Ok(())
                } else {
                    self.record(TraceEvent::PhaseCompleted { phase: Phase::DrawSeries });
                    self.lines_complete()
                }
            }
            Step::ShowAnnotation(kind) => self.show_annotation(kind),
            Step::AnnotationShown(kind) => self.annotation_shown(kind),
            Step::DismissAnnotation(kind) => {
                let Some(run) = self.run.as_mut() else {
                    return Ok(());
                };
                if run.annotations.state(kind) != AnnotationState::Visible {
                    return Ok(());
                }
                run.annotations
                    .dismiss(&mut self.scene, &mut self.tweens, kind)?;
                self.record(TraceEvent::Annotation {
                    kind,
                    state: AnnotationState::Dismissed,
                });
                Ok(())
            }
            Step::SidebarOpened => {
                debug!("sidebar open");
                let stagger = self.span(self.config.timing.metric_card_stagger_ms);
                for index in 0..self.metric_cards.len() {
                    let delay = Millis(stagger.as_u64().saturating_mul(index as u64));
                    let handle = self.schedule(delay, Step::AppendMetricCard(index));
                    self.sidebar_timers.push(handle);
                }
                Ok(())
            }
            Step::AppendMetricCard(index) => {
                let Some(card) = self.metric_cards.get(index).cloned() else {
                    return Ok(());
                };
                self.layout.push_card(card)?;
                self.record(TraceEvent::MetricCardAppended { index });
                Ok(())
            }
        }
    }

    fn probe(&mut self, attempt: u32) -> Result<(), AnimationError> {
        // A container smaller than its margins is still laying out
        let geometry = &self.config.geometry;
        let measured = self
            .host
            .container_size()
            .filter(Size::is_usable)
            .and_then(|size| PlotArea::from_size(size, geometry).map(|area| (size, area)));
        if let Some((size, area)) = measured {
            return self.begin_run(size, area);
        }

        if attempt == 0 {
            self.report(&AnimationError::ContainerNotReady);
        }
        if attempt >= self.config.max_container_retries {
            return Err(AnimationError::ContainerNeverReady {
                attempts: attempt + 1,
            });
        }
        self.transition(RunState::Deferred)?;
        self.record(TraceEvent::Deferred { attempt });
        debug!(attempt, "container not ready, run deferred");
        self.schedule(
            Millis(self.config.container_retry_ms),
            Step::ProbeContainer { attempt: attempt + 1 },
        );
        Ok(())
    }

    fn begin_run(&mut self, size: Size, area: PlotArea) -> Result<(), AnimationError> {
        let scales = ChartScales::for_area(&area, &self.config.geometry);

        if self.run_state == RunState::Deferred {
            self.transition(RunState::Running)?;
        }

        let series = match self.config.mode {
            PlaybackMode::Demo => demo_cohorts(),
            PlaybackMode::Live => self.live_series.clone(),
        };
        let layers = Layers::build(&mut self.scene)?;
        self.run = Some(RunContext {
            size,
            area,
            scales,
            layers,
            axes: None,
            lines: LineRenderer::new(),
            annotations: AnnotationLayer::new(),
            annotations_done: false,
            interaction: InteractionLayer::new(series.len()),
            series,
        });
        self.record(TraceEvent::PhaseCompleted { phase: Phase::ProbeContainer });
        debug!(width = size.width, height = size.height, "container measured");

        let next = match self.config.mode {
            PlaybackMode::Demo => Step::SettleGrid,
            PlaybackMode::Live => Step::GrowAxes,
        };
        self.schedule(Millis::ZERO, next);
        Ok(())
    }

    /// Re-measure the container before a phase that depends on its size
    fn measure(&mut self, phase: Phase) -> Result<(), AnimationError> {
        let size = self
            .host
            .container_size()
            .filter(Size::is_usable)
            .ok_or(AnimationError::Measurement { phase })?;
        let geometry = &self.config.geometry;
        let area = PlotArea::from_size(size, geometry).ok_or(AnimationError::Measurement { phase })?;
        if let Some(run) = self.run.as_mut() {
            run.size = size;
            run.area = area;
            run.scales = ChartScales::for_area(&area, geometry);
        }
        Ok(())
    }

    fn settle_grid(&mut self) -> Result<(), AnimationError> {
        self.measure(Phase::SettleGrid)?;
        self.record(TraceEvent::PhaseStarted { phase: Phase::SettleGrid });

        let stagger = self.span(self.config.timing.dot_stagger_ms);
        let settle = self.span(self.config.timing.dot_settle_ms);
        let now = self.clock.now();
        let mut rng = match self.config.jitter_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let Some(run) = self.run.as_ref() else {
            return Ok(());
        };
        let lattice = generate_grid(run.size, &self.config.geometry, &mut rng);
        let end = place_dots(
            &mut self.scene,
            &mut self.tweens,
            run.layers.grid,
            &lattice,
            &self.config.geometry,
            now,
            stagger,
            settle,
        )?;
        debug!(dots = lattice.len(), rows = lattice.rows, cols = lattice.cols, "grid placed");
        self.schedule_at(end, Step::GridSettled);
        Ok(())
    }

    fn grow_axes(&mut self) -> Result<(), AnimationError> {
        self.measure(Phase::GrowAxes)?;
        self.record(TraceEvent::PhaseStarted { phase: Phase::GrowAxes });

        let x_span = self.span(self.config.timing.x_axis_ms);
        let y_span = self.span(self.config.timing.y_axis_ms);
        let now = self.clock.now();

        let Some(run) = self.run.as_mut() else {
            return Ok(());
        };
        let mut axes = AxisRenderer::new(run.area, run.scales);
        let ends = axes.begin(
            &mut self.scene,
            &mut self.tweens,
            run.layers.axes,
            now,
            x_span,
            y_span,
        )?;
        run.axes = Some(axes);
        for (axis, end) in ends {
            self.schedule_at(end, Step::AxisGrown(axis));
        }
        Ok(())
    }

    fn axis_grown(&mut self, axis: Axis) -> Result<(), AnimationError> {
        let Some(axes) = self.run.as_mut().and_then(|run| run.axes.as_mut()) else {
            return Ok(());
        };
        match axes.on_axis_grown(&mut self.scene, &self.config.geometry, axis) {
            Ok(status) => {
                self.record(TraceEvent::AxisGrown { axis });
                if status == JoinStatus::Complete {
                    self.record(TraceEvent::PhaseCompleted { phase: Phase::GrowAxes });
                    self.show_gridlines()?;
                }
                Ok(())
            }
            Err(error) => {
                warn!(%axis, "Duplicate axis completion ignored");
                self.report(&error);
                Ok(())
            }
        }
    }

    fn show_gridlines(&mut self) -> Result<(), AnimationError> {
        self.record(TraceEvent::PhaseStarted { phase: Phase::Gridlines });
        let fade = self.span(self.config.timing.gridline_fade_ms);
        let now = self.clock.now();

        let Some(run) = self.run.as_ref() else {
            return Ok(());
        };
        let Some(axes) = run.axes.as_ref().filter(|axes| axes.gridlines_ready()) else {
            return Ok(());
        };
        let end = axes.draw_gridlines(
            &mut self.scene,
            &mut self.tweens,
            run.layers.gridlines,
            &self.config.geometry,
            now,
            fade,
        )?;
        self.schedule_at(end, Step::GridlinesShown);
        Ok(())
    }

    fn draw_series(&mut self, index: usize) -> Result<(), AnimationError> {
        if index == 0 {
            self.record(TraceEvent::PhaseStarted { phase: Phase::DrawSeries });
        }
        self.record(TraceEvent::SeriesStarted { index });

        let draw = self.span(self.config.timing.series_draw_ms);
        let now = self.clock.now();
        let Some(run) = self.run.as_mut() else {
            return Ok(());
        };
        let series = run
            .series
            .get(index)
            .ok_or(AnimationError::UnknownSeries(index))?;
        let end = run.lines.begin_series(
            &mut self.scene,
            &mut self.tweens,
            run.layers.series,
            index,
            series,
            &run.scales,
            &self.config.geometry,
            now,
            draw,
        )?;
        self.schedule_at(end, Step::SeriesDrawn(index));
        Ok(())
    }

    fn lines_complete(&mut self) -> Result<(), AnimationError> {
        self.transition(RunState::Interactive)?;
        info!(generation = %self.generations.current(), "Lines drawn, chart interactive");

        let Some(run) = self.run.as_mut() else {
            return Ok(());
        };
        let targets = SeriesTargets {
            lines: run.lines.drawn(),
            legend: run.annotations.legend_entries(),
        };
        run.interaction
            .apply(&mut self.scene, targets, &self.config.geometry)?;
        let fresh: Vec<AnnotationKind> = AnnotationKind::ALL
            .into_iter()
            .filter(|kind| run.annotations.request(*kind))
            .collect();

        self.record(TraceEvent::PhaseStarted { phase: Phase::Annotations });
        for kind in fresh {
            let delay = self.span(self.config.timing.annotation_delay_ms(kind));
            self.schedule(delay, Step::ShowAnnotation(kind));
        }
        Ok(())
    }

    fn show_annotation(&mut self, kind: AnnotationKind) -> Result<(), AnimationError> {
        let fade = self.span(self.config.timing.annotation_fade_ms);
        let now = self.clock.now();
        let Some(run) = self.run.as_mut() else {
            return Ok(());
        };
        let end = run.annotations.begin_fade(
            &mut self.scene,
            &mut self.tweens,
            run.layers.annotations,
            kind,
            &run.series,
            &run.area,
            now,
            fade,
        )?;
        if kind == AnnotationKind::Legend {
            // Legend entries follow the current hover and visibility
            let targets = SeriesTargets {
                lines: run.lines.drawn(),
                legend: run.annotations.legend_entries(),
            };
            run.interaction
                .apply(&mut self.scene, targets, &self.config.geometry)?;
        }
        self.record(TraceEvent::Annotation {
            kind,
            state: AnnotationState::FadingIn,
        });
        self.schedule_at(end, Step::AnnotationShown(kind));
        Ok(())
    }

    fn annotation_shown(&mut self, kind: AnnotationKind) -> Result<(), AnimationError> {
        let Some(run) = self.run.as_mut() else {
            return Ok(());
        };
        if run.annotations.state(kind) != AnnotationState::FadingIn {
            // Dismissed mid-fade
            return Ok(());
        }
        run.annotations.finish_fade(kind)?;
        self.record(TraceEvent::Annotation {
            kind,
            state: AnnotationState::Visible,
        });
        if kind == AnnotationKind::DataQualityOverlay {
            self.schedule(
                self.span(self.config.timing.data_quality_dismiss_ms),
                Step::DismissAnnotation(kind),
            );
        }
        self.note_annotations_settled();
        Ok(())
    }

    fn note_annotations_settled(&mut self) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        if !run.annotations_done && run.annotations.all_settled() {
            run.annotations_done = true;
            self.record(TraceEvent::PhaseCompleted { phase: Phase::Annotations });
        }
    }
}

impl<H: ChartHost> Drop for Sequencer<H> {
    fn drop(&mut self) {
        self.generations.bump();
        let drained = self.timers.drain();
        if drained > 0 {
            debug!(drained, "sequencer dropped with pending entries");
        }
    }
}

impl<H: ChartHost> std::fmt::Debug for Sequencer<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequencer")
            .field("run_state", &self.run_state)
            .field("generation", &self.generations.current())
            .field("now", &self.clock.now())
            .field("pending_timers", &self.timers.len())
            .field("playback", &self.playback)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimingConfig;
    use crate::host::StaticHost;

    fn sequencer(config: SequencerConfig) -> Sequencer<StaticHost> {
        Sequencer::new(
            config.with_jitter_seed(11),
            StaticHost::new(Size::new(800.0, 480.0)),
            LayoutHandle::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_full_run_reaches_interactive() {
        let mut seq = sequencer(SequencerConfig::default());
        seq.start().unwrap();
        assert!(seq.playback().is_animating);
        assert_eq!(seq.run_state(), RunState::Running);

        seq.run_until_idle();
        assert_eq!(seq.run_state(), RunState::Interactive);
        assert!(!seq.playback().is_animating);
        assert_eq!(seq.scene().select_by_class("series-line").len(), 4);
        assert_eq!(seq.scene().select_by_class("gridline").len(), 5);
        assert_eq!(
            seq.annotation_state(AnnotationKind::DataQualityOverlay),
            AnnotationState::Dismissed
        );
        assert_eq!(
            seq.annotation_state(AnnotationKind::Legend),
            AnnotationState::Visible
        );
    }

    #[test]
    fn test_interaction_before_lines_is_rejected() {
        let mut seq = sequencer(SequencerConfig::default());
        assert_eq!(seq.hover(0), Err(AnimationError::NotInteractive));
        seq.start().unwrap();
        seq.advance_by(Millis(100));
        assert_eq!(seq.hover(0), Err(AnimationError::NotInteractive));
        assert!(seq.ask_about_chart().is_err());
    }

    #[test]
    fn test_stop_drains_and_clears() {
        let mut seq = sequencer(SequencerConfig::default());
        seq.start().unwrap();
        seq.advance_by(Millis(2000));
        assert!(seq.pending_timers() > 0);

        seq.stop();
        assert_eq!(seq.pending_timers(), 0);
        assert!(seq.scene().is_empty());
        assert_eq!(seq.run_state(), RunState::Stopped);
        assert!(!seq.playback().is_animating);
        assert_eq!(seq.run_until_idle(), 0);
    }

    #[test]
    fn test_skip_finishes_inside_start() {
        let mut seq = sequencer(SequencerConfig::default().with_skip(true));
        seq.start().unwrap();
        assert_eq!(seq.run_state(), RunState::Interactive);
        assert!(seq.is_idle());
        assert!(!seq.playback().is_animating);
        assert_eq!(seq.run_until_idle(), 0);
    }

    #[test]
    fn test_speed_scales_schedule() {
        let timing = TimingConfig::default();
        let mut slow = sequencer(SequencerConfig::default());
        let mut fast = sequencer(SequencerConfig::default().with_speed(2.0));
        slow.start().unwrap();
        fast.start().unwrap();
        slow.run_until_idle();
        fast.run_until_idle();

        let drawn = TraceEvent::SeriesDrawn { index: 3 };
        let slow_at = slow.trace().time_of(&drawn).unwrap();
        let fast_at = fast.trace().time_of(&drawn).unwrap();
        assert!(fast_at < slow_at);
        assert!(slow_at.as_u64() > timing.series_draw_ms * 4);
    }

    #[test]
    fn test_entry_from_retired_generation_is_dropped() {
        let mut seq = sequencer(SequencerConfig::default());
        seq.start().unwrap();
        let retired = seq.generation();
        seq.start().unwrap();
        seq.run_until_idle();
        let resting = seq.snapshot();

        // Survived the drain somehow; the generation check still stops it
        let due = seq.now();
        seq.timers.schedule(due, retired, Step::DrawSeries(0));
        assert_eq!(seq.advance_to(due), 1);

        assert_eq!(seq.stale_dropped(), 1);
        assert_eq!(seq.trace().count(&TraceEvent::StaleDropped { from: retired }), 1);
        assert_eq!(seq.snapshot(), resting);
        assert_eq!(seq.run_state(), RunState::Interactive);
    }

    #[test]
    fn test_set_speed_rejects_nonsense() {
        let mut seq = sequencer(SequencerConfig::default());
        assert!(matches!(seq.set_speed(0.0), Err(AnimationError::InvalidConfig(_))));
        seq.set_speed(3.0).unwrap();
        assert_eq!(seq.playback().speed_multiplier, 3.0);
    }
}
