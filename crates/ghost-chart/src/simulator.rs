//! Ghost chart simulator - randomized scenario testing
//!
//! Each scenario plays a seeded run on a random container size while firing
//! random host operations at it: restarts, stops, speed changes, hovers,
//! toggles and the sidebar round trip. Afterwards it checks:
//! - Trace ordering rules from [`crate::invariants`]
//! - No entry from a retired generation ever reached dispatch
//! - Hover paths always return to the resting scene
//! - The skip path lands on the same scene as an animated run

use crate::config::SequencerConfig;
use crate::error::AnimationError;
use crate::host::{Size, StaticHost};
use crate::invariants::{check_all, InvariantViolation};
use crate::layout::LayoutHandle;
use crate::sequencer::Sequencer;
use ghost_kernel::clock::Millis;
use ghost_kernel::RunState;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Fastest speed the simulator picks
const MAX_SPEED: f64 = 4.0;
const SPEEDS: [f64; 4] = [0.5, 1.0, 2.0, MAX_SPEED];

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Number of scenarios to play
    pub scenarios: u64,
    /// Host operations fired per scenario
    pub operations_per_scenario: usize,
    /// Stop conditions
    pub stop_on_first_violation: bool,
    /// Also compare each scenario against its skip-path twin
    pub verify_skip_equivalence: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            scenarios: 50,
            operations_per_scenario: 40,
            stop_on_first_violation: true,
            verify_skip_equivalence: true,
        }
    }
}

/// Host operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimulatedOperation {
    /// Restart from the top
    Start,
    /// Cancel the run
    Stop,
    /// Let virtual time pass
    Advance(Millis),
    /// Change playback speed
    SetSpeed(f64),
    /// Pointer over series `i`
    Hover(usize),
    /// Pointer left the plot
    HoverEnd,
    /// Legend click on series `i`
    ToggleSeries(usize),
    /// Insight icon click
    ClickInsight,
    /// "Ask about this chart"
    Ask,
    /// Close the sidebar
    Restore,
}

/// A violation detected during simulation
#[derive(Debug, Clone)]
pub enum Violation {
    /// Trace broke an ordering rule
    Invariant { scenario: u64, violation: InvariantViolation },
    /// Stale entries reached dispatch
    StaleDispatched { scenario: u64, count: u64 },
    /// Hover-then-leave did not restore the resting scene
    HoverNotIdempotent { scenario: u64, hovered: Vec<usize> },
    /// Skip path and animated path ended on different scenes
    SkipMismatch {
        scenario: u64,
        animated: String,
        skipped: String,
    },
    /// An operation failed in a way no host call should
    UnexpectedError {
        scenario: u64,
        operation: SimulatedOperation,
        error: AnimationError,
    },
    /// Run did not end interactive after the final restart
    NotInteractive { scenario: u64, state: RunState },
}

/// Statistics for simulation
#[derive(Debug, Clone, Default)]
pub struct SimulatorStats {
    /// Scenarios run
    pub scenarios_played: u64,
    /// Operations that succeeded
    pub operations_applied: u64,
    /// Operations rejected with an expected error
    pub operations_rejected: u64,
    /// Restarts issued
    pub restarts: u64,
    /// Stops issued
    pub stops: u64,
    /// Timer entries dispatched
    pub entries_dispatched: u64,
    /// Retired entries that reached dispatch
    pub stale_dropped: u64,
}

/// Final report from simulator
#[derive(Debug, Clone)]
pub struct SimulatorReport {
    /// Configuration the run used
    pub config: SimulatorConfig,
    /// Aggregate counters
    pub stats: SimulatorStats,
    /// Everything that went wrong
    pub violations: Vec<Violation>,
}

impl SimulatorReport {
    /// Check if simulation passed all criteria
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Generate text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Ghost Chart Simulator Report ===\n\n");
        report.push_str(&format!("Seed: {}\n", self.config.seed));
        report.push_str(&format!("Scenarios Played: {}\n", self.stats.scenarios_played));
        report.push_str(&format!("Operations Applied: {}\n", self.stats.operations_applied));
        report.push_str(&format!("Operations Rejected: {}\n", self.stats.operations_rejected));
        report.push_str(&format!("Restarts: {}\n", self.stats.restarts));
        report.push_str(&format!("Stops: {}\n", self.stats.stops));
        report.push_str(&format!("Entries Dispatched: {}\n", self.stats.entries_dispatched));
        report.push_str(&format!(
            "Stale Entries Dropped: {} (SHOULD BE 0)\n",
            self.stats.stale_dropped
        ));
        report.push_str(&format!("Violations: {}\n", self.violations.len()));

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                report.push_str(&format!("{}. {:?}\n", i + 1, v));
            }
        }

        report.push_str(&format!(
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        ));

        report
    }
}

/// Run the ghost chart simulator
#[must_use]
pub fn run_simulator(config: SimulatorConfig) -> SimulatorReport {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut stats = SimulatorStats::default();
    let mut violations = Vec::new();

    for scenario in 0..config.scenarios {
        let before = violations.len();
        play_scenario(scenario, &config, &mut rng, &mut stats, &mut violations);
        stats.scenarios_played += 1;
        if config.stop_on_first_violation && violations.len() > before {
            break;
        }
    }

    SimulatorReport {
        config,
        stats,
        violations,
    }
}

fn random_size(rng: &mut StdRng) -> Size {
    Size::new(rng.random_range(320.0..=1280.0), rng.random_range(240.0..=720.0))
}

fn new_sequencer(size: Size, config: SequencerConfig) -> Option<Sequencer<StaticHost>> {
    Sequencer::new(config, StaticHost::new(size), LayoutHandle::new()).ok()
}

fn play_scenario(
    scenario: u64,
    config: &SimulatorConfig,
    rng: &mut StdRng,
    stats: &mut SimulatorStats,
    violations: &mut Vec<Violation>,
) {
    let size = random_size(rng);
    let jitter_seed: u64 = rng.random();
    let base = SequencerConfig::default().with_jitter_seed(jitter_seed);
    let pause = Millis(base.timing.series_pause_ms).scaled(MAX_SPEED);

    let Some(mut sequencer) = new_sequencer(size, base.clone()) else {
        return;
    };
    apply(scenario, &mut sequencer, SimulatedOperation::Start, stats, violations);

    for _ in 0..config.operations_per_scenario {
        let operation = generate_operation(rng);
        apply(scenario, &mut sequencer, operation, stats, violations);
    }

    // Always finish on a clean run so the end state is checkable
    apply(scenario, &mut sequencer, SimulatedOperation::Start, stats, violations);
    stats.entries_dispatched += sequencer.run_until_idle() as u64;

    if sequencer.run_state() != RunState::Interactive {
        violations.push(Violation::NotInteractive {
            scenario,
            state: sequencer.run_state(),
        });
        return;
    }

    for violation in check_all(sequencer.trace(), pause) {
        violations.push(Violation::Invariant { scenario, violation });
    }
    if sequencer.stale_dropped() > 0 {
        stats.stale_dropped += sequencer.stale_dropped();
        violations.push(Violation::StaleDispatched {
            scenario,
            count: sequencer.stale_dropped(),
        });
    }

    check_hover_paths(scenario, &mut sequencer, rng, violations);

    if config.verify_skip_equivalence {
        check_skip_equivalence(scenario, size, &base, violations);
    }
}

fn generate_operation(rng: &mut StdRng) -> SimulatedOperation {
    match rng.random_range(0..20) {
        0 => SimulatedOperation::Start,
        1 => SimulatedOperation::Stop,
        2 => SimulatedOperation::SetSpeed(SPEEDS[rng.random_range(0..SPEEDS.len())]),
        3..=8 => SimulatedOperation::Advance(Millis(rng.random_range(1..=2_500))),
        9..=11 => SimulatedOperation::Hover(rng.random_range(0..4)),
        12 => SimulatedOperation::HoverEnd,
        13..=14 => SimulatedOperation::ToggleSeries(rng.random_range(0..4)),
        15 => SimulatedOperation::ClickInsight,
        16..=17 => SimulatedOperation::Ask,
        _ => SimulatedOperation::Restore,
    }
}

/// Errors a host can legitimately run into by calling at the wrong moment
fn is_expected(error: &AnimationError) -> bool {
    matches!(
        error,
        AnimationError::NotInteractive | AnimationError::Layout(_) | AnimationError::Kernel(_)
    )
}

fn apply(
    scenario: u64,
    sequencer: &mut Sequencer<StaticHost>,
    operation: SimulatedOperation,
    stats: &mut SimulatorStats,
    violations: &mut Vec<Violation>,
) {
    let result = match operation {
        SimulatedOperation::Start => {
            stats.restarts += 1;
            sequencer.start()
        }
        SimulatedOperation::Stop => {
            stats.stops += 1;
            sequencer.stop();
            Ok(())
        }
        SimulatedOperation::Advance(span) => {
            stats.entries_dispatched += sequencer.advance_by(span) as u64;
            Ok(())
        }
        SimulatedOperation::SetSpeed(speed) => sequencer.set_speed(speed),
        SimulatedOperation::Hover(index) => sequencer.hover(index),
        SimulatedOperation::HoverEnd => sequencer.hover_end(),
        SimulatedOperation::ToggleSeries(index) => sequencer.toggle_series(index).map(|_| ()),
        SimulatedOperation::ClickInsight => sequencer.click_insight_icon().map(|_| ()),
        SimulatedOperation::Ask => sequencer.ask_about_chart().map(|_| ()),
        SimulatedOperation::Restore => sequencer.restore_chart(),
    };

    match result {
        Ok(()) => stats.operations_applied += 1,
        Err(error) if is_expected(&error) => stats.operations_rejected += 1,
        Err(error) => violations.push(Violation::UnexpectedError {
            scenario,
            operation,
            error,
        }),
    }
}

fn check_hover_paths(
    scenario: u64,
    sequencer: &mut Sequencer<StaticHost>,
    rng: &mut StdRng,
    violations: &mut Vec<Violation>,
) {
    if sequencer.hover_end().is_err() {
        return;
    }
    let resting = sequencer.snapshot();

    let hovered: Vec<usize> = (0..rng.random_range(1..=6))
        .map(|_| rng.random_range(0..4))
        .collect();
    for index in &hovered {
        let _ = sequencer.hover(*index);
    }
    let _ = sequencer.hover_end();

    if sequencer.snapshot() != resting {
        violations.push(Violation::HoverNotIdempotent { scenario, hovered });
    }
}

fn check_skip_equivalence(
    scenario: u64,
    size: Size,
    base: &SequencerConfig,
    violations: &mut Vec<Violation>,
) {
    let (Some(mut animated), Some(mut skipped)) = (
        new_sequencer(size, base.clone()),
        new_sequencer(size, base.clone().with_skip(true)),
    ) else {
        return;
    };
    if animated.start().is_err() || skipped.start().is_err() {
        return;
    }
    animated.run_until_idle();

    let animated = animated.snapshot().fingerprint();
    let skipped = skipped.snapshot().fingerprint();
    if animated != skipped {
        violations.push(Violation::SkipMismatch {
            scenario,
            animated,
            skipped,
        });
    }
}
