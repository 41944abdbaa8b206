use ghost_chart::invariants::{check_all, check_gridlines_after_axes, check_series_sequential};
use ghost_chart::prelude::*;
use ghost_test_utils::{
    assert_no_errors, current_run, demo_sequencer, fast_config, interactive_sequencer, position_of,
    RecordingHost,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[test]
fn test_phases_run_in_order() {
    let (sequencer, host) = interactive_sequencer(fast_config());
    let entries = current_run(&sequencer);

    let started: Vec<Phase> = entries
        .iter()
        .filter_map(|e| match e.event {
            TraceEvent::PhaseStarted { phase } => Some(phase),
            _ => None,
        })
        .collect();
    assert_eq!(started, Phase::ALL.to_vec());
    assert!(check_all(sequencer.trace(), Millis(fast_config().timing.series_pause_ms)).is_empty());
    assert_no_errors(&host);
}

#[test]
fn test_gridlines_wait_for_slower_axis() {
    let (sequencer, _host) = interactive_sequencer(fast_config());
    let entries = current_run(&sequencer);

    let x = position_of(&entries, &TraceEvent::AxisGrown { axis: Axis::X }).unwrap();
    let y = position_of(&entries, &TraceEvent::AxisGrown { axis: Axis::Y }).unwrap();
    let gridlines = position_of(&entries, &TraceEvent::PhaseStarted { phase: Phase::Gridlines }).unwrap();
    assert!(x < y, "x axis is faster in the fast timings");
    assert!(gridlines > y);
    assert_eq!(
        sequencer.trace().time_of(&TraceEvent::PhaseStarted { phase: Phase::Gridlines }),
        sequencer.trace().time_of(&TraceEvent::AxisGrown { axis: Axis::Y }),
    );
}

#[test]
fn test_gridlines_wait_when_y_lands_first() {
    let mut config = fast_config();
    config.timing.x_axis_ms = 40;
    config.timing.y_axis_ms = 5;
    let (sequencer, _host) = interactive_sequencer(config);
    let entries = current_run(&sequencer);

    let x = position_of(&entries, &TraceEvent::AxisGrown { axis: Axis::X }).unwrap();
    let y = position_of(&entries, &TraceEvent::AxisGrown { axis: Axis::Y }).unwrap();
    let gridlines = position_of(&entries, &TraceEvent::PhaseStarted { phase: Phase::Gridlines }).unwrap();
    assert!(y < x);
    assert!(gridlines > x);
    assert!(check_gridlines_after_axes(sequencer.trace()).is_empty());
    assert_eq!(sequencer.scene().select_by_class("gridline").len(), 5);
}

#[test]
fn test_series_drawn_strictly_one_after_another() {
    let config = fast_config();
    let pause = Millis(config.timing.series_pause_ms);
    let draw = config.timing.series_draw_ms;
    let (sequencer, _host) = interactive_sequencer(config);
    let trace = sequencer.trace();

    for index in 0..3 {
        let drawn = trace.time_of(&TraceEvent::SeriesDrawn { index }).unwrap();
        let next = trace.time_of(&TraceEvent::SeriesStarted { index: index + 1 }).unwrap();
        assert_eq!(next, drawn + pause);

        let started = trace.time_of(&TraceEvent::SeriesStarted { index }).unwrap();
        assert_eq!(drawn, started + Millis(draw));
    }
    assert!(check_series_sequential(trace, pause).is_empty());
    assert_eq!(trace.count(&TraceEvent::PhaseCompleted { phase: Phase::DrawSeries }), 1);
}

#[test]
fn test_lines_end_fully_drawn() {
    let (sequencer, _host) = interactive_sequencer(fast_config());
    let scene = sequencer.scene();
    let lines = scene.select_by_class("series-line");
    assert_eq!(lines.len(), 4);
    for line in lines {
        assert_eq!(scene.number(line, "stroke-dashoffset"), Some(0.0));
        assert_eq!(scene.number(line, "opacity"), Some(1.0));
    }
    for dot in scene.select_by_class("grid-dot") {
        assert_eq!(scene.number(dot, "opacity"), Some(GeometryConfig::default().dot_opacity));
    }
}

#[test]
fn test_restart_mid_series_leaves_no_trace_of_old_run() {
    let (mut sequencer, host) = demo_sequencer(fast_config());
    sequencer.start().unwrap();
    let first = sequencer.generation();

    // Play until the second series is being drawn
    while sequencer
        .trace()
        .time_of(&TraceEvent::SeriesStarted { index: 1 })
        .is_none()
    {
        assert!(sequencer.advance_by(Millis(1)) < 100);
    }
    assert!(sequencer.pending_timers() > 0);

    sequencer.start().unwrap();
    let second = sequencer.generation();
    assert!(second > first);
    sequencer.run_until_idle();

    assert_eq!(sequencer.stale_dropped(), 0);
    assert_eq!(sequencer.scene().select_by_class("series-line").len(), 4);
    assert_eq!(sequencer.scene().select_by_class("x-axis").len(), 1);
    let rerun = current_run(&sequencer);
    assert_eq!(
        rerun
            .iter()
            .filter(|e| e.event == TraceEvent::SeriesStarted { index: 0 })
            .count(),
        1
    );
    assert!(sequencer
        .trace()
        .for_generation(first)
        .all(|e| e.at <= sequencer.trace().time_of(&TraceEvent::SeriesStarted { index: 1 }).unwrap()));
    assert!(check_all(sequencer.trace(), Millis(fast_config().timing.series_pause_ms)).is_empty());
    assert_no_errors(&host);
}

#[test]
fn test_stop_mid_run_cancels_everything() {
    let (mut sequencer, _host) = demo_sequencer(fast_config());
    sequencer.start().unwrap();
    sequencer.advance_by(Millis(60));
    let before = sequencer.trace().len();

    sequencer.stop();
    assert_eq!(sequencer.run_state(), RunState::Stopped);
    assert_eq!(sequencer.pending_timers(), 0);
    assert!(sequencer.is_idle());
    assert!(sequencer.scene().is_empty());

    assert_eq!(sequencer.advance_by(Millis(10_000)), 0);
    // Only the stop itself was recorded
    assert_eq!(sequencer.trace().len(), before + 1);
    assert_eq!(sequencer.hover(0), Err(AnimationError::NotInteractive));
}

#[test]
fn test_stop_twice_is_harmless() {
    let (mut sequencer, _host) = demo_sequencer(fast_config());
    sequencer.start().unwrap();
    sequencer.stop();
    sequencer.stop();
    assert_eq!(sequencer.trace().count(&TraceEvent::Stopped), 1);

    sequencer.start().unwrap();
    sequencer.run_until_idle();
    assert_eq!(sequencer.run_state(), RunState::Interactive);
}

#[test]
fn test_stop_before_start_records_nothing() {
    let (mut sequencer, _host) = demo_sequencer(fast_config());
    sequencer.stop();
    assert_eq!(sequencer.run_state(), RunState::Idle);
    assert!(sequencer.trace().is_empty());
}

#[test]
fn test_is_animating_tracks_pending_work() {
    let (mut sequencer, _host) = demo_sequencer(fast_config());
    assert!(!sequencer.playback().is_animating);
    sequencer.start().unwrap();
    assert!(sequencer.playback().is_animating);
    sequencer.run_until_idle();
    assert!(!sequencer.playback().is_animating);
}

#[test]
fn test_skip_lands_on_animated_final_scene() {
    let (animated, _) = interactive_sequencer(fast_config());
    let (mut skipped, host) = demo_sequencer(fast_config().with_skip(true));
    skipped.start().unwrap();

    assert_eq!(skipped.run_state(), RunState::Interactive);
    assert!(skipped.is_idle());
    assert_eq!(skipped.snapshot(), animated.snapshot());
    assert_eq!(skipped.snapshot().fingerprint(), animated.snapshot().fingerprint());
    assert_no_errors(&host);
}

#[test]
fn test_same_seed_same_scene() {
    let (a, _) = interactive_sequencer(fast_config());
    let (b, _) = interactive_sequencer(fast_config());
    assert_eq!(a.snapshot().fingerprint(), b.snapshot().fingerprint());
}

#[test]
fn test_speed_multiplier_compresses_timeline() {
    let (normal, _) = interactive_sequencer(fast_config());
    let (fast, _) = interactive_sequencer(fast_config().with_speed(2.0));
    assert!(fast.now() < normal.now());
    assert_eq!(fast.snapshot(), normal.snapshot());
}

#[test]
fn test_live_mode_skips_grid_and_draws_caller_series() {
    let host = RecordingHost::sized(640.0, 400.0);
    let mut sequencer = Sequencer::new(
        fast_config().with_mode(PlaybackMode::Live),
        Arc::clone(&host),
        LayoutHandle::new(),
    )
    .unwrap();
    sequencer
        .set_series(vec![
            CohortSeries::new("A", "#111111", &[(0.0, 100.0), (6.0, 60.0), (12.0, 40.0)]),
            CohortSeries::new("B", "#222222", &[(0.0, 100.0), (12.0, 70.0)]),
        ])
        .unwrap();
    sequencer.start().unwrap();
    sequencer.run_until_idle();

    assert_eq!(sequencer.run_state(), RunState::Interactive);
    assert!(sequencer.scene().select_by_class("grid-dot").is_empty());
    assert_eq!(sequencer.scene().select_by_class("series-line").len(), 2);
    assert_eq!(
        sequencer
            .trace()
            .count(&TraceEvent::PhaseStarted { phase: Phase::SettleGrid }),
        0
    );
    assert_eq!(sequencer.hover(2), Err(AnimationError::UnknownSeries(2)));
}

#[test]
fn test_live_mode_without_series_goes_interactive() {
    let (mut sequencer, _host) = demo_sequencer(fast_config().with_mode(PlaybackMode::Live));
    sequencer.start().unwrap();
    sequencer.run_until_idle();
    assert_eq!(sequencer.run_state(), RunState::Interactive);
    assert!(sequencer.scene().select_by_class("series-line").is_empty());
}

#[test]
fn test_invalid_series_rejected() {
    let (mut sequencer, _host) = demo_sequencer(fast_config());
    let bad = CohortSeries::new("nan", "#000", &[(0.0, f64::NAN)]);
    assert!(matches!(
        sequencer.set_series(vec![bad]),
        Err(AnimationError::InvalidConfig(_))
    ));
}

#[test]
fn test_invalid_config_rejected_at_construction() {
    let config = fast_config().with_speed(-1.0);
    let result = Sequencer::new(config, RecordingHost::sized(800.0, 480.0), LayoutHandle::new());
    assert!(matches!(result, Err(AnimationError::InvalidConfig(_))));
}
