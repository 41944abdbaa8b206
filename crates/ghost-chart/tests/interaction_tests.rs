use ghost_chart::prelude::*;
use ghost_test_utils::{demo_sequencer, fast_config, interactive_sequencer};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn test_interaction_rejected_until_lines_drawn() {
    let (mut sequencer, _host) = demo_sequencer(fast_config());
    sequencer.start().unwrap();
    sequencer.advance_by(Millis(20));
    assert_eq!(sequencer.run_state(), RunState::Running);

    assert_eq!(sequencer.hover(0), Err(AnimationError::NotInteractive));
    assert_eq!(sequencer.hover_end(), Err(AnimationError::NotInteractive));
    assert_eq!(sequencer.toggle_series(0), Err(AnimationError::NotInteractive));
    assert_eq!(sequencer.click_insight_icon(), Err(AnimationError::NotInteractive));
    assert!(matches!(
        sequencer.ask_about_chart(),
        Err(AnimationError::NotInteractive)
    ));
    assert!(AnimationError::NotInteractive.is_retryable());
}

#[test]
fn test_hover_highlights_one_series() {
    let (mut sequencer, _host) = interactive_sequencer(fast_config());
    let geometry = GeometryConfig::default();
    sequencer.hover(2).unwrap();
    assert_eq!(sequencer.hovered(), Some(2));

    let scene = sequencer.scene();
    let lines = scene.select_by_class("series-line");
    for (i, line) in lines.iter().enumerate() {
        let (opacity, width) = if i == 2 {
            (1.0, geometry.hover_stroke_width)
        } else {
            (geometry.dimmed_opacity, geometry.series_stroke_width)
        };
        assert_eq!(scene.number(*line, "opacity"), Some(opacity), "series {i}");
        assert_eq!(scene.number(*line, "stroke-width"), Some(width), "series {i}");
    }

    let legend = scene.select_by_class("legend-entry");
    assert_eq!(legend.len(), 4);
    assert_eq!(scene.number(legend[2], "opacity"), Some(1.0));
    assert_eq!(scene.number(legend[0], "opacity"), Some(geometry.dimmed_opacity));
}

#[test]
fn test_hover_out_of_range() {
    let (mut sequencer, _host) = interactive_sequencer(fast_config());
    assert_eq!(sequencer.hover(9), Err(AnimationError::UnknownSeries(9)));
    assert_eq!(sequencer.toggle_series(4), Err(AnimationError::UnknownSeries(4)));
}

#[test]
fn test_toggle_hides_and_restores_series() {
    let (mut sequencer, _host) = interactive_sequencer(fast_config());
    let resting = sequencer.snapshot();

    assert_eq!(sequencer.toggle_series(1), Ok(false));
    let line = sequencer.scene().select_by_class("series-line")[1];
    let hit = sequencer.scene().select_by_class("hit-path")[1];
    assert_eq!(
        sequencer.scene().attr(line, "display").map(ToString::to_string),
        Some("none".to_string())
    );
    assert_eq!(
        sequencer.scene().attr(hit, "display").map(ToString::to_string),
        Some("none".to_string())
    );

    // Hidden series cannot be hovered
    sequencer.hover(1).unwrap();
    assert_eq!(sequencer.hovered(), None);

    assert_eq!(sequencer.toggle_series(1), Ok(true));
    assert_eq!(sequencer.snapshot(), resting);
}

#[test]
fn test_insight_toggle_flips_panel() {
    let (mut sequencer, _host) = interactive_sequencer(fast_config());
    let kind = AnnotationKind::InsightCallout;
    assert_eq!(sequencer.annotation_state(kind), AnnotationState::Visible);

    assert_eq!(sequencer.click_insight_icon(), Ok(AnnotationState::Hidden));
    assert_eq!(sequencer.annotation_state(kind), AnnotationState::Hidden);
    assert_eq!(sequencer.click_insight_icon(), Ok(AnnotationState::Visible));
    assert_eq!(
        sequencer.trace().count(&TraceEvent::Annotation {
            kind,
            state: AnnotationState::Hidden
        }),
        1
    );
}

#[test]
fn test_annotations_settle_and_overlay_dismisses_itself() {
    let (sequencer, _host) = interactive_sequencer(fast_config());
    for kind in AnnotationKind::ALL {
        let expected = if kind == AnnotationKind::DataQualityOverlay {
            AnnotationState::Dismissed
        } else {
            AnnotationState::Visible
        };
        assert_eq!(sequencer.annotation_state(kind), expected, "{kind}");
    }
    assert_eq!(
        sequencer
            .trace()
            .count(&TraceEvent::PhaseCompleted { phase: Phase::Annotations }),
        1
    );

    let overlay = sequencer.scene().select_by_class(AnnotationKind::DataQualityOverlay.class());
    assert_eq!(
        sequencer.scene().attr(overlay[0], "display").map(ToString::to_string),
        Some("none".to_string())
    );
}

#[test]
fn test_annotations_appear_in_configured_order() {
    let (sequencer, _host) = interactive_sequencer(fast_config());
    let trace = sequencer.trace();
    let shown: Vec<Millis> = AnnotationKind::ALL
        .iter()
        .map(|&kind| {
            trace
                .time_of(&TraceEvent::Annotation {
                    kind,
                    state: AnnotationState::FadingIn,
                })
                .unwrap()
        })
        .collect();
    assert!(shown.windows(2).all(|w| w[0] < w[1]), "{shown:?}");

    let lines_done = trace
        .time_of(&TraceEvent::PhaseCompleted { phase: Phase::DrawSeries })
        .unwrap();
    let timing = fast_config().timing;
    assert_eq!(shown[0], lines_done + Millis(timing.legend_delay_ms));
}

#[test]
fn test_dismiss_overlay_early() {
    let (mut sequencer, _host) = demo_sequencer(fast_config());
    sequencer.start().unwrap();
    while sequencer.annotation_state(AnnotationKind::DataQualityOverlay) != AnnotationState::Visible {
        sequencer.advance_by(Millis(1));
    }
    sequencer
        .dismiss_annotation(AnnotationKind::DataQualityOverlay)
        .unwrap();
    sequencer.run_until_idle();

    assert_eq!(
        sequencer.trace().count(&TraceEvent::Annotation {
            kind: AnnotationKind::DataQualityOverlay,
            state: AnnotationState::Dismissed
        }),
        1
    );
    // Dismissing again is a state error, not a panic
    assert!(matches!(
        sequencer.dismiss_annotation(AnnotationKind::DataQualityOverlay),
        Err(AnimationError::Kernel(_))
    ));
}

#[derive(Debug, Clone)]
enum Pointer {
    Over(usize),
    Leave,
}

fn pointer() -> impl Strategy<Value = Pointer> {
    prop_oneof![(0usize..4).prop_map(Pointer::Over), Just(Pointer::Leave)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_any_hover_path_returns_to_rest(path in prop::collection::vec(pointer(), 0..12)) {
        let (mut sequencer, _host) = interactive_sequencer(fast_config());
        let resting = sequencer.snapshot();

        for step in &path {
            match step {
                Pointer::Over(i) => sequencer.hover(*i).unwrap(),
                Pointer::Leave => sequencer.hover_end().unwrap(),
            }
        }
        sequencer.hover_end().unwrap();
        prop_assert_eq!(sequencer.snapshot(), resting);
    }

    #[test]
    fn prop_repeated_hover_is_idempotent(index in 0usize..4, times in 1usize..5) {
        let (mut sequencer, _host) = interactive_sequencer(fast_config());
        sequencer.hover(index).unwrap();
        let once = sequencer.snapshot();
        for _ in 0..times {
            sequencer.hover(index).unwrap();
        }
        prop_assert_eq!(sequencer.snapshot(), once);
    }
}
