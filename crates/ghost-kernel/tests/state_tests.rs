use ghost_kernel::state_machine::{allowed_transitions, validate_transition, Lifecycle};
use ghost_kernel::types::{AnnotationState, RunState};
use proptest::prelude::*;

#[test]
fn test_annotation_fade_path() {
    assert!(validate_transition(AnnotationState::Hidden, AnnotationState::FadingIn).is_ok());
    assert!(validate_transition(AnnotationState::FadingIn, AnnotationState::Visible).is_ok());
    assert!(validate_transition(AnnotationState::Visible, AnnotationState::Dismissed).is_ok());

    // Invalid
    assert!(validate_transition(AnnotationState::Hidden, AnnotationState::Dismissed).is_err());
    assert!(validate_transition(AnnotationState::FadingIn, AnnotationState::Hidden).is_err());
}

#[test]
fn test_dismissed_is_terminal() {
    assert!(allowed_transitions(AnnotationState::Dismissed).is_empty());
    assert!(validate_transition(AnnotationState::Dismissed, AnnotationState::Visible).is_err());
}

#[test]
fn test_callout_toggle_is_two_state() {
    assert!(validate_transition(AnnotationState::Visible, AnnotationState::Hidden).is_ok());
    assert!(validate_transition(AnnotationState::Hidden, AnnotationState::Visible).is_ok());
}

#[test]
fn test_run_restart_from_any_started_state() {
    for from in [
        RunState::Running,
        RunState::Interactive,
        RunState::Stopped,
        RunState::Failed,
        RunState::Deferred,
    ] {
        assert!(validate_transition(from, RunState::Running).is_ok(), "{from:?}");
    }
    assert!(validate_transition(RunState::Idle, RunState::Stopped).is_err());
    assert!(validate_transition(RunState::Stopped, RunState::Failed).is_err());
}

fn any_run_state() -> impl Strategy<Value = RunState> {
    prop_oneof![
        Just(RunState::Idle),
        Just(RunState::Deferred),
        Just(RunState::Running),
        Just(RunState::Interactive),
        Just(RunState::Stopped),
        Just(RunState::Failed),
    ]
}

fn any_annotation_state() -> impl Strategy<Value = AnnotationState> {
    prop_oneof![
        Just(AnnotationState::Hidden),
        Just(AnnotationState::FadingIn),
        Just(AnnotationState::Visible),
        Just(AnnotationState::Dismissed),
    ]
}

proptest! {
    #[test]
    fn prop_run_transitions_match_matrix(from in any_run_state(), to in any_run_state()) {
        let res = validate_transition(from, to);
        prop_assert_eq!(res.is_ok(), allowed_transitions(from).contains(&to));
    }

    #[test]
    fn prop_annotation_transitions_match_matrix(
        from in any_annotation_state(),
        to in any_annotation_state(),
    ) {
        let res = validate_transition(from, to);
        prop_assert_eq!(res.is_ok(), allowed_transitions(from).contains(&to));
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Panel {
    Closed,
    Opening,
    Open,
}

impl Lifecycle for Panel {
    fn successors(self) -> &'static [Self] {
        match self {
            Panel::Closed => &[Panel::Opening],
            Panel::Opening => &[Panel::Open, Panel::Closed],
            Panel::Open => &[Panel::Closed],
        }
    }
}

#[test]
fn test_lifecycle_implemented_outside_kernel() {
    assert!(validate_transition(Panel::Closed, Panel::Opening).is_ok());
    assert!(validate_transition(Panel::Closed, Panel::Open).is_err());
    assert_eq!(allowed_transitions(Panel::Opening), vec![Panel::Open, Panel::Closed]);
}
