//! Transition matrices for run and annotation lifecycles

use crate::error::StateMachineError;
use crate::types::{AnnotationState, RunState};

/// A state enum with a fixed transition matrix
pub trait Lifecycle: Copy + PartialEq + std::fmt::Debug + 'static {
    /// States reachable from `self` in one step
    fn successors(self) -> &'static [Self];
}

impl Lifecycle for RunState {
    fn successors(self) -> &'static [Self] {
        use RunState::*;
        match self {
            Idle => &[Deferred, Running, Interactive],
            Deferred => &[Deferred, Running, Interactive, Stopped, Failed],
            Running => &[Deferred, Running, Interactive, Stopped, Failed],
            Interactive => &[Deferred, Running, Interactive, Stopped, Failed],
            Stopped => &[Deferred, Running, Interactive],
            Failed => &[Deferred, Running, Interactive],
        }
    }
}

impl Lifecycle for AnnotationState {
    fn successors(self) -> &'static [Self] {
        use AnnotationState::*;
        match self {
            Hidden => &[FadingIn, Visible],
            FadingIn => &[Visible, Dismissed],
            Visible => &[Hidden, Dismissed],
            Dismissed => &[],
        }
    }
}

/// Validates a state transition.
///
/// Illegal transitions return an error; with the `strict-debug` feature they
/// panic instead so the offending call site shows up in a backtrace.
pub fn validate_transition<S: Lifecycle>(from: S, to: S) -> Result<(), StateMachineError> {
    if from.successors().contains(&to) {
        Ok(())
    } else {
        #[cfg(feature = "strict-debug")]
        panic!("Illegal state transition attempted: {:?} -> {:?}", from, to);

        #[allow(unreachable_code)]
        {
            tracing::debug!(?from, ?to, "illegal transition rejected");
            Err(StateMachineError::IllegalTransition)
        }
    }
}

/// Every state `from` may move to
#[must_use]
pub fn allowed_transitions<S: Lifecycle>(from: S) -> Vec<S> {
    from.successors().to_vec()
}
