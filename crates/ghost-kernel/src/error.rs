//! Kernel error types

use std::fmt;

/// Any kernel failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// Timer queue misuse
    Timer(TimerError),
    /// Join misuse
    Join(JoinError),
    /// Rejected state transition
    StateMachine(StateMachineError),
}

impl KernelError {
    /// Whether the caller can keep using the timeline after this error
    pub fn is_recoverable(&self) -> bool {
        match self {
            KernelError::Timer(_) => true,
            KernelError::Join(JoinError::AlreadyArrived) => true,
            KernelError::Join(JoinError::UnknownParticipant) => false,
            KernelError::StateMachine(_) => false,
        }
    }
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::Timer(e) => write!(f, "Timer error: {e}"),
            KernelError::Join(e) => write!(f, "Join error: {e}"),
            KernelError::StateMachine(e) => write!(f, "State machine error: {e}"),
        }
    }
}

impl std::error::Error for KernelError {}

impl From<TimerError> for KernelError {
    fn from(value: TimerError) -> Self {
        KernelError::Timer(value)
    }
}

impl From<JoinError> for KernelError {
    fn from(value: JoinError) -> Self {
        KernelError::Join(value)
    }
}

impl From<StateMachineError> for KernelError {
    fn from(value: StateMachineError) -> Self {
        KernelError::StateMachine(value)
    }
}

/// Timer queue errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// The handle already fired, was cancelled, or was drained
    NotPending,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for TimerError {}

/// AND-join errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    /// Participant is not part of the join
    UnknownParticipant,
    /// Participant already arrived
    AlreadyArrived,
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for JoinError {}

/// State machine errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    /// Target state is not reachable from the current one
    IllegalTransition,
}

impl fmt::Display for StateMachineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for StateMachineError {}
