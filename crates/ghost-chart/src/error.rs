//! Error types for Ghost Chart
//!
//! A single [`AnimationError`] is reported to the host for anything that
//! stops a run: a container that never becomes measurable, a measurement that
//! fails mid-run, or a bad configuration. Interaction calls return the same
//! type so the host has one thing to match on.

use crate::phase::Phase;
use crate::scene::ElementId;
use ghost_kernel::{JoinError, KernelError, StateMachineError, TimerError};

/// Main animation error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnimationError {
    /// The container has no usable size yet; the run is deferred
    #[error("container not ready")]
    ContainerNotReady,

    /// The container never reported a usable size
    #[error("container never became ready after {attempts} probes")]
    ContainerNeverReady {
        /// Number of probes made
        attempts: u32,
    },

    /// A phase that measures the container got a degenerate size
    #[error("container measurement failed during {phase}")]
    Measurement {
        /// Phase that was measuring
        phase: Phase,
    },

    /// Configuration rejected
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Series index out of range
    #[error("unknown series index {0}")]
    UnknownSeries(usize),

    /// Interaction requested before the lines finished drawing
    #[error("chart is not interactive yet")]
    NotInteractive,

    /// Layout transition rejected
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    /// Scene graph inconsistency
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),

    /// Timeline kernel error
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),
}

impl AnimationError {
    /// Whether the run was halted by this error
    #[inline]
    #[must_use]
    pub fn halts_run(&self) -> bool {
        matches!(
            self,
            Self::ContainerNeverReady { .. } | Self::Measurement { .. } | Self::Scene(_)
        )
    }

    /// Whether the caller can simply retry the same call later
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ContainerNotReady | Self::NotInteractive)
    }
}

impl From<ConfigError> for AnimationError {
    fn from(value: ConfigError) -> Self {
        AnimationError::InvalidConfig(value.to_string())
    }
}

impl From<StateMachineError> for AnimationError {
    fn from(value: StateMachineError) -> Self {
        AnimationError::Kernel(value.into())
    }
}

impl From<JoinError> for AnimationError {
    fn from(value: JoinError) -> Self {
        AnimationError::Kernel(value.into())
    }
}

impl From<TimerError> for AnimationError {
    fn from(value: TimerError) -> Self {
        AnimationError::Kernel(value.into())
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("{field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Layout transition errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// Chart is already in the sidebar
    #[error("chart is already minimized to the sidebar")]
    AlreadyMinimized,

    /// Chart is already inline
    #[error("chart is not minimized")]
    NotMinimized,

    /// Sidebar operation without a sidebar
    #[error("no sidebar panel is open")]
    NoSidebar,
}

/// Scene graph errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// Element id not present in the scene
    #[error("unknown element {0}")]
    UnknownElement(ElementId),

    /// The root element cannot be removed
    #[error("cannot remove the scene root")]
    RootRemoval,
}
