//! Lifecycle state enums

use serde::{Deserialize, Serialize};

/// Lifecycle of one playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunState {
    /// Never started
    Idle,
    /// Waiting for the container to report a usable size
    Deferred,
    /// Scripted phases are playing
    Running,
    /// Lines are drawn; hover, toggles and layout transitions are live
    Interactive,
    /// Cancelled by the host
    Stopped,
    /// Halted after an error was reported to the host
    Failed,
}

/// Per-annotation display state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationState {
    /// Not displayed
    Hidden,
    /// Fading in
    FadingIn,
    /// Fully displayed
    Visible,
    /// Removed for the rest of the run
    Dismissed,
}
