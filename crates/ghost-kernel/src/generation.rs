//! Run generations
//!
//! Every scheduled entry carries the generation that was current when it was
//! scheduled. Bumping the counter invalidates everything older in one step,
//! so an entry that somehow survives a drain still does nothing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Epoch of one playback
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Generation(pub u64);

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}

/// Monotonically increasing generation source
#[derive(Debug, Default)]
pub struct GenerationCounter {
    current: Generation,
}

impl GenerationCounter {
    /// Counter at generation zero (no run started)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation
    #[inline]
    #[must_use]
    pub fn current(&self) -> Generation {
        self.current
    }

    /// Start a new epoch and return it
    pub fn bump(&mut self) -> Generation {
        self.current = Generation(self.current.0 + 1);
        tracing::trace!(generation = self.current.0, "generation bumped");
        self.current
    }

    /// Whether `generation` belongs to the live epoch
    #[inline]
    #[must_use]
    pub fn is_current(&self, generation: Generation) -> bool {
        generation == self.current
    }
}
