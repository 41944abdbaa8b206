//! Virtual clock
//!
//! Animation time is a plain millisecond counter. Nothing reads the wall
//! clock, so a run is reproducible from its configuration alone.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// A point (or span) on the animation timeline, in milliseconds
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Millis(pub u64);

impl Millis {
    /// Zero time
    pub const ZERO: Millis = Millis(0);

    /// Raw milliseconds
    #[inline]
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Scale a span by a playback speed multiplier.
    ///
    /// A multiplier of 2.0 halves the span. Non-finite or non-positive
    /// multipliers leave the span unchanged.
    #[must_use]
    pub fn scaled(self, speed_multiplier: f64) -> Millis {
        if !speed_multiplier.is_finite() || speed_multiplier <= 0.0 {
            return self;
        }
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let scaled = (self.0 as f64 / speed_multiplier).round() as u64;
        Millis(scaled)
    }

    /// Saturating subtraction
    #[inline]
    #[must_use]
    pub fn saturating_sub(self, other: Millis) -> Millis {
        Millis(self.0.saturating_sub(other.0))
    }
}

impl Add for Millis {
    type Output = Millis;

    fn add(self, rhs: Millis) -> Millis {
        Millis(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Millis {
    type Output = Millis;

    fn sub(self, rhs: Millis) -> Millis {
        self.saturating_sub(rhs)
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Monotonic virtual clock
#[derive(Debug, Clone, Copy, Default)]
pub struct VirtualClock {
    now: Millis,
}

impl VirtualClock {
    /// Clock at t = 0
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time
    #[inline]
    #[must_use]
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Move the clock forward to `t`. Earlier targets are ignored.
    pub fn advance_to(&mut self, t: Millis) -> Millis {
        self.now = self.now.max(t);
        self.now
    }

    /// Move the clock forward by `span`
    pub fn advance_by(&mut self, span: Millis) -> Millis {
        self.now = self.now + span;
        self.now
    }
}
