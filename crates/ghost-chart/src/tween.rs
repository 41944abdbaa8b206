//! Attribute transitions
//!
//! A tween interpolates one numeric attribute between a start and end value.
//! Tweens never schedule anything themselves: the phase that starts a tween
//! also schedules the timer entry for its end, and sampling at that instant
//! lands the attribute exactly on its end value.

use crate::layout::LayoutHandle;
use crate::scene::{ElementId, Scene};
use ghost_kernel::clock::Millis;

/// Easing curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    /// Constant speed
    Linear,
    /// Symmetric cubic, the usual default for chart transitions
    #[default]
    CubicInOut,
}

impl Easing {
    /// Map linear progress in `[0, 1]` onto the curve
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - u * u * u / 2.0
                }
            }
        }
    }
}

/// What a tween writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenTarget {
    /// Numeric attribute of a scene element
    Element { id: ElementId, attr: &'static str },
    /// Width of the sidebar panel in the dashboard layout
    SidebarWidth,
}

/// One running transition
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    /// What the tween writes
    pub target: TweenTarget,
    /// Start value
    pub from: f64,
    /// End value
    pub to: f64,
    /// When the tween begins
    pub start: Millis,
    /// How long it runs
    pub duration: Millis,
    /// Progress curve
    pub easing: Easing,
}

impl Tween {
    /// Element attribute tween with the default easing
    #[must_use]
    pub fn attr(id: ElementId, attr: &'static str, from: f64, to: f64) -> Self {
        Self {
            target: TweenTarget::Element { id, attr },
            from,
            to,
            start: Millis::ZERO,
            duration: Millis::ZERO,
            easing: Easing::default(),
        }
    }

    /// Starting at `start`
    #[must_use]
    pub fn starting(mut self, start: Millis) -> Self {
        self.start = start;
        self
    }

    /// Lasting `duration`
    #[must_use]
    pub fn lasting(mut self, duration: Millis) -> Self {
        self.duration = duration;
        self
    }

    /// With easing
    #[must_use]
    pub fn eased(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// When the tween lands on `to`
    #[must_use]
    pub fn end(&self) -> Millis {
        self.start + self.duration
    }

    /// Interpolated value at `now`
    #[must_use]
    pub fn value_at(&self, now: Millis) -> f64 {
        if now < self.start {
            return self.from;
        }
        if now >= self.end() {
            return self.to;
        }
        #[allow(clippy::cast_precision_loss)]
        let progress = (now - self.start).as_u64() as f64 / self.duration.as_u64() as f64;
        self.from + (self.to - self.from) * self.easing.apply(progress)
    }
}

/// Active tweens of one run
#[derive(Debug, Default)]
pub struct TweenSet {
    active: Vec<Tween>,
}

impl TweenSet {
    /// Empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a tween, interrupting any other tween on the same target
    pub fn start(&mut self, tween: Tween) -> Millis {
        let end = tween.end();
        self.active.retain(|t| t.target != tween.target);
        self.active.push(tween);
        end
    }

    /// Drop every tween writing to `id`
    pub fn cancel_element(&mut self, id: ElementId) {
        self.active
            .retain(|t| !matches!(t.target, TweenTarget::Element { id: e, .. } if e == id));
    }

    /// Drop every tween writing to `target`
    pub fn cancel(&mut self, target: TweenTarget) {
        self.active.retain(|t| t.target != target);
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.active.clear();
    }

    /// Write every active tween's value at `now`; finished tweens are retired
    pub fn sample(&mut self, scene: &mut Scene, layout: &LayoutHandle, now: Millis) {
        for tween in &self.active {
            let value = tween.value_at(now);
            match tween.target {
                TweenTarget::Element { id, attr } => {
                    // Elements removed mid-tween are simply skipped
                    let _ = scene.set_attr(id, attr, value);
                }
                TweenTarget::SidebarWidth => layout.set_sidebar_width(value),
            }
        }
        self.active.retain(|t| t.end() > now);
    }

    /// Latest end among active tweens
    #[must_use]
    pub fn last_end(&self) -> Option<Millis> {
        self.active.iter().map(Tween::end).max()
    }

    /// Number of active tweens
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether nothing is animating
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
