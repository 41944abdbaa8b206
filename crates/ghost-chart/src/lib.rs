//! Ghost Chart - headless onboarding animation
//!
//! Plays the "ghost chart" demonstration as an explicit, replayable script:
//!
//! 1. **Grid**: a jittered dot lattice settles into place
//! 2. **Axes**: two axes grow from a shared origin; gridlines wait for both
//! 3. **Cohort lines**: series are drawn strictly one after another
//! 4. **Annotations**: legend, badges, insight callout, data-quality overlay
//! 5. **Interactive**: hover, toggles and the minimize-to-sidebar transition
//!
//! Rendering targets a retained [`scene::Scene`] instead of a live DOM, and
//! every phase runs off a [`ghost_kernel::timer::TimerQueue`] on a virtual
//! clock, so a run is deterministic and can be cancelled at any point.
//!
//! # Example
//!
//! ```rust
//! use ghost_chart::prelude::*;
//!
//! let host = StaticHost::new(Size::new(800.0, 480.0));
//! let config = SequencerConfig::default().with_jitter_seed(7);
//! let mut sequencer = Sequencer::new(config, host, LayoutHandle::new()).unwrap();
//!
//! sequencer.start().unwrap();
//! sequencer.run_until_idle();
//!
//! sequencer.hover(0).unwrap();
//! sequencer.hover_end().unwrap();
//! assert!(!sequencer.playback().is_animating);
//! ```

#![warn(missing_docs)]

pub mod annotation;
pub mod axes;
pub mod cohort;
pub mod config;
pub mod driver;
pub mod error;
pub mod grid;
pub mod host;
pub mod interaction;
pub mod invariants;
pub mod layout;
pub mod phase;
pub mod scale;
pub mod scene;
pub mod sequencer;
pub mod simulator;
pub mod svg;
pub mod trace;
pub mod tween;

pub use error::{AnimationError, ConfigError, LayoutError, SceneError};

/// Re-export of the types most callers need
pub mod prelude {
    pub use crate::annotation::AnnotationKind;
    pub use crate::axes::Axis;
    pub use crate::cohort::{demo_cohorts, CohortPoint, CohortSeries};
    pub use crate::config::{
        GeometryConfig, LaunchFlags, PlaybackMode, SequencerConfig, TimingConfig,
    };
    pub use crate::driver::{DriverOutcome, RealtimeDriver};
    pub use crate::error::{AnimationError, ConfigError, LayoutError, SceneError};
    pub use crate::host::{ChartHost, Size, StaticHost};
    pub use crate::layout::{ChartPlacement, LayoutHandle, MetricCard, Thumbnail};
    pub use crate::phase::Phase;
    pub use crate::scene::{Scene, SceneSnapshot};
    pub use crate::sequencer::{PlaybackState, Sequencer};
    pub use crate::trace::{Trace, TraceEvent};
    pub use ghost_kernel::prelude::{AnnotationState, Generation, Millis, RunState};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
