//! Sequencer configuration
//!
//! Every duration in the script is configuration. The defaults are the
//! unhurried pacing of the marketing demo; [`TimingConfig::instant`] gives the
//! near-zero pacing used when the demo should simply appear.

use crate::annotation::AnnotationKind;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Demo plays the dot-grid intro with built-in cohorts; live draws caller data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Dot-grid intro, then the built-in cohorts
    #[default]
    Demo,
    /// No intro; series come from `set_series`
    Live,
}

impl std::str::FromStr for PlaybackMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "demo" => Ok(PlaybackMode::Demo),
            "live" => Ok(PlaybackMode::Live),
            other => Err(ConfigError::invalid("mode", format!("unknown mode '{other}'"))),
        }
    }
}

/// Phase durations and delays, in milliseconds at 1x speed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Extra start delay per lattice row
    pub dot_stagger_ms: u64,
    /// Time for a dot to settle from its jittered start
    pub dot_settle_ms: u64,
    /// Pause between the grid settling and the axes starting
    pub after_grid_ms: u64,
    /// Horizontal axis growth
    pub x_axis_ms: u64,
    /// Vertical axis growth
    pub y_axis_ms: u64,
    /// Gridline fade-in
    pub gridline_fade_ms: u64,
    /// Pause between gridlines and the first series
    pub after_gridlines_ms: u64,
    /// Stroke draw of one series
    pub series_draw_ms: u64,
    /// Pause between one series ending and the next starting
    pub series_pause_ms: u64,
    /// Delay of the legend after the last series
    pub legend_delay_ms: u64,
    /// Delay of the confidence badge
    pub confidence_delay_ms: u64,
    /// Delay of the coverage badge
    pub coverage_delay_ms: u64,
    /// Delay of the insight callout
    pub insight_delay_ms: u64,
    /// Delay of the data-quality overlay
    pub data_quality_delay_ms: u64,
    /// Delay of the "ask about this chart" button
    pub ask_button_delay_ms: u64,
    /// Fade-in shared by all annotations
    pub annotation_fade_ms: u64,
    /// Time the data-quality overlay stays up once visible
    pub data_quality_dismiss_ms: u64,
    /// Sidebar width animation
    pub sidebar_open_ms: u64,
    /// Delay between metric cards appended to the sidebar
    pub metric_card_stagger_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            dot_stagger_ms: 40,
            dot_settle_ms: 1200,
            after_grid_ms: 300,
            x_axis_ms: 800,
            y_axis_ms: 1000,
            gridline_fade_ms: 400,
            after_gridlines_ms: 300,
            series_draw_ms: 1500,
            series_pause_ms: 300,
            legend_delay_ms: 200,
            confidence_delay_ms: 500,
            coverage_delay_ms: 700,
            insight_delay_ms: 1000,
            data_quality_delay_ms: 1200,
            ask_button_delay_ms: 1500,
            annotation_fade_ms: 400,
            data_quality_dismiss_ms: 6000,
            sidebar_open_ms: 500,
            metric_card_stagger_ms: 150,
        }
    }
}

impl TimingConfig {
    /// Every duration and delay at zero
    #[must_use]
    pub fn instant() -> Self {
        Self {
            dot_stagger_ms: 0,
            dot_settle_ms: 0,
            after_grid_ms: 0,
            x_axis_ms: 0,
            y_axis_ms: 0,
            gridline_fade_ms: 0,
            after_gridlines_ms: 0,
            series_draw_ms: 0,
            series_pause_ms: 0,
            legend_delay_ms: 0,
            confidence_delay_ms: 0,
            coverage_delay_ms: 0,
            insight_delay_ms: 0,
            data_quality_delay_ms: 0,
            ask_button_delay_ms: 0,
            annotation_fade_ms: 0,
            data_quality_dismiss_ms: 0,
            sidebar_open_ms: 0,
            metric_card_stagger_ms: 0,
        }
    }

    /// Delay after the last series before `kind` starts fading in
    #[must_use]
    pub fn annotation_delay_ms(&self, kind: AnnotationKind) -> u64 {
        match kind {
            AnnotationKind::Legend => self.legend_delay_ms,
            AnnotationKind::ConfidenceBadge => self.confidence_delay_ms,
            AnnotationKind::CoverageBadge => self.coverage_delay_ms,
            AnnotationKind::InsightCallout => self.insight_delay_ms,
            AnnotationKind::DataQualityOverlay => self.data_quality_delay_ms,
            AnnotationKind::AskButton => self.ask_button_delay_ms,
        }
    }
}

/// Chart geometry and styling constants, in pixels unless noted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Space above the plot area
    pub margin_top: f64,
    /// Space right of the plot area
    pub margin_right: f64,
    /// Space below the plot area, room for x labels
    pub margin_bottom: f64,
    /// Space left of the plot area, room for y labels
    pub margin_left: f64,
    /// Distance between lattice dots
    pub grid_spacing: f64,
    /// Upper bound on lattice size; huge containers get a centred sub-lattice
    pub max_grid_dots: usize,
    /// Radius of one lattice dot
    pub dot_radius: f64,
    /// Max start offset per axis, either direction
    pub jitter: f64,
    /// Opacity dots settle at
    pub dot_opacity: f64,
    /// Months shown on the x axis
    pub x_max: f64,
    /// Distance between x ticks
    pub x_tick_step: f64,
    /// Retention percentage shown on the y axis
    pub y_max: f64,
    /// Distance between y ticks
    pub y_tick_step: f64,
    /// Opacity gridlines fade in to
    pub gridline_opacity: f64,
    /// Stroke width of a series at rest
    pub series_stroke_width: f64,
    /// Stroke width of the hovered series
    pub hover_stroke_width: f64,
    /// Opacity of series and legend entries that are not hovered
    pub dimmed_opacity: f64,
    /// Opacity of legend entries for hidden series
    pub hidden_legend_opacity: f64,
    /// Stroke width of the invisible hover target
    pub hit_path_width: f64,
    /// Width the sidebar opens to
    pub sidebar_width: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            margin_top: 40.0,
            margin_right: 40.0,
            margin_bottom: 60.0,
            margin_left: 70.0,
            grid_spacing: 24.0,
            max_grid_dots: 40_000,
            dot_radius: 1.5,
            jitter: 5.0,
            dot_opacity: 0.35,
            x_max: 12.0,
            x_tick_step: 1.0,
            y_max: 100.0,
            y_tick_step: 20.0,
            gridline_opacity: 0.25,
            series_stroke_width: 2.0,
            hover_stroke_width: 3.5,
            dimmed_opacity: 0.15,
            hidden_legend_opacity: 0.4,
            hit_path_width: 14.0,
            sidebar_width: 320.0,
        }
    }
}

/// Top-level sequencer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Demo or live data
    pub mode: PlaybackMode,
    /// Play straight through to the final state inside `start()`
    pub skip: bool,
    /// 2.0 plays twice as fast
    pub speed_multiplier: f64,
    /// Seed for the lattice jitter; `None` draws from the OS
    pub jitter_seed: Option<u64>,
    /// Interval between container probes while deferred
    pub container_retry_ms: u64,
    /// Probes after the first before giving up
    pub max_container_retries: u32,
    /// Every delay and duration of the script
    pub timing: TimingConfig,
    /// Margins, lattice and stroke settings
    pub geometry: GeometryConfig,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            mode: PlaybackMode::Demo,
            skip: false,
            speed_multiplier: 1.0,
            jitter_seed: None,
            container_retry_ms: 100,
            max_container_retries: 20,
            timing: TimingConfig::default(),
            geometry: GeometryConfig::default(),
        }
    }
}

impl SequencerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With playback mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: PlaybackMode) -> Self {
        self.mode = mode;
        self
    }

    /// With skip flag
    #[inline]
    #[must_use]
    pub fn with_skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    /// With speed multiplier
    #[inline]
    #[must_use]
    pub fn with_speed(mut self, speed_multiplier: f64) -> Self {
        self.speed_multiplier = speed_multiplier;
        self
    }

    /// With a fixed jitter seed
    #[inline]
    #[must_use]
    pub fn with_jitter_seed(mut self, seed: u64) -> Self {
        self.jitter_seed = Some(seed);
        self
    }

    /// With timing table
    #[inline]
    #[must_use]
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// With geometry constants
    #[inline]
    #[must_use]
    pub fn with_geometry(mut self, geometry: GeometryConfig) -> Self {
        self.geometry = geometry;
        self
    }

    /// Parse from TOML text; missing keys take their defaults
    ///
    /// # Errors
    /// Parse failures and out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SequencerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// I/O, parse failures and out-of-range values.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject values the sequencer cannot play
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_speed(self.speed_multiplier)?;

        let g = &self.geometry;
        for (field, value) in [
            ("geometry.margin_top", g.margin_top),
            ("geometry.margin_right", g.margin_right),
            ("geometry.margin_bottom", g.margin_bottom),
            ("geometry.margin_left", g.margin_left),
            ("geometry.jitter", g.jitter),
            ("geometry.dot_radius", g.dot_radius),
            ("geometry.sidebar_width", g.sidebar_width),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(field, format!("must be >= 0, got {value}")));
            }
        }
        for (field, value) in [
            ("geometry.grid_spacing", g.grid_spacing),
            ("geometry.x_max", g.x_max),
            ("geometry.x_tick_step", g.x_tick_step),
            ("geometry.y_max", g.y_max),
            ("geometry.y_tick_step", g.y_tick_step),
            ("geometry.series_stroke_width", g.series_stroke_width),
            ("geometry.hover_stroke_width", g.hover_stroke_width),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::invalid(field, format!("must be > 0, got {value}")));
            }
        }
        for (field, value) in [
            ("geometry.dot_opacity", g.dot_opacity),
            ("geometry.gridline_opacity", g.gridline_opacity),
            ("geometry.dimmed_opacity", g.dimmed_opacity),
            ("geometry.hidden_legend_opacity", g.hidden_legend_opacity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(field, format!("must be in [0, 1], got {value}")));
            }
        }
        Ok(())
    }
}

pub(crate) fn validate_speed(speed_multiplier: f64) -> Result<(), ConfigError> {
    if speed_multiplier.is_finite() && speed_multiplier > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            "speed_multiplier",
            format!("must be finite and > 0, got {speed_multiplier}"),
        ))
    }
}

/// Launch flags read from the query string and browser-style storage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchFlags {
    /// Jump straight to the resting state
    pub skip: bool,
    /// Forced playback mode, if any
    pub mode: Option<PlaybackMode>,
}

impl LaunchFlags {
    /// Storage key holding the skip flag
    pub const SKIP_KEY: &'static str = "skipAnimation";
    /// Storage key holding the playback mode
    pub const MODE_KEY: &'static str = "mode";

    /// Parse `?skip=true&mode=live`; the leading `?` is optional
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut flags = Self::default();
        for pair in query.trim_start_matches('?').split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "skip" => flags.skip = is_truthy(value),
                "mode" => flags.mode = value.parse().ok(),
                _ => {}
            }
        }
        flags
    }

    /// Read [`Self::SKIP_KEY`] and [`Self::MODE_KEY`] from a storage map
    #[must_use]
    pub fn from_storage(storage: &HashMap<String, String>) -> Self {
        Self {
            skip: storage.get(Self::SKIP_KEY).is_some_and(|v| is_truthy(v)),
            mode: storage.get(Self::MODE_KEY).and_then(|v| v.parse().ok()),
        }
    }

    /// Combine two sources: skip if either asks, `self`'s mode wins
    #[must_use]
    pub fn merge(self, other: LaunchFlags) -> Self {
        Self {
            skip: self.skip || other.skip,
            mode: self.mode.or(other.mode),
        }
    }

    /// Apply onto a configuration
    #[must_use]
    pub fn apply(self, mut config: SequencerConfig) -> SequencerConfig {
        if self.skip {
            config.skip = true;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        config
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}
