//! Linear scales and the plot area they map into

use crate::config::GeometryConfig;
use crate::host::Size;
use serde::{Deserialize, Serialize};

/// Maps a domain interval linearly onto a pixel range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearScale {
    /// Input interval
    pub domain: (f64, f64),
    /// Output pixel interval
    pub range: (f64, f64),
}

impl LinearScale {
    /// New scale
    #[must_use]
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Map a domain value to the range
    #[must_use]
    pub fn apply(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if (d1 - d0).abs() < f64::EPSILON {
            return r0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    /// Tick values from the domain start, every `step`, inclusive of the end
    #[must_use]
    pub fn ticks(&self, step: f64) -> Vec<f64> {
        let (d0, d1) = self.domain;
        if step <= 0.0 || !step.is_finite() || d1 < d0 {
            return Vec::new();
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let count = ((d1 - d0) / step + 1e-9).floor() as usize;
        #[allow(clippy::cast_precision_loss)]
        (0..=count).map(|i| d0 + step * i as f64).collect()
    }
}

/// Inner rectangle of the container, inside the margins
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotArea {
    /// Left edge in pixels
    pub left: f64,
    /// Top edge in pixels
    pub top: f64,
    /// Right edge in pixels
    pub right: f64,
    /// Bottom edge in pixels
    pub bottom: f64,
}

impl PlotArea {
    /// Plot area for `size`, or `None` when the margins leave nothing
    #[must_use]
    pub fn from_size(size: Size, geometry: &GeometryConfig) -> Option<Self> {
        let area = Self {
            left: geometry.margin_left,
            top: geometry.margin_top,
            right: size.width - geometry.margin_right,
            bottom: size.height - geometry.margin_bottom,
        };
        (area.width() > 0.0 && area.height() > 0.0).then_some(area)
    }

    /// Width
    #[must_use]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Height
    #[must_use]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Shared axis origin (bottom-left)
    #[must_use]
    pub fn origin(&self) -> (f64, f64) {
        (self.left, self.bottom)
    }
}

/// The pair of scales a chart run draws with
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartScales {
    /// Months to horizontal pixels
    pub x: LinearScale,
    /// Retention to vertical pixels, inverted
    pub y: LinearScale,
}

impl ChartScales {
    /// Months on x, retention percentage on y (inverted: 0% at the bottom)
    #[must_use]
    pub fn for_area(area: &PlotArea, geometry: &GeometryConfig) -> Self {
        Self {
            x: LinearScale::new((0.0, geometry.x_max), (area.left, area.right)),
            y: LinearScale::new((0.0, geometry.y_max), (area.bottom, area.top)),
        }
    }
}
