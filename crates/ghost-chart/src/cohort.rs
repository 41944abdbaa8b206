//! Cohort retention series and their stroke-draw animation

use crate::config::GeometryConfig;
use crate::error::{AnimationError, SceneError};
use crate::scale::ChartScales;
use crate::scene::{ElementId, ElementKind, Scene};
use crate::tween::{Easing, Tween, TweenSet};
use ghost_kernel::clock::Millis;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// One data point: month since signup, retention percentage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CohortPoint {
    /// Months since signup
    pub x: f64,
    /// Retention percentage
    pub y: f64,
}

/// One labelled line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortSeries {
    /// Legend label
    pub name: String,
    /// CSS colour of the stroke and legend swatch
    pub color: String,
    /// Points in x order
    pub points: Vec<CohortPoint>,
}

impl CohortSeries {
    /// Series from `(x, y)` pairs
    pub fn new(name: impl Into<String>, color: impl Into<String>, points: &[(f64, f64)]) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            points: points.iter().map(|&(x, y)| CohortPoint { x, y }).collect(),
        }
    }

    /// Reject series the renderer cannot draw
    ///
    /// # Errors
    /// [`AnimationError::InvalidConfig`] for an empty series or non-finite points.
    pub fn validate(&self) -> Result<(), AnimationError> {
        if self.points.is_empty() {
            return Err(AnimationError::InvalidConfig(format!(
                "series '{}' has no points",
                self.name
            )));
        }
        if self.points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(AnimationError::InvalidConfig(format!(
                "series '{}' has non-finite points",
                self.name
            )));
        }
        Ok(())
    }
}

/// Built-in retention cohorts used in demo mode
#[must_use]
pub fn demo_cohorts() -> Vec<CohortSeries> {
    const CURVES: [(&str, &str, [f64; 13]); 4] = [
        (
            "Q1 2024",
            "#4F46E5",
            [100.0, 82.0, 71.0, 64.0, 59.0, 55.0, 52.0, 50.0, 48.0, 47.0, 46.0, 45.0, 44.0],
        ),
        (
            "Q2 2024",
            "#10B981",
            [100.0, 86.0, 77.0, 70.0, 66.0, 63.0, 60.0, 58.0, 57.0, 56.0, 55.0, 54.0, 54.0],
        ),
        (
            "Q3 2024",
            "#F59E0B",
            [100.0, 78.0, 66.0, 58.0, 52.0, 48.0, 45.0, 43.0, 41.0, 40.0, 39.0, 38.0, 37.0],
        ),
        (
            "Q4 2024",
            "#EF4444",
            [100.0, 74.0, 61.0, 53.0, 47.0, 43.0, 40.0, 38.0, 36.0, 35.0, 34.0, 33.0, 32.0],
        ),
    ];

    CURVES
        .iter()
        .map(|(name, color, values)| CohortSeries {
            name: (*name).to_string(),
            color: (*color).to_string(),
            points: values
                .iter()
                .enumerate()
                .map(|(month, &y)| {
                    #[allow(clippy::cast_precision_loss)]
                    let x = month as f64;
                    CohortPoint { x, y }
                })
                .collect(),
        })
        .collect()
}

/// Polyline path data and its length in pixels
#[must_use]
pub fn path_data(series: &CohortSeries, scales: &ChartScales) -> (String, f64) {
    let mut d = String::new();
    let mut length = 0.0;
    let mut previous: Option<(f64, f64)> = None;

    for point in &series.points {
        let (x, y) = (scales.x.apply(point.x), scales.y.apply(point.y));
        let command = if previous.is_none() { 'M' } else { 'L' };
        let _ = write!(d, "{command}{x:.2},{y:.2}");
        if let Some((px, py)) = previous {
            length += (x - px).hypot(y - py);
        }
        previous = Some((x, y));
    }
    (d, length)
}

/// Elements drawn for one series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesPaths {
    /// Visible stroke
    pub line: ElementId,
    /// Wide transparent hover target
    pub hit: ElementId,
}

/// Draws series one at a time
#[derive(Debug, Default)]
pub struct LineRenderer {
    drawn: Vec<SeriesPaths>,
}

impl LineRenderer {
    /// No series drawn yet
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add series `index` and start its stroke-draw; returns when it lands
    #[allow(clippy::too_many_arguments)]
    pub fn begin_series(
        &mut self,
        scene: &mut Scene,
        tweens: &mut TweenSet,
        layer: ElementId,
        index: usize,
        series: &CohortSeries,
        scales: &ChartScales,
        geometry: &GeometryConfig,
        now: Millis,
        draw: Millis,
    ) -> Result<Millis, SceneError> {
        let (d, length) = path_data(series, scales);

        let group = scene.append_with_class(layer, ElementKind::Group, "series")?;
        scene.set_attr(group, "data-series", series.name.as_str())?;

        let line = scene.append_with_class(group, ElementKind::Path, "series-line")?;
        scene.set_attrs(
            line,
            [
                ("d", d.clone().into()),
                ("fill", "none".into()),
                ("stroke", series.color.as_str().into()),
                ("stroke-width", geometry.series_stroke_width.into()),
                ("stroke-dasharray", length.into()),
                ("stroke-dashoffset", length.into()),
                ("opacity", 1.0.into()),
            ],
        )?;

        let hit = scene.append_with_class(group, ElementKind::Path, "hit-path")?;
        scene.set_attrs(
            hit,
            [
                ("d", d.into()),
                ("fill", "none".into()),
                ("stroke", "transparent".into()),
                ("stroke-width", geometry.hit_path_width.into()),
                ("data-index", index.to_string().into()),
            ],
        )?;

        match self.drawn.get_mut(index) {
            Some(slot) => *slot = SeriesPaths { line, hit },
            None => self.drawn.push(SeriesPaths { line, hit }),
        }

        let tween = Tween::attr(line, "stroke-dashoffset", length, 0.0)
            .starting(now)
            .lasting(draw)
            .eased(Easing::Linear);
        Ok(tweens.start(tween))
    }

    /// Paths of every series begun so far, by index
    #[must_use]
    pub fn drawn(&self) -> &[SeriesPaths] {
        &self.drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Size;
    use crate::scale::PlotArea;

    fn scales() -> ChartScales {
        let geometry = GeometryConfig::default();
        let area = PlotArea::from_size(Size::new(800.0, 480.0), &geometry).unwrap();
        ChartScales::for_area(&area, &geometry)
    }

    #[test]
    fn test_demo_cohorts_shape() {
        let cohorts = demo_cohorts();
        assert_eq!(cohorts.len(), 4);
        for series in &cohorts {
            assert_eq!(series.points.len(), 13);
            assert!(series.validate().is_ok());
        }
    }

    #[test]
    fn test_path_length_of_straight_line() {
        let series = CohortSeries::new("flat", "#000", &[(0.0, 50.0), (12.0, 50.0)]);
        let (d, length) = path_data(&series, &scales());
        assert!(d.starts_with("M70.00,"));
        assert!((length - 690.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_series_rejected() {
        let series = CohortSeries::new("empty", "#000", &[]);
        assert!(matches!(series.validate(), Err(AnimationError::InvalidConfig(_))));
    }

    #[test]
    fn test_begin_series_starts_fully_offset() {
        let mut scene = Scene::new();
        let mut tweens = TweenSet::new();
        let mut lines = LineRenderer::new();
        let series = &demo_cohorts()[0];

        let end = lines
            .begin_series(
                &mut scene,
                &mut tweens,
                Scene::ROOT,
                0,
                series,
                &scales(),
                &GeometryConfig::default(),
                Millis(10),
                Millis(1500),
            )
            .unwrap();
        assert_eq!(end, Millis(1510));

        let paths = lines.drawn()[0];
        let length = scene.number(paths.line, "stroke-dasharray").unwrap();
        assert_eq!(scene.number(paths.line, "stroke-dashoffset"), Some(length));
        assert!(scene.has_class(paths.hit, "hit-path"));
    }
}
