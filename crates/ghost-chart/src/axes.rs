//! Axes and gridlines
//!
//! Both axes grow from the shared origin at the same time but over their own
//! durations. Each axis gets its ticks and labels as soon as it lands;
//! gridlines wait on an [`AndJoin`] over both.

use crate::config::GeometryConfig;
use crate::error::{AnimationError, SceneError};
use crate::scale::{ChartScales, PlotArea};
use crate::scene::{ElementId, ElementKind, Scene};
use crate::tween::{Tween, TweenSet};
use ghost_kernel::clock::Millis;
use ghost_kernel::join::{AndJoin, JoinStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

const AXIS_STROKE: &str = "#64748B";
const GRIDLINE_STROKE: &str = "#E2E8F0";
const TICK_LENGTH: f64 = 6.0;

/// One of the two chart axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Horizontal axis, months since signup
    X,
    /// Vertical axis, retention percentage
    Y,
}

impl Axis {
    /// Both axes
    pub const BOTH: [Axis; 2] = [Axis::X, Axis::Y];

    fn class(self) -> &'static str {
        match self {
            Axis::X => "x-axis",
            Axis::Y => "y-axis",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class())
    }
}

/// Draws the axes of one run and tracks their completion
#[derive(Debug)]
pub struct AxisRenderer {
    area: PlotArea,
    scales: ChartScales,
    join: AndJoin<Axis>,
    groups: Vec<(Axis, ElementId)>,
}

impl AxisRenderer {
    /// Renderer for one plot area
    #[must_use]
    pub fn new(area: PlotArea, scales: ChartScales) -> Self {
        Self {
            area,
            scales,
            join: AndJoin::new(Axis::BOTH),
            groups: Vec::new(),
        }
    }

    /// Start both axes growing; returns when each one lands
    pub fn begin(
        &mut self,
        scene: &mut Scene,
        tweens: &mut TweenSet,
        layer: ElementId,
        now: Millis,
        x_span: Millis,
        y_span: Millis,
    ) -> Result<[(Axis, Millis); 2], SceneError> {
        let (ox, oy) = self.area.origin();
        let mut ends = [(Axis::X, now), (Axis::Y, now)];

        for (slot, (axis, span)) in ends.iter_mut().zip([(Axis::X, x_span), (Axis::Y, y_span)]) {
            let group = scene.append_with_class(layer, ElementKind::Group, axis.class())?;
            let line = scene.append_with_class(group, ElementKind::Line, "axis-line")?;
            scene.set_attrs(
                line,
                [
                    ("x1", ox.into()),
                    ("y1", oy.into()),
                    ("x2", ox.into()),
                    ("y2", oy.into()),
                    ("stroke", AXIS_STROKE.into()),
                    ("stroke-width", 1.0.into()),
                ],
            )?;
            let tween = match axis {
                Axis::X => Tween::attr(line, "x2", ox, self.area.right),
                Axis::Y => Tween::attr(line, "y2", oy, self.area.top),
            };
            *slot = (axis, tweens.start(tween.starting(now).lasting(span)));
            self.groups.push((axis, group));
        }
        Ok(ends)
    }

    /// An axis finished growing: attach its ticks and labels, then arrive at
    /// the join.
    ///
    /// # Errors
    /// A duplicate signal is rejected before anything is drawn.
    pub fn on_axis_grown(
        &mut self,
        scene: &mut Scene,
        geometry: &GeometryConfig,
        axis: Axis,
    ) -> Result<JoinStatus, AnimationError> {
        let status = self.join.arrive(axis)?;
        let Some(group) = self.groups.iter().find(|(a, _)| *a == axis).map(|(_, g)| *g) else {
            // Never began: nothing to label
            return Ok(status);
        };

        let (ox, oy) = self.area.origin();
        match axis {
            Axis::X => {
                for value in self.scales.x.ticks(geometry.x_tick_step) {
                    let x = self.scales.x.apply(value);
                    let tick = scene.append_with_class(group, ElementKind::Line, "tick")?;
                    scene.set_attrs(
                        tick,
                        [
                            ("x1", x.into()),
                            ("y1", oy.into()),
                            ("x2", x.into()),
                            ("y2", (oy + TICK_LENGTH).into()),
                            ("stroke", AXIS_STROKE.into()),
                        ],
                    )?;
                    let label = scene.append_with_class(group, ElementKind::Text, "tick-label")?;
                    scene.set_attrs(
                        label,
                        [
                            ("x", x.into()),
                            ("y", (oy + TICK_LENGTH + 14.0).into()),
                            ("text-anchor", "middle".into()),
                        ],
                    )?;
                    scene.set_text(label, format!("M{value}"))?;
                }
            }
            Axis::Y => {
                for value in self.scales.y.ticks(geometry.y_tick_step) {
                    let y = self.scales.y.apply(value);
                    let tick = scene.append_with_class(group, ElementKind::Line, "tick")?;
                    scene.set_attrs(
                        tick,
                        [
                            ("x1", (ox - TICK_LENGTH).into()),
                            ("y1", y.into()),
                            ("x2", ox.into()),
                            ("y2", y.into()),
                            ("stroke", AXIS_STROKE.into()),
                        ],
                    )?;
                    let label = scene.append_with_class(group, ElementKind::Text, "tick-label")?;
                    scene.set_attrs(
                        label,
                        [
                            ("x", (ox - TICK_LENGTH - 4.0).into()),
                            ("y", (y + 4.0).into()),
                            ("text-anchor", "end".into()),
                        ],
                    )?;
                    scene.set_text(label, format!("{value}%"))?;
                }
            }
        }
        Ok(status)
    }

    /// Whether both axes have landed
    #[must_use]
    pub fn gridlines_ready(&self) -> bool {
        self.join.is_complete()
    }

    /// Fade in horizontal gridlines at every y tick above the origin.
    /// Returns when the fade ends.
    pub fn draw_gridlines(
        &self,
        scene: &mut Scene,
        tweens: &mut TweenSet,
        layer: ElementId,
        geometry: &GeometryConfig,
        now: Millis,
        fade: Millis,
    ) -> Result<Millis, SceneError> {
        let mut end = now;
        for value in self.scales.y.ticks(geometry.y_tick_step).into_iter().skip(1) {
            let y = self.scales.y.apply(value);
            let line = scene.append_with_class(layer, ElementKind::Line, "gridline")?;
            scene.set_attrs(
                line,
                [
                    ("x1", self.area.left.into()),
                    ("y1", y.into()),
                    ("x2", self.area.right.into()),
                    ("y2", y.into()),
                    ("stroke", GRIDLINE_STROKE.into()),
                    ("opacity", 0.0.into()),
                ],
            )?;
            let tween = Tween::attr(line, "opacity", 0.0, geometry.gridline_opacity);
            end = end.max(tweens.start(tween.starting(now).lasting(fade)));
        }
        Ok(end)
    }
}
