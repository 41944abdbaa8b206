//! Dot lattice intro
//!
//! The lattice is laid out row-major and centred in the area inside the
//! margins. Only the start positions are random; final positions are a pure
//! function of container size and geometry.

use crate::config::GeometryConfig;
use crate::error::SceneError;
use crate::host::Size;
use crate::scene::{ElementId, ElementKind, Scene};
use crate::tween::{Tween, TweenSet};
use ghost_kernel::clock::Millis;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fill colour of lattice dots
pub const DOT_FILL: &str = "#CBD5E1";

/// One dot of the lattice
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    /// Position in lattice order
    pub id: usize,
    /// Row, which sets the settle stagger
    pub row: usize,
    /// Jittered start x
    pub start_x: f64,
    /// Jittered start y
    pub start_y: f64,
    /// Lattice x the dot settles at
    pub final_x: f64,
    /// Lattice y the dot settles at
    pub final_y: f64,
}

/// Output of [`generate_grid`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridLattice {
    /// Rows in the lattice
    pub rows: usize,
    /// Columns in the lattice
    pub cols: usize,
    /// Dots, row-major
    pub points: Vec<GridPoint>,
}

impl GridLattice {
    /// Number of dots
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the container was too small for any dot
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Final positions only, in lattice order
    #[must_use]
    pub fn final_positions(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.final_x, p.final_y)).collect()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn count_along(available: f64, spacing: f64) -> usize {
    if !available.is_finite() || available < 0.0 || spacing <= 0.0 {
        return 0;
    }
    (available / spacing).floor() as usize + 1
}

/// Build a jittered lattice for a container of `size`
pub fn generate_grid<R: Rng + ?Sized>(size: Size, geometry: &GeometryConfig, rng: &mut R) -> GridLattice {
    let available_w = size.width - geometry.margin_left - geometry.margin_right;
    let available_h = size.height - geometry.margin_top - geometry.margin_bottom;
    let spacing = geometry.grid_spacing;

    // rows * cols never exceeds max_grid_dots, whatever the host reports
    let cols = count_along(available_w, spacing).min(geometry.max_grid_dots);
    let max_rows = geometry.max_grid_dots.checked_div(cols).unwrap_or(usize::MAX);
    let rows = count_along(available_h, spacing).min(max_rows);

    #[allow(clippy::cast_precision_loss)]
    let offset_x = geometry.margin_left + (available_w - (cols.saturating_sub(1)) as f64 * spacing) / 2.0;
    #[allow(clippy::cast_precision_loss)]
    let offset_y = geometry.margin_top + (available_h - (rows.saturating_sub(1)) as f64 * spacing) / 2.0;

    let mut points = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            #[allow(clippy::cast_precision_loss)]
            let final_x = offset_x + col as f64 * spacing;
            #[allow(clippy::cast_precision_loss)]
            let final_y = offset_y + row as f64 * spacing;
            points.push(GridPoint {
                id: points.len(),
                row,
                start_x: final_x + jitter(rng, geometry.jitter),
                start_y: final_y + jitter(rng, geometry.jitter),
                final_x,
                final_y,
            });
        }
    }

    GridLattice { rows, cols, points }
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, amount: f64) -> f64 {
    if amount > 0.0 {
        rng.random_range(-amount..=amount)
    } else {
        0.0
    }
}

/// Draw the lattice into `layer` and start every dot settling.
///
/// Each row starts `stagger` after the previous one. Returns the instant the
/// last dot lands.
#[allow(clippy::too_many_arguments)]
pub fn place_dots(
    scene: &mut Scene,
    tweens: &mut TweenSet,
    layer: ElementId,
    lattice: &GridLattice,
    geometry: &GeometryConfig,
    now: Millis,
    stagger: Millis,
    settle: Millis,
) -> Result<Millis, SceneError> {
    let mut last_end = now;
    for point in &lattice.points {
        let dot = scene.append_with_class(layer, ElementKind::Circle, "grid-dot")?;
        scene.set_attrs(
            dot,
            [
                ("cx", point.start_x.into()),
                ("cy", point.start_y.into()),
                ("r", geometry.dot_radius.into()),
                ("fill", DOT_FILL.into()),
                ("opacity", 0.0.into()),
            ],
        )?;

        let start = now + Millis(stagger.as_u64().saturating_mul(point.row as u64));
        for tween in [
            Tween::attr(dot, "cx", point.start_x, point.final_x),
            Tween::attr(dot, "cy", point.start_y, point.final_y),
            Tween::attr(dot, "opacity", 0.0, geometry.dot_opacity),
        ] {
            last_end = last_end.max(tweens.start(tween.starting(start).lasting(settle)));
        }
    }
    Ok(last_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_negative_area_has_no_dots() {
        let mut rng = StdRng::seed_from_u64(1);
        let lattice = generate_grid(Size::new(60.0, 40.0), &GeometryConfig::default(), &mut rng);
        assert!(lattice.is_empty());
        assert_eq!(lattice.cols, 0);
    }

    #[test]
    fn test_lattice_is_centred() {
        let mut rng = StdRng::seed_from_u64(1);
        let geometry = GeometryConfig::default();
        let lattice = generate_grid(Size::new(800.0, 480.0), &geometry, &mut rng);

        let first = lattice.points[0];
        let last = lattice.points[lattice.len() - 1];
        let left_gap = first.final_x - geometry.margin_left;
        let right_gap = (800.0 - geometry.margin_right) - last.final_x;
        assert!((left_gap - right_gap).abs() < 1e-9);
        assert_eq!(lattice.len(), lattice.rows * lattice.cols);
    }

    #[test]
    fn test_jitter_is_bounded() {
        let mut rng = StdRng::seed_from_u64(9);
        let geometry = GeometryConfig::default();
        let lattice = generate_grid(Size::new(400.0, 300.0), &geometry, &mut rng);
        for p in &lattice.points {
            assert!((p.start_x - p.final_x).abs() <= geometry.jitter);
            assert!((p.start_y - p.final_y).abs() <= geometry.jitter);
        }
    }

    #[test]
    fn test_place_dots_staggers_rows() {
        let mut rng = StdRng::seed_from_u64(3);
        let geometry = GeometryConfig::default();
        let lattice = generate_grid(Size::new(200.0, 200.0), &geometry, &mut rng);
        let mut scene = Scene::new();
        let mut tweens = TweenSet::new();

        let end = place_dots(
            &mut scene,
            &mut tweens,
            Scene::ROOT,
            &lattice,
            &geometry,
            Millis(100),
            Millis(10),
            Millis(50),
        )
        .unwrap();

        let expected = 100 + 10 * (lattice.rows as u64 - 1) + 50;
        assert_eq!(end, Millis(expected));
        assert_eq!(scene.select_by_class("grid-dot").len(), lattice.len());
    }
}
