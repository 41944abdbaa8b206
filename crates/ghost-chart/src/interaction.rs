//! Hover highlighting and series toggles
//!
//! Interaction never undoes a previous mutation. The layer holds two pieces of
//! state, which series are visible and which one is hovered, and
//! [`InteractionLayer::apply`] writes the appearance those imply. With no
//! hover that appearance is the resting state, so every sequence of hovers
//! ends on the same attributes.

use crate::cohort::SeriesPaths;
use crate::config::GeometryConfig;
use crate::error::{AnimationError, SceneError};
use crate::scene::{ElementId, Scene};

/// Elements interaction writes to
#[derive(Debug, Clone, Copy)]
pub struct SeriesTargets<'a> {
    /// Drawn series, by index
    pub lines: &'a [SeriesPaths],
    /// Legend entries, by index; empty until the legend is built
    pub legend: &'a [ElementId],
}

/// Hover and visibility state of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionLayer {
    visible: Vec<bool>,
    hovered: Option<usize>,
}

impl InteractionLayer {
    /// All `count` series visible, none hovered
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            visible: vec![true; count],
            hovered: None,
        }
    }

    /// Series currently hovered
    #[must_use]
    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    /// Whether series `index` is shown
    #[must_use]
    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.get(index).copied().unwrap_or(false)
    }

    fn check(&self, index: usize) -> Result<(), AnimationError> {
        if index < self.visible.len() {
            Ok(())
        } else {
            Err(AnimationError::UnknownSeries(index))
        }
    }

    /// Highlight `index`. Hidden series cannot be hovered; that is a no-op.
    ///
    /// # Errors
    /// [`AnimationError::UnknownSeries`] for an out-of-range index.
    pub fn hover(
        &mut self,
        scene: &mut Scene,
        targets: SeriesTargets<'_>,
        geometry: &GeometryConfig,
        index: usize,
    ) -> Result<(), AnimationError> {
        self.check(index)?;
        if !self.visible[index] {
            return Ok(());
        }
        self.hovered = Some(index);
        self.apply(scene, targets, geometry)?;
        Ok(())
    }

    /// Drop the hover and return to the resting state
    pub fn hover_end(
        &mut self,
        scene: &mut Scene,
        targets: SeriesTargets<'_>,
        geometry: &GeometryConfig,
    ) -> Result<(), SceneError> {
        self.hovered = None;
        self.apply(scene, targets, geometry)
    }

    /// Flip visibility of `index`; returns whether it is now visible
    ///
    /// # Errors
    /// [`AnimationError::UnknownSeries`] for an out-of-range index.
    pub fn toggle(
        &mut self,
        scene: &mut Scene,
        targets: SeriesTargets<'_>,
        geometry: &GeometryConfig,
        index: usize,
    ) -> Result<bool, AnimationError> {
        self.check(index)?;
        self.visible[index] = !self.visible[index];
        if self.hovered == Some(index) {
            self.hovered = None;
        }
        self.apply(scene, targets, geometry)?;
        Ok(self.visible[index])
    }

    /// Write the appearance implied by the current state
    pub fn apply(
        &self,
        scene: &mut Scene,
        targets: SeriesTargets<'_>,
        geometry: &GeometryConfig,
    ) -> Result<(), SceneError> {
        for (i, paths) in targets.lines.iter().enumerate() {
            let visible = self.is_visible(i);
            let (opacity, width) = match self.hovered {
                _ if !visible => (0.0, geometry.series_stroke_width),
                Some(h) if h == i => (1.0, geometry.hover_stroke_width),
                Some(_) => (geometry.dimmed_opacity, geometry.series_stroke_width),
                None => (1.0, geometry.series_stroke_width),
            };
            let display = if visible { "inline" } else { "none" };
            scene.set_attrs(
                paths.line,
                [
                    ("opacity", opacity.into()),
                    ("stroke-width", width.into()),
                    ("display", display.into()),
                ],
            )?;
            scene.set_attr(paths.hit, "display", display)?;
        }

        for (i, entry) in targets.legend.iter().enumerate() {
            let opacity = match self.hovered {
                _ if !self.is_visible(i) => geometry.hidden_legend_opacity,
                Some(h) if h != i => geometry.dimmed_opacity,
                _ => 1.0,
            };
            scene.set_attr(*entry, "opacity", opacity)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::ElementKind;
    use pretty_assertions::assert_eq;

    fn fixture(count: usize) -> (Scene, Vec<SeriesPaths>, Vec<ElementId>) {
        let mut scene = Scene::new();
        let mut lines = Vec::new();
        let mut legend = Vec::new();
        for _ in 0..count {
            let line = scene.append(Scene::ROOT, ElementKind::Path).unwrap();
            let hit = scene.append(Scene::ROOT, ElementKind::Path).unwrap();
            lines.push(SeriesPaths { line, hit });
            legend.push(scene.append(Scene::ROOT, ElementKind::Group).unwrap());
        }
        (scene, lines, legend)
    }

    #[test]
    fn test_hover_dims_others() {
        let geometry = GeometryConfig::default();
        let (mut scene, lines, legend) = fixture(3);
        let targets = SeriesTargets { lines: &lines, legend: &legend };
        let mut layer = InteractionLayer::new(3);

        layer.hover(&mut scene, targets, &geometry, 1).unwrap();
        assert_eq!(scene.number(lines[1].line, "stroke-width"), Some(geometry.hover_stroke_width));
        assert_eq!(scene.number(lines[0].line, "opacity"), Some(geometry.dimmed_opacity));
        assert_eq!(scene.number(legend[2], "opacity"), Some(geometry.dimmed_opacity));
        assert_eq!(scene.number(legend[1], "opacity"), Some(1.0));
    }

    #[test]
    fn test_hover_paths_converge() {
        let geometry = GeometryConfig::default();
        let (mut scene, lines, legend) = fixture(3);
        let targets = SeriesTargets { lines: &lines, legend: &legend };
        let mut layer = InteractionLayer::new(3);
        layer.apply(&mut scene, targets, &geometry).unwrap();
        let resting = scene.snapshot();

        layer.hover(&mut scene, targets, &geometry, 0).unwrap();
        layer.hover(&mut scene, targets, &geometry, 2).unwrap();
        layer.hover_end(&mut scene, targets, &geometry).unwrap();
        assert_eq!(scene.snapshot(), resting);
    }

    #[test]
    fn test_toggle_hides_and_unknown_series() {
        let geometry = GeometryConfig::default();
        let (mut scene, lines, legend) = fixture(2);
        let targets = SeriesTargets { lines: &lines, legend: &legend };
        let mut layer = InteractionLayer::new(2);

        assert_eq!(layer.toggle(&mut scene, targets, &geometry, 0), Ok(false));
        assert_eq!(scene.attr(lines[0].hit, "display").map(ToString::to_string), Some("none".into()));
        assert_eq!(scene.number(legend[0], "opacity"), Some(geometry.hidden_legend_opacity));

        // Hovering a hidden series changes nothing
        layer.hover(&mut scene, targets, &geometry, 0).unwrap();
        assert_eq!(layer.hovered(), None);

        assert_eq!(
            layer.hover(&mut scene, targets, &geometry, 5),
            Err(AnimationError::UnknownSeries(5))
        );
    }
}
