//! Annotations drawn once the lines are complete
//!
//! Each annotation is requested at most once per run and then walks
//! `Hidden -> FadingIn -> Visible -> Dismissed`. The insight callout is the
//! exception after its first display: its icon toggles the panel between
//! `Visible` and `Hidden`.

use crate::cohort::CohortSeries;
use crate::error::{AnimationError, SceneError};
use crate::scale::PlotArea;
use crate::scene::{ElementId, ElementKind, Scene};
use crate::tween::{Tween, TweenSet};
use ghost_kernel::clock::Millis;
use ghost_kernel::state_machine::validate_transition;
use ghost_kernel::AnnotationState;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Annotation kinds, in the order they are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AnnotationKind {
    /// Series names and colours
    Legend,
    /// Model confidence badge
    ConfidenceBadge,
    /// Cohort coverage badge
    CoverageBadge,
    /// Insight panel, toggled by its icon once shown
    InsightCallout,
    /// Data-quality warning that dismisses itself
    DataQualityOverlay,
    /// "Ask about this chart" button
    AskButton,
}

impl AnnotationKind {
    /// Every kind
    pub const ALL: [AnnotationKind; 6] = [
        AnnotationKind::Legend,
        AnnotationKind::ConfidenceBadge,
        AnnotationKind::CoverageBadge,
        AnnotationKind::InsightCallout,
        AnnotationKind::DataQualityOverlay,
        AnnotationKind::AskButton,
    ];

    /// Class of the annotation's root group
    #[must_use]
    pub fn class(self) -> &'static str {
        match self {
            AnnotationKind::Legend => "legend",
            AnnotationKind::ConfidenceBadge => "confidence-badge",
            AnnotationKind::CoverageBadge => "coverage-badge",
            AnnotationKind::InsightCallout => "insight-callout",
            AnnotationKind::DataQualityOverlay => "data-quality-overlay",
            AnnotationKind::AskButton => "ask-button",
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class())
    }
}

/// Annotation state for one run
#[derive(Debug, Default)]
pub struct AnnotationLayer {
    states: BTreeMap<AnnotationKind, AnnotationState>,
    requested: BTreeSet<AnnotationKind>,
    settled: BTreeSet<AnnotationKind>,
    roots: BTreeMap<AnnotationKind, ElementId>,
    legend_entries: Vec<ElementId>,
    insight_panel: Option<ElementId>,
}

impl AnnotationLayer {
    /// Everything hidden, nothing requested
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of `kind`
    #[must_use]
    pub fn state(&self, kind: AnnotationKind) -> AnnotationState {
        self.states
            .get(&kind)
            .copied()
            .unwrap_or(AnnotationState::Hidden)
    }

    /// Ask for `kind` to be shown. Returns `false` if it was already asked
    /// for this run, in which case the caller must not schedule it again.
    pub fn request(&mut self, kind: AnnotationKind) -> bool {
        let fresh = self.requested.insert(kind);
        if !fresh {
            tracing::debug!(%kind, "duplicate annotation request collapsed");
        }
        fresh
    }

    /// Whether every requested annotation has finished fading in (or was
    /// dismissed first)
    #[must_use]
    pub fn all_settled(&self) -> bool {
        self.requested.is_subset(&self.settled)
    }

    fn set_state(&mut self, kind: AnnotationKind, to: AnnotationState) -> Result<(), AnimationError> {
        validate_transition(self.state(kind), to)?;
        self.states.insert(kind, to);
        Ok(())
    }

    /// Build `kind` and start its fade-in; returns when the fade ends
    #[allow(clippy::too_many_arguments)]
    pub fn begin_fade(
        &mut self,
        scene: &mut Scene,
        tweens: &mut TweenSet,
        layer: ElementId,
        kind: AnnotationKind,
        series: &[CohortSeries],
        area: &PlotArea,
        now: Millis,
        fade: Millis,
    ) -> Result<Millis, AnimationError> {
        self.set_state(kind, AnnotationState::FadingIn)?;

        let root = scene.append_with_class(layer, ElementKind::Group, kind.class())?;
        scene.set_attr(root, "opacity", 0.0)?;
        self.roots.insert(kind, root);

        match kind {
            AnnotationKind::Legend => self.build_legend(scene, root, series, area)?,
            AnnotationKind::ConfidenceBadge => {
                badge(scene, root, area.right - 150.0, area.top - 30.0, "Confidence: 92%")?;
            }
            AnnotationKind::CoverageBadge => {
                badge(scene, root, area.right - 300.0, area.top - 30.0, "Coverage: 94% of accounts")?;
            }
            AnnotationKind::InsightCallout => self.build_insight(scene, root, area)?,
            AnnotationKind::DataQualityOverlay => {
                let panel = badge(
                    scene,
                    root,
                    area.left + 20.0,
                    area.bottom - 60.0,
                    "2 cohorts have incomplete month-12 data",
                )?;
                scene.add_class(panel, "audit-panel")?;
            }
            AnnotationKind::AskButton => {
                let button = badge(scene, root, area.right - 170.0, area.bottom + 24.0, "Ask about this chart")?;
                scene.add_class(button, "clickable")?;
            }
        }

        let tween = Tween::attr(root, "opacity", 0.0, 1.0).starting(now).lasting(fade);
        Ok(tweens.start(tween))
    }

    /// The fade-in of `kind` landed
    ///
    /// # Errors
    /// If `kind` is no longer fading in, for instance because it was dismissed.
    pub fn finish_fade(&mut self, kind: AnnotationKind) -> Result<(), AnimationError> {
        self.set_state(kind, AnnotationState::Visible)?;
        self.settled.insert(kind);
        Ok(())
    }

    /// Take `kind` down for the rest of the run
    ///
    /// # Errors
    /// Rejected unless `kind` is fading in or visible.
    pub fn dismiss(
        &mut self,
        scene: &mut Scene,
        tweens: &mut TweenSet,
        kind: AnnotationKind,
    ) -> Result<(), AnimationError> {
        self.set_state(kind, AnnotationState::Dismissed)?;
        self.settled.insert(kind);
        if let Some(root) = self.roots.get(&kind).copied() {
            tweens.cancel_element(root);
            scene.set_attr(root, "opacity", 0.0)?;
            scene.set_attr(root, "display", "none")?;
        }
        Ok(())
    }

    /// Show or hide the insight panel; returns the new state
    ///
    /// # Errors
    /// [`AnimationError::NotInteractive`] before the callout has finished
    /// fading in for the first time; a state machine error once dismissed.
    pub fn toggle_insight(&mut self, scene: &mut Scene) -> Result<AnnotationState, AnimationError> {
        let kind = AnnotationKind::InsightCallout;
        let panel = self.insight_panel.ok_or(AnimationError::NotInteractive)?;
        let next = match self.state(kind) {
            AnnotationState::Visible => AnnotationState::Hidden,
            AnnotationState::Hidden => AnnotationState::Visible,
            AnnotationState::FadingIn => return Err(AnimationError::NotInteractive),
            AnnotationState::Dismissed => AnnotationState::Dismissed,
        };
        self.set_state(kind, next)?;
        let opacity = if next == AnnotationState::Visible { 1.0 } else { 0.0 };
        scene.set_attr(panel, "opacity", opacity)?;
        Ok(next)
    }

    /// Legend entry groups, one per series in order
    #[must_use]
    pub fn legend_entries(&self) -> &[ElementId] {
        &self.legend_entries
    }

    fn build_legend(
        &mut self,
        scene: &mut Scene,
        root: ElementId,
        series: &[CohortSeries],
        area: &PlotArea,
    ) -> Result<(), SceneError> {
        self.legend_entries.clear();
        for (i, s) in series.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let x = area.left + 110.0 * i as f64;
            let entry = scene.append_with_class(root, ElementKind::Group, "legend-entry")?;
            scene.set_attr(entry, "opacity", 1.0)?;

            let swatch = scene.append_with_class(entry, ElementKind::Rect, "legend-swatch")?;
            scene.set_attrs(
                swatch,
                [
                    ("x", x.into()),
                    ("y", (area.top - 24.0).into()),
                    ("width", 12.0.into()),
                    ("height", 12.0.into()),
                    ("fill", s.color.as_str().into()),
                ],
            )?;
            let label = scene.append_with_class(entry, ElementKind::Text, "legend-label")?;
            scene.set_attrs(label, [("x", (x + 18.0).into()), ("y", (area.top - 14.0).into())])?;
            scene.set_text(label, s.name.as_str())?;

            self.legend_entries.push(entry);
        }
        Ok(())
    }

    fn build_insight(&mut self, scene: &mut Scene, root: ElementId, area: &PlotArea) -> Result<(), SceneError> {
        let icon = scene.append_with_class(root, ElementKind::Circle, "insight-icon")?;
        scene.set_attrs(
            icon,
            [
                ("cx", (area.left + area.width() * 0.6).into()),
                ("cy", (area.top + area.height() * 0.35).into()),
                ("r", 9.0.into()),
                ("fill", "#4F46E5".into()),
            ],
        )?;
        let panel = badge(
            scene,
            root,
            area.left + area.width() * 0.6 + 16.0,
            area.top + area.height() * 0.35 - 12.0,
            "Q2 cohort retains 10 pts better by month 6",
        )?;
        scene.add_class(panel, "insight-panel")?;
        scene.set_attr(panel, "opacity", 1.0)?;
        self.insight_panel = Some(panel);
        Ok(())
    }
}

/// Rounded label box; returns its group
fn badge(scene: &mut Scene, parent: ElementId, x: f64, y: f64, text: &str) -> Result<ElementId, SceneError> {
    let group = scene.append_with_class(parent, ElementKind::Group, "badge")?;
    let rect = scene.append(group, ElementKind::Rect)?;
    #[allow(clippy::cast_precision_loss)]
    let width = 16.0 + 7.0 * text.chars().count() as f64;
    scene.set_attrs(
        rect,
        [
            ("x", x.into()),
            ("y", y.into()),
            ("width", width.into()),
            ("height", 24.0.into()),
            ("rx", 6.0.into()),
            ("fill", "#FFFFFF".into()),
            ("stroke", "#E2E8F0".into()),
        ],
    )?;
    let label = scene.append(group, ElementKind::Text)?;
    scene.set_attrs(label, [("x", (x + 8.0).into()), ("y", (y + 16.0).into())])?;
    scene.set_text(label, text)?;
    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::demo_cohorts;
    use crate::config::GeometryConfig;
    use crate::host::Size;

    fn area() -> PlotArea {
        PlotArea::from_size(Size::new(800.0, 480.0), &GeometryConfig::default()).unwrap()
    }

    fn show(layer: &mut AnnotationLayer, scene: &mut Scene, kind: AnnotationKind) {
        let mut tweens = TweenSet::new();
        layer
            .begin_fade(scene, &mut tweens, Scene::ROOT, kind, &demo_cohorts(), &area(), Millis(0), Millis(0))
            .unwrap();
        layer.finish_fade(kind).unwrap();
    }

    #[test]
    fn test_request_is_deduplicated() {
        let mut layer = AnnotationLayer::new();
        assert!(layer.request(AnnotationKind::Legend));
        assert!(!layer.request(AnnotationKind::Legend));
    }

    #[test]
    fn test_fade_lifecycle() {
        let mut layer = AnnotationLayer::new();
        let mut scene = Scene::new();
        show(&mut layer, &mut scene, AnnotationKind::Legend);
        assert_eq!(layer.state(AnnotationKind::Legend), AnnotationState::Visible);
        assert_eq!(layer.legend_entries().len(), 4);

        // A second fade of the same annotation is illegal
        let mut tweens = TweenSet::new();
        let again = layer.begin_fade(
            &mut scene,
            &mut tweens,
            Scene::ROOT,
            AnnotationKind::Legend,
            &[],
            &area(),
            Millis(0),
            Millis(0),
        );
        assert!(again.is_err());
    }

    #[test]
    fn test_insight_toggles_after_first_display() {
        let mut layer = AnnotationLayer::new();
        let mut scene = Scene::new();
        assert_eq!(layer.toggle_insight(&mut scene), Err(AnimationError::NotInteractive));

        show(&mut layer, &mut scene, AnnotationKind::InsightCallout);
        assert_eq!(layer.toggle_insight(&mut scene), Ok(AnnotationState::Hidden));
        assert_eq!(layer.toggle_insight(&mut scene), Ok(AnnotationState::Visible));
    }

    #[test]
    fn test_dismiss_hides_root() {
        let mut layer = AnnotationLayer::new();
        let mut scene = Scene::new();
        let mut tweens = TweenSet::new();
        show(&mut layer, &mut scene, AnnotationKind::DataQualityOverlay);

        layer
            .dismiss(&mut scene, &mut tweens, AnnotationKind::DataQualityOverlay)
            .unwrap();
        let root = scene.select_by_class("data-quality-overlay")[0];
        assert_eq!(scene.number(root, "opacity"), Some(0.0));
        assert_eq!(
            layer.state(AnnotationKind::DataQualityOverlay),
            AnnotationState::Dismissed
        );
        assert!(layer
            .dismiss(&mut scene, &mut tweens, AnnotationKind::DataQualityOverlay)
            .is_err());
    }
}
