//! Dashboard layout context
//!
//! The chart lives either inline in the dashboard or minimized into a sidebar
//! panel. The layout is shared with whatever embeds the chart, so it sits
//! behind an `Arc<RwLock<_>>` and is handed to the sequencer at construction.

use crate::error::LayoutError;
use ghost_kernel::state_machine::{validate_transition, Lifecycle};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Where the chart is displayed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartPlacement {
    /// Full size in the dashboard
    #[default]
    Inline,
    /// Hidden; a thumbnail sits in the sidebar
    MinimizedToSidebar,
}

impl Lifecycle for ChartPlacement {
    fn successors(self) -> &'static [Self] {
        match self {
            ChartPlacement::Inline => &[ChartPlacement::MinimizedToSidebar],
            ChartPlacement::MinimizedToSidebar => &[ChartPlacement::Inline],
        }
    }
}

/// One summary card shown in the sidebar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricCard {
    /// Card heading
    pub title: String,
    /// Headline figure
    pub value: String,
    /// Change against the previous period
    pub delta: String,
}

impl MetricCard {
    /// New card
    pub fn new(title: impl Into<String>, value: impl Into<String>, delta: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            delta: delta.into(),
        }
    }
}

/// Cards appended after the chart moves to the sidebar
#[must_use]
pub fn demo_metric_cards() -> Vec<MetricCard> {
    vec![
        MetricCard::new("Month-3 retention", "62%", "+4.1 pts"),
        MetricCard::new("Best cohort", "Q2 2024", "+8.3 pts vs avg"),
        MetricCard::new("Data coverage", "94%", "-1.2 pts"),
        MetricCard::new("Churn risk", "Moderate", "stable"),
    ]
}

/// Serialized chart image placed in the sidebar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    /// SVG markup
    pub markup: String,
    /// SHA-256 of the markup, hex encoded
    pub digest: String,
}

/// Sidebar panel state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidebarPanel {
    /// Current animated width
    pub width: f64,
    /// Width the panel opens to
    pub target_width: f64,
    /// Snapshot of the chart when it was minimized
    pub thumbnail: Thumbnail,
    /// Cards appended so far
    pub cards: Vec<MetricCard>,
}

/// The parts of the dashboard the chart animation touches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardLayout {
    /// Where the chart is shown
    pub placement: ChartPlacement,
    /// Whether the inline chart is displayed
    pub chart_visible: bool,
    /// Sidebar panel while minimized
    pub sidebar: Option<SidebarPanel>,
}

impl Default for DashboardLayout {
    fn default() -> Self {
        Self {
            placement: ChartPlacement::Inline,
            chart_visible: true,
            sidebar: None,
        }
    }
}

/// Shared handle to a [`DashboardLayout`]
#[derive(Debug, Clone, Default)]
pub struct LayoutHandle(Arc<RwLock<DashboardLayout>>);

impl LayoutHandle {
    /// Inline chart, no sidebar
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current layout
    #[must_use]
    pub fn read(&self) -> DashboardLayout {
        self.0.read().clone()
    }

    /// Current placement
    #[must_use]
    pub fn placement(&self) -> ChartPlacement {
        self.0.read().placement
    }

    /// Hide the chart and insert the sidebar at zero width, in one write
    ///
    /// # Errors
    /// [`LayoutError::AlreadyMinimized`] if the chart is already in the sidebar.
    pub fn minimize_to_sidebar(&self, thumbnail: Thumbnail, target_width: f64) -> Result<(), LayoutError> {
        let mut layout = self.0.write();
        validate_transition(layout.placement, ChartPlacement::MinimizedToSidebar)
            .map_err(|_| LayoutError::AlreadyMinimized)?;
        layout.placement = ChartPlacement::MinimizedToSidebar;
        layout.chart_visible = false;
        layout.sidebar = Some(SidebarPanel {
            width: 0.0,
            target_width,
            thumbnail,
            cards: Vec::new(),
        });
        Ok(())
    }

    /// Remove the sidebar and show the chart again
    ///
    /// # Errors
    /// [`LayoutError::NotMinimized`] if the chart is already inline.
    pub fn restore_inline(&self) -> Result<(), LayoutError> {
        let mut layout = self.0.write();
        validate_transition(layout.placement, ChartPlacement::Inline)
            .map_err(|_| LayoutError::NotMinimized)?;
        *layout = DashboardLayout::default();
        Ok(())
    }

    /// Set the animated sidebar width; ignored when no sidebar is open
    pub fn set_sidebar_width(&self, width: f64) {
        if let Some(sidebar) = self.0.write().sidebar.as_mut() {
            sidebar.width = width;
        }
    }

    /// Append a metric card to the sidebar
    ///
    /// # Errors
    /// [`LayoutError::NoSidebar`] if the sidebar is not open.
    pub fn push_card(&self, card: MetricCard) -> Result<usize, LayoutError> {
        let mut layout = self.0.write();
        let sidebar = layout.sidebar.as_mut().ok_or(LayoutError::NoSidebar)?;
        sidebar.cards.push(card);
        Ok(sidebar.cards.len())
    }

    /// Back to the inline default, whatever the current state
    pub fn reset(&self) {
        *self.0.write() = DashboardLayout::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thumb() -> Thumbnail {
        Thumbnail {
            markup: "<svg/>".to_string(),
            digest: "00".to_string(),
        }
    }

    #[test]
    fn test_minimize_and_restore() {
        let layout = LayoutHandle::new();
        layout.minimize_to_sidebar(thumb(), 320.0).unwrap();

        let state = layout.read();
        assert_eq!(state.placement, ChartPlacement::MinimizedToSidebar);
        assert!(!state.chart_visible);
        assert_eq!(state.sidebar.as_ref().map(|s| s.width), Some(0.0));

        assert_eq!(
            layout.minimize_to_sidebar(thumb(), 320.0),
            Err(LayoutError::AlreadyMinimized)
        );

        layout.restore_inline().unwrap();
        assert_eq!(layout.read(), DashboardLayout::default());
        assert_eq!(layout.restore_inline(), Err(LayoutError::NotMinimized));
    }

    #[test]
    fn test_cards_need_sidebar() {
        let layout = LayoutHandle::new();
        assert_eq!(
            layout.push_card(MetricCard::new("a", "b", "c")),
            Err(LayoutError::NoSidebar)
        );
        layout.minimize_to_sidebar(thumb(), 100.0).unwrap();
        assert_eq!(layout.push_card(MetricCard::new("a", "b", "c")), Ok(1));
    }

    #[test]
    fn test_clones_share_state() {
        let layout = LayoutHandle::new();
        let other = layout.clone();
        layout.minimize_to_sidebar(thumb(), 100.0).unwrap();
        other.set_sidebar_width(40.0);
        assert_eq!(layout.read().sidebar.map(|s| s.width), Some(40.0));
    }
}
