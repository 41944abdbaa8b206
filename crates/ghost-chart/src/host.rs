//! Host seam
//!
//! The sequencer never queries a global document. Whatever embeds the chart
//! hands in a [`ChartHost`] at construction: it measures the container and
//! receives errors.

use crate::error::AnimationError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Container size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

impl Size {
    /// New size
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Finite and strictly positive on both axes
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// What the sequencer needs from its embedding
pub trait ChartHost {
    /// Current container size, or `None` if it is not laid out yet
    fn container_size(&self) -> Option<Size>;

    /// Receive an error that stopped or deferred a run
    fn report_error(&self, error: &AnimationError);
}

impl<T: ChartHost + ?Sized> ChartHost for Arc<T> {
    fn container_size(&self) -> Option<Size> {
        (**self).container_size()
    }

    fn report_error(&self, error: &AnimationError) {
        (**self).report_error(error);
    }
}

impl<T: ChartHost + ?Sized> ChartHost for Box<T> {
    fn container_size(&self) -> Option<Size> {
        (**self).container_size()
    }

    fn report_error(&self, error: &AnimationError) {
        (**self).report_error(error);
    }
}

/// Fixed-size host that logs errors through `tracing`
#[derive(Debug, Clone, Copy)]
pub struct StaticHost {
    size: Option<Size>,
}

impl StaticHost {
    /// Host with a laid-out container
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self { size: Some(size) }
    }

    /// Host whose container never lays out
    #[must_use]
    pub fn detached() -> Self {
        Self { size: None }
    }
}

impl ChartHost for StaticHost {
    fn container_size(&self) -> Option<Size> {
        self.size
    }

    fn report_error(&self, error: &AnimationError) {
        tracing::warn!("Animation error reported to host: {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_size() {
        assert!(Size::new(10.0, 10.0).is_usable());
        assert!(!Size::new(0.0, 10.0).is_usable());
        assert!(!Size::new(10.0, -1.0).is_usable());
        assert!(!Size::new(f64::NAN, 10.0).is_usable());
    }

    #[test]
    fn test_arc_host_delegates() {
        let host = Arc::new(StaticHost::new(Size::new(4.0, 3.0)));
        assert_eq!(host.container_size(), Some(Size::new(4.0, 3.0)));
        assert_eq!(StaticHost::detached().container_size(), None);
    }
}
