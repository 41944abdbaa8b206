//! Named phases of the ghost-chart script

use serde::{Deserialize, Serialize};
use std::fmt;

/// One discrete, time-boxed step of the script, in play order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for a measurable container
    ProbeContainer,
    /// Dot lattice coalescing into place
    SettleGrid,
    /// Both axes growing from the origin
    GrowAxes,
    /// Gridlines fading in after the axis join
    Gridlines,
    /// Cohort series drawn one at a time
    DrawSeries,
    /// Legend, badges, callout, overlay and ask button
    Annotations,
}

impl Phase {
    /// All phases in play order
    pub const ALL: [Phase; 6] = [
        Phase::ProbeContainer,
        Phase::SettleGrid,
        Phase::GrowAxes,
        Phase::Gridlines,
        Phase::DrawSeries,
        Phase::Annotations,
    ];

    /// Whether the phase re-measures the container
    #[must_use]
    pub fn measures_container(self) -> bool {
        matches!(self, Phase::ProbeContainer | Phase::SettleGrid | Phase::GrowAxes)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::ProbeContainer => "probe-container",
            Phase::SettleGrid => "settle-grid",
            Phase::GrowAxes => "grow-axes",
            Phase::Gridlines => "gridlines",
            Phase::DrawSeries => "draw-series",
            Phase::Annotations => "annotations",
        };
        f.write_str(name)
    }
}
