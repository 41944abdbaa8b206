//! Wall-clock driver
//!
//! The sequencer only knows virtual time. [`RealtimeDriver`] maps tokio time
//! onto it: every frame it advances the sequencer to the elapsed wall time
//! since the driver started. A `watch` channel carrying `true` stops the run.

use crate::host::ChartHost;
use crate::sequencer::Sequencer;
use ghost_kernel::clock::Millis;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// How a driven run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverOutcome {
    /// Nothing left to play
    Completed { at: Millis },
    /// Stop was signalled; the sequencer has been stopped
    Stopped { at: Millis },
}

/// Advances a [`Sequencer`] in real time
#[derive(Debug, Clone, Copy)]
pub struct RealtimeDriver {
    frame: Duration,
}

impl Default for RealtimeDriver {
    fn default() -> Self {
        Self::new(Duration::from_millis(16))
    }
}

impl RealtimeDriver {
    /// Driver that wakes once per `frame`
    #[must_use]
    pub fn new(frame: Duration) -> Self {
        Self {
            frame: frame.max(Duration::from_millis(1)),
        }
    }

    /// Frame interval
    #[must_use]
    pub fn frame(&self) -> Duration {
        self.frame
    }

    /// Play `sequencer` until it is idle or `stop` turns true.
    ///
    /// The sequencer should already be started. If the stop sender is
    /// dropped the run simply plays to the end.
    pub async fn run<H: ChartHost>(
        &self,
        sequencer: &mut Sequencer<H>,
        mut stop: watch::Receiver<bool>,
    ) -> DriverOutcome {
        let origin = Instant::now();
        let base = sequencer.now();
        let mut ticker = time::interval(self.frame);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut stop_open = true;

        loop {
            if *stop.borrow_and_update() {
                sequencer.stop();
                info!(at = %sequencer.now(), "Driver stopped");
                return DriverOutcome::Stopped { at: sequencer.now() };
            }

            let elapsed = u64::try_from(origin.elapsed().as_millis()).unwrap_or(u64::MAX);
            let dispatched = sequencer.advance_to(base + Millis(elapsed));
            if dispatched > 0 {
                debug!(dispatched, now = %sequencer.now(), "frame");
            }
            if sequencer.is_idle() {
                return DriverOutcome::Completed { at: sequencer.now() };
            }

            tokio::select! {
                _ = ticker.tick() => {}
                changed = stop.changed(), if stop_open => {
                    if changed.is_err() {
                        stop_open = false;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_frame_is_clamped() {
        assert_eq!(RealtimeDriver::new(Duration::ZERO).frame(), Duration::from_millis(1));
        assert_eq!(RealtimeDriver::default().frame(), Duration::from_millis(16));
    }
}
