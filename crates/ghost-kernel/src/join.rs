//! AND-join
//!
//! Waits for a fixed set of participants to each arrive exactly once.
//! `Complete` is reported to exactly one caller: the last participant.

use crate::error::JoinError;
use std::collections::BTreeSet;
use std::fmt::Debug;

/// Outcome of one arrival
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStatus {
    /// Others are still outstanding
    Waiting { remaining: usize },
    /// This arrival completed the join
    Complete,
}

/// AND-join over participants of type `K`
#[derive(Debug, Clone)]
pub struct AndJoin<K: Ord + Copy + Debug> {
    expected: BTreeSet<K>,
    arrived: BTreeSet<K>,
}

impl<K: Ord + Copy + Debug> AndJoin<K> {
    /// Join waiting on every participant in `participants`
    pub fn new(participants: impl IntoIterator<Item = K>) -> Self {
        Self {
            expected: participants.into_iter().collect(),
            arrived: BTreeSet::new(),
        }
    }

    /// Record that `participant` has finished
    ///
    /// # Errors
    /// - [`JoinError::UnknownParticipant`] if `participant` is not part of the join
    /// - [`JoinError::AlreadyArrived`] on a duplicate signal
    pub fn arrive(&mut self, participant: K) -> Result<JoinStatus, JoinError> {
        if !self.expected.contains(&participant) {
            return Err(JoinError::UnknownParticipant);
        }
        if !self.arrived.insert(participant) {
            return Err(JoinError::AlreadyArrived);
        }

        let remaining = self.expected.len() - self.arrived.len();
        if remaining == 0 {
            Ok(JoinStatus::Complete)
        } else {
            Ok(JoinStatus::Waiting { remaining })
        }
    }

    /// Whether every participant has arrived
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.arrived.len() == self.expected.len()
    }

    /// Whether `participant` has arrived
    #[must_use]
    pub fn has_arrived(&self, participant: K) -> bool {
        self.arrived.contains(&participant)
    }

    /// Forget all arrivals
    pub fn reset(&mut self) {
        self.arrived.clear();
    }
}
