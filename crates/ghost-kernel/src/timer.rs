//! Cancelable timer queue
//!
//! Entries are ordered by `(due, sequence)`: two entries due at the same
//! instant fire in the order they were scheduled. This is what keeps a
//! zero-duration timeline in script order.

use crate::clock::Millis;
use crate::error::TimerError;
use crate::generation::Generation;
use std::collections::BTreeMap;

/// Opaque handle to one pending entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle {
    due: Millis,
    sequence: u64,
}

impl TimerHandle {
    /// When the entry is due
    #[inline]
    #[must_use]
    pub fn due(&self) -> Millis {
        self.due
    }
}

/// An entry popped from the queue
#[derive(Debug, Clone, PartialEq)]
pub struct Scheduled<T> {
    /// Handle the entry was scheduled under
    pub handle: TimerHandle,
    /// When it was due
    pub due: Millis,
    /// Generation current at scheduling time
    pub generation: Generation,
    /// What to run
    pub payload: T,
}

#[derive(Debug)]
struct Pending<T> {
    generation: Generation,
    payload: T,
}

/// Pending entries, owned exclusively by one sequencer
#[derive(Debug)]
pub struct TimerQueue<T> {
    pending: BTreeMap<TimerHandle, Pending<T>>,
    next_sequence: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            pending: BTreeMap::new(),
            next_sequence: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    /// Empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `payload` to fire at `due`
    pub fn schedule(&mut self, due: Millis, generation: Generation, payload: T) -> TimerHandle {
        let handle = TimerHandle {
            due,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.pending.insert(handle, Pending { generation, payload });
        handle
    }

    /// Cancel one entry
    ///
    /// # Errors
    /// Returns [`TimerError::NotPending`] if the entry already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> Result<T, TimerError> {
        self.pending
            .remove(&handle)
            .map(|p| p.payload)
            .ok_or(TimerError::NotPending)
    }

    /// Cancel every pending entry, returning how many were dropped
    pub fn drain(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Pop the earliest entry if it is due at or before `now`
    pub fn pop_due(&mut self, now: Millis) -> Option<Scheduled<T>> {
        let (&handle, _) = self.pending.first_key_value()?;
        if handle.due > now {
            return None;
        }
        let pending = self.pending.remove(&handle)?;
        Some(Scheduled {
            handle,
            due: handle.due,
            generation: pending.generation,
            payload: pending.payload,
        })
    }

    /// Due time of the earliest pending entry
    #[must_use]
    pub fn next_due(&self) -> Option<Millis> {
        self.pending.keys().next().map(|h| h.due)
    }

    /// Whether `handle` is still pending
    #[must_use]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.contains_key(&handle)
    }

    /// Number of pending entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pending payloads in firing order
    pub fn iter(&self) -> impl Iterator<Item = (TimerHandle, &T)> {
        self.pending.iter().map(|(h, p)| (*h, &p.payload))
    }

    /// Number of pending entries stamped with `generation`
    #[must_use]
    pub fn count_for(&self, generation: Generation) -> usize {
        self.pending
            .values()
            .filter(|p| p.generation == generation)
            .count()
    }
}
