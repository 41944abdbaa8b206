//! Ghost Kernel - timeline primitives
//!
//! The kernel knows nothing about charts. It provides the pieces every
//! scripted animation needs to be deterministic and cancelable:
//!
//! 1. **Virtual clock**: time only moves when the driver says so
//! 2. **Timer queue**: cancelable entries ordered by `(due, sequence)`
//! 3. **Generations**: an epoch stamped on every entry; stale entries are no-ops
//! 4. **AND-join**: waits for several independent completions, once each
//! 5. **Lifecycle state machines**: validated transitions for runs and annotations
//!
//! # Quick Start
//!
//! ```rust
//! use ghost_kernel::prelude::*;
//!
//! let mut generations = GenerationCounter::new();
//! let mut queue: TimerQueue<&str> = TimerQueue::new();
//!
//! let generation = generations.bump();
//! queue.schedule(Millis(10), generation, "draw axes");
//!
//! let entry = queue.pop_due(Millis(10)).unwrap();
//! assert!(generations.is_current(entry.generation));
//! ```

#![warn(missing_docs)]

pub mod clock;
pub mod error;
pub mod generation;
pub mod join;
pub mod state_machine;
pub mod timer;
pub mod types;

pub use error::*;
pub use types::*;

/// Re-export of the types most callers need
pub mod prelude {
    pub use crate::clock::{Millis, VirtualClock};
    pub use crate::error::{JoinError, KernelError, StateMachineError, TimerError};
    pub use crate::generation::{Generation, GenerationCounter};
    pub use crate::join::{AndJoin, JoinStatus};
    pub use crate::state_machine::{allowed_transitions, validate_transition, Lifecycle};
    pub use crate::timer::{Scheduled, TimerHandle, TimerQueue};
    pub use crate::types::{AnnotationState, RunState};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
