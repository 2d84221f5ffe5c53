//! Per-clinic scheduling queue.
//!
//! [`SchedulingQueue`] orders [`QueueEntry`] values by the composite rank
//! in [`outranks`]: higher priority level first, earlier arrival breaking
//! ties. One instance exists per clinic; the orchestration layer in
//! [`crate::system`] is its only caller.

mod entry;
mod scheduling;

pub use entry::{outranks, QueueEntry};
pub use scheduling::SchedulingQueue;

/// What happened to a called patient who did not show up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbsenceOutcome {
    /// Third strike: the entry is permanently discarded.
    Ejected,
    /// Reinserted into the same queue, one level lower (floored at the
    /// minimum), original arrival time preserved.
    Requeued { new_level: u8 },
}
