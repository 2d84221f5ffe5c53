//! Queue entry and its rank comparator.

use chrono::{DateTime, Utc};

use crate::ids::PatientId;

/// A patient's position in one clinic's scheduling queue.
///
/// The entry is created on registration and mutated in place on priority
/// change and on absence; `registered_at` never changes once set, so
/// seniority survives requeues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub patient_id: PatientId,
    /// Small positive integer, higher is more urgent.
    pub priority_level: u8,
    /// Arrival instant; the FIFO tie-breaker within a priority level.
    pub registered_at: DateTime<Utc>,
    /// Times this patient was called and did not show up.
    pub absences: u8,
}

impl QueueEntry {
    pub fn new(patient_id: PatientId, priority_level: u8, registered_at: DateTime<Utc>) -> Self {
        Self {
            patient_id,
            priority_level,
            registered_at,
            absences: 0,
        }
    }
}

/// The composite strict order consumed by the heap.
///
/// `a` outranks `b` iff `a` has the higher priority level, or the levels
/// are equal and `a` arrived earlier. Entries with identical level and
/// identical arrival instant have no defined order.
///
/// Kept as an explicit comparator function rather than an `Ord` impl on
/// the entry: this ranking is a scheduling concern, not a natural order of
/// the entity.
pub fn outranks(a: &QueueEntry, b: &QueueEntry) -> bool {
    if a.priority_level != b.priority_level {
        a.priority_level > b.priority_level
    } else {
        a.registered_at < b.registered_at
    }
}
