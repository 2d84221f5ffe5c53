//! Binary max-heap over a [`Sequence`], one per clinic.
//!
//! The heap has no key index: per-patient operations are O(n) linear
//! scans, accepted at clinic-queue scale. The heap property — every parent
//! outranks (or ties with) its children — is restored after every
//! mutation.

use chrono::{DateTime, TimeDelta, Utc};
use mediq_containers::Sequence;

use crate::ids::PatientId;
use crate::queue::entry::{outranks, QueueEntry};

/// Priority scheduling queue for one clinic.
#[derive(Debug, Default)]
pub struct SchedulingQueue {
    entries: Sequence<QueueEntry>,
}

impl SchedulingQueue {
    pub fn new() -> Self {
        Self {
            entries: Sequence::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `patient_id` currently has an entry in this queue.
    pub fn contains(&self, patient_id: &PatientId) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.patient_id == *patient_id)
    }

    /// Iterates over the entries in heap order (not rank order).
    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }

    fn entry_outranks(&self, a: usize, b: usize) -> bool {
        match (self.entries.get(a), self.entries.get(b)) {
            (Some(x), Some(y)) => outranks(x, y),
            _ => false,
        }
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if !self.entry_outranks(index, parent) {
                break;
            }
            if self.entries.swap(index, parent).is_err() {
                break;
            }
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.entries.len();
        loop {
            let mut top = index;
            let left = 2 * index + 1;
            let right = 2 * index + 2;
            if left < len && self.entry_outranks(left, top) {
                top = left;
            }
            if right < len && self.entry_outranks(right, top) {
                top = right;
            }
            if top == index {
                break;
            }
            if self.entries.swap(index, top).is_err() {
                break;
            }
            index = top;
        }
    }

    /// Adds an entry: append, then sift up from the new slot.
    pub fn add(&mut self, entry: QueueEntry) {
        self.entries.append(entry);
        self.sift_up(self.entries.len() - 1);
    }

    /// O(1) read of the top-ranked entry without removal.
    pub fn peek_top(&self) -> Option<&QueueEntry> {
        self.entries.get(0)
    }

    /// Removes and returns the top-ranked entry.
    pub fn pop_top(&mut self) -> Option<QueueEntry> {
        let last = self.entries.pop_last().ok()?;
        if self.entries.is_empty() {
            return Some(last);
        }
        let top = self.entries.replace(0, last).ok()?;
        self.sift_down(0);
        Some(top)
    }

    /// Sets a new priority level on the entry for `patient_id`, re-sifting
    /// in the direction the rank moved. Returns whether the patient was
    /// found.
    pub fn update_priority(&mut self, patient_id: &PatientId, new_level: u8) -> bool {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.patient_id == *patient_id);
        let Some(index) = position else {
            return false;
        };
        let Some(entry) = self.entries.get_mut(index) else {
            return false;
        };
        let old_level = entry.priority_level;
        entry.priority_level = new_level;
        if new_level > old_level {
            self.sift_up(index);
        } else {
            self.sift_down(index);
        }
        true
    }

    /// Raises the level of every entry that has waited longer than
    /// `threshold` as of `now`, by `step` capped at `max_level`. Returns
    /// the number of entries changed.
    ///
    /// One scan records the touched indices; they are then re-sifted up in
    /// descending index order, so fixing a deep slot cannot move a
    /// not-yet-processed shallower slot out from under the pass.
    pub fn escalate_long_waiters(
        &mut self,
        now: DateTime<Utc>,
        threshold: TimeDelta,
        step: u8,
        max_level: u8,
    ) -> usize {
        let mut touched = Vec::new();
        for index in 0..self.entries.len() {
            let Some(entry) = self.entries.get_mut(index) else {
                continue;
            };
            if now - entry.registered_at > threshold && entry.priority_level < max_level {
                entry.priority_level = entry.priority_level.saturating_add(step).min(max_level);
                touched.push(index);
            }
        }
        for &index in touched.iter().rev() {
            self.sift_up(index);
        }
        touched.len()
    }

    /// Removes the entry for `patient_id`, if any.
    ///
    /// The heap supports no positional delete, so the entries are drained
    /// and the survivors re-added. Returns whether a removal occurred.
    pub fn remove_by_key(&mut self, patient_id: &PatientId) -> bool {
        if !self.contains(patient_id) {
            return false;
        }
        let drained = std::mem::take(&mut self.entries);
        let mut removed = false;
        for entry in drained {
            if entry.patient_id == *patient_id {
                removed = true;
            } else {
                self.add(entry);
            }
        }
        removed
    }

    /// Entries in rank order, top first, without disturbing the heap.
    pub fn ranked_snapshot(&self) -> Vec<QueueEntry> {
        let mut snapshot: Vec<QueueEntry> = self.entries.iter().cloned().collect();
        snapshot.sort_by(|a, b| {
            if outranks(a, b) {
                std::cmp::Ordering::Less
            } else if outranks(b, a) {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        });
        snapshot
    }
}
