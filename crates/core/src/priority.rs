//! Priority label vocabulary.
//!
//! A fixed, ordered table of five labels mapped to integer urgency levels;
//! higher is more urgent. Unknown labels are rejected at the boundary, never
//! coerced to a default.

use crate::error::{CoreError, CoreResult};

/// Lowest defined urgency level. Absence decay floors here.
pub const MIN_LEVEL: u8 = 1;
/// Highest defined urgency level. Escalation caps here.
pub const MAX_LEVEL: u8 = 5;

/// The five priority labels, lowest to highest urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PriorityLabel {
    /// Returning for a scheduled follow-up visit.
    FollowUp,
    /// Ordinary walk-in examination.
    Routine,
    /// Elevated clinical priority.
    Priority,
    /// Urgent, seen ahead of routine traffic.
    Urgent,
    /// Emergency, always first.
    Emergency,
}

impl PriorityLabel {
    pub const ALL: [PriorityLabel; 5] = [
        PriorityLabel::FollowUp,
        PriorityLabel::Routine,
        PriorityLabel::Priority,
        PriorityLabel::Urgent,
        PriorityLabel::Emergency,
    ];

    /// Maps a human label to its entry in the table.
    ///
    /// # Errors
    ///
    /// [`CoreError::UnknownPriority`] for anything outside the vocabulary.
    pub fn parse(label: &str) -> CoreResult<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "follow-up" => Ok(PriorityLabel::FollowUp),
            "routine" => Ok(PriorityLabel::Routine),
            "priority" => Ok(PriorityLabel::Priority),
            "urgent" => Ok(PriorityLabel::Urgent),
            "emergency" => Ok(PriorityLabel::Emergency),
            other => Err(CoreError::UnknownPriority(other.to_string())),
        }
    }

    /// Integer urgency level, `1..=5`.
    pub fn level(self) -> u8 {
        match self {
            PriorityLabel::FollowUp => 1,
            PriorityLabel::Routine => 2,
            PriorityLabel::Priority => 3,
            PriorityLabel::Urgent => 4,
            PriorityLabel::Emergency => 5,
        }
    }

    /// Reverse lookup from a numeric level, for display.
    pub fn from_level(level: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.level() == level)
    }

    /// Canonical label text.
    pub fn name(self) -> &'static str {
        match self {
            PriorityLabel::FollowUp => "follow-up",
            PriorityLabel::Routine => "routine",
            PriorityLabel::Priority => "priority",
            PriorityLabel::Urgent => "urgent",
            PriorityLabel::Emergency => "emergency",
        }
    }
}

impl std::fmt::Display for PriorityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
