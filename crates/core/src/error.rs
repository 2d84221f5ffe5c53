//! Core error taxonomy.
//!
//! Every failure here is ordinary, caller-recoverable misuse — nothing in
//! this crate terminates the process. Internal layers return these through
//! `Result` and `?`; the orchestration boundary converts them into the
//! uniform [`Outcome`](crate::outcome::Outcome) triple.

use crate::ids::{ClinicId, DoctorId, PatientId};
use crate::outcome::Severity;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("patient {0} not found")]
    PatientNotFound(PatientId),
    #[error("doctor {0} not found")]
    DoctorNotFound(DoctorId),
    #[error("clinic {0} not found")]
    ClinicNotFound(ClinicId),
    #[error("no queue exists for clinic {0}")]
    QueueNotFound(ClinicId),
    #[error("{field} '{value}' already belongs to patient {owner}")]
    DuplicateNaturalKey {
        field: &'static str,
        value: String,
        owner: PatientId,
    },
    #[error("patient {patient} is already queued at clinic {clinic}")]
    AlreadyQueued {
        patient: PatientId,
        clinic: ClinicId,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unknown priority label '{0}'")]
    UnknownPriority(String),
    #[error(transparent)]
    Container(#[from] mediq_containers::ContainerError),
}

impl CoreError {
    /// Severity carried by the boundary outcome for this error.
    ///
    /// Double registration is a warning (the original request already
    /// succeeded once); everything else is an error.
    pub fn severity(&self) -> Severity {
        match self {
            CoreError::AlreadyQueued { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
