//! # mediq Core
//!
//! Business logic for the mediq clinic examination-queue system.
//!
//! This crate contains pure in-memory operations:
//! - Patient, doctor and clinic registries with natural-key deduplication
//! - One priority scheduling queue per clinic (max-heap, priority then
//!   earliest arrival)
//! - The queue-management protocol: registration, call-next, absence
//!   handling with priority decay and ejection, long-wait escalation,
//!   voluntary departure and mid-queue priority change
//!
//! **No I/O concerns**: persistence lives in `mediq-store`, interaction
//! surfaces in `mediq-cli`. The core exchanges a [`Snapshot`] with the
//! store and exposes the uniform [`Outcome`] triple to every caller.
//!
//! The design is single-writer: one logical actor mutates a
//! [`MedicalSystem`] at a time. Hosting it concurrently requires external
//! serialisation (see the crate-level docs on `MedicalSystem`).

pub mod config;
pub mod error;
pub mod ids;
pub mod models;
pub mod outcome;
pub mod priority;
pub mod queue;
pub mod registry;
pub mod system;

pub use config::SystemConfig;
pub use error::{CoreError, CoreResult};
pub use ids::{ClinicId, DoctorId, PatientId};
pub use models::{
    Clinic, Doctor, ExaminationDraft, ExaminationRecord, NewPatient, Patient, PatientQuery,
    PatientUpdate,
};
pub use outcome::{Outcome, Severity};
pub use priority::PriorityLabel;
pub use queue::{outranks, AbsenceOutcome, QueueEntry, SchedulingQueue};
pub use system::{MedicalSystem, Snapshot};
