//! Entity registries.
//!
//! Each registry owns one chained hash table of records plus the id
//! counter for its entity kind; the counter is advanced together with the
//! insert it numbers, never as ambient global state. The patient registry
//! additionally owns the two natural-key trie indexes and keeps them
//! consistent with the stored records through every create, update and
//! delete.

mod clinics;
mod doctors;
mod patients;

pub use clinics::ClinicRegistry;
pub use doctors::DoctorRegistry;
pub use patients::PatientRegistry;
