//! Domain entities: patients, doctors, clinics.
//!
//! The clinic↔doctor relationship is a pair of non-owning foreign-id
//! lists, one per side, reconciled only by the assign/unassign routines on
//! the system — never a mutually-owning link.

use chrono::{DateTime, NaiveDate, Utc};
use mediq_containers::Sequence;

use crate::error::{CoreError, CoreResult};
use crate::ids::{ClinicId, DoctorId, PatientId};

/// Date format used everywhere a date crosses the boundary as text.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `YYYY-MM-DD` date string.
///
/// # Errors
///
/// [`CoreError::InvalidInput`] for malformed dates.
pub fn parse_date(input: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| CoreError::InvalidInput(format!("date '{}' is not YYYY-MM-DD", input.trim())))
}

/// One entry in a patient's permanent examination history.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExaminationRecord {
    pub date: NaiveDate,
    pub exam_type: String,
    pub result: String,
    pub notes: String,
    pub doctor_id: Option<DoctorId>,
    pub clinic_id: Option<ClinicId>,
}

/// Fields of an examination being recorded on completion.
///
/// The examination date is stamped by the system when the record is
/// appended.
#[derive(Debug, Clone, Default)]
pub struct ExaminationDraft {
    pub exam_type: String,
    pub result: String,
    pub notes: String,
    pub doctor_id: Option<DoctorId>,
    pub clinic_id: Option<ClinicId>,
}

/// A patient record.
///
/// `phone` and `national_id` are globally unique natural keys, enforced by
/// the patient registry's trie indexes. The examination history is
/// append-only.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: String,
    pub address: String,
    pub phone: String,
    pub national_id: String,
    pub insurance_id: String,
    pub medical_history: String,
    pub drug_allergies: String,
    /// When the record entered the system, not when the patient queued.
    pub registered_at: DateTime<Utc>,
    pub examinations: Sequence<ExaminationRecord>,
}

impl Patient {
    /// Appends one examination to the permanent history.
    pub fn add_examination(&mut self, record: ExaminationRecord) {
        self.examinations.append(record);
    }
}

/// Input for creating a patient record.
///
/// `full_name`, `date_of_birth`, `gender`, `phone` and `national_id` are
/// required; the rest default to empty.
#[derive(Debug, Clone, Default)]
pub struct NewPatient {
    pub full_name: String,
    /// `YYYY-MM-DD`; validated by the registry.
    pub date_of_birth: String,
    pub gender: String,
    pub address: String,
    pub phone: String,
    pub national_id: String,
    pub insurance_id: String,
    pub medical_history: String,
    pub drug_allergies: String,
}

/// Partial update of a patient record.
///
/// Each field is an explicit no-change sentinel: `None` leaves the stored
/// value alone, `Some(new)` replaces it. The birth date is doubly wrapped
/// so `Some(None)` can clear it.
#[derive(Debug, Clone, Default)]
pub struct PatientUpdate {
    pub full_name: Option<String>,
    pub date_of_birth: Option<Option<NaiveDate>>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    pub insurance_id: Option<String>,
    pub medical_history: Option<String>,
    pub drug_allergies: Option<String>,
}

impl PatientUpdate {
    /// Whether the update carries any change at all.
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.date_of_birth.is_none()
            && self.gender.is_none()
            && self.address.is_none()
            && self.phone.is_none()
            && self.national_id.is_none()
            && self.insurance_id.is_none()
            && self.medical_history.is_none()
            && self.drug_allergies.is_none()
    }
}

/// Search criteria for patients.
///
/// An exact phone or national id short-circuits through the trie indexes;
/// otherwise the remaining criteria are matched by containment over all
/// records.
#[derive(Debug, Clone, Default)]
pub struct PatientQuery {
    pub phone_exact: Option<String>,
    pub national_id_exact: Option<String>,
    pub name_contains: Option<String>,
    pub phone_contains: Option<String>,
    pub national_id_contains: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

/// A doctor record.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Doctor {
    pub id: DoctorId,
    pub name: String,
    pub specialty: String,
    /// Clinics this doctor works at. Foreign ids only.
    pub clinic_ids: Sequence<ClinicId>,
}

/// A clinic record.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Clinic {
    pub id: ClinicId,
    pub name: String,
    pub specialty: String,
    /// Doctors staffing this clinic. Foreign ids only.
    pub doctor_ids: Sequence<DoctorId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso_and_rejects_garbage() {
        let date = parse_date(" 1990-01-15 ").expect("valid date should parse");
        assert_eq!(date.to_string(), "1990-01-15");

        let err = parse_date("15/01/1990").expect_err("slashed date should fail");
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(PatientUpdate::default().is_empty());

        let update = PatientUpdate {
            phone: Some("0900000000".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn examination_history_is_append_only_in_order() {
        let mut patient = Patient {
            id: PatientId::new("P0001"),
            full_name: "Test".to_string(),
            date_of_birth: None,
            gender: String::new(),
            address: String::new(),
            phone: String::new(),
            national_id: String::new(),
            insurance_id: String::new(),
            medical_history: String::new(),
            drug_allergies: String::new(),
            registered_at: Utc::now(),
            examinations: Sequence::new(),
        };

        for exam_type in ["checkup", "x-ray"] {
            patient.add_examination(ExaminationRecord {
                date: parse_date("2026-08-30").expect("valid date"),
                exam_type: exam_type.to_string(),
                result: "ok".to_string(),
                notes: String::new(),
                doctor_id: None,
                clinic_id: None,
            });
        }

        let types: Vec<&str> = patient
            .examinations
            .iter()
            .map(|r| r.exam_type.as_str())
            .collect();
        assert_eq!(types, vec!["checkup", "x-ray"]);
    }
}
