//! # mediq Store
//!
//! Flat-file persistence for the mediq system: one CSV file per entity
//! (`patients.csv`, `doctors.csv`, `clinics.csv`) under a data directory.
//! The store exchanges a [`Snapshot`] with the core; it never touches
//! registries or queues directly. Queue contents are session state and are
//! not persisted.
//!
//! Multi-valued columns are flattened: examination history items join with
//! `|` and their fields with `;` (both separators are blanked out of free
//! text on write), membership id lists join with `,`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use mediq_core::{
    Clinic, ClinicId, Doctor, DoctorId, ExaminationRecord, Patient, PatientId, Snapshot,
};
use mediq_containers::Sequence;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Timestamp format for the `registered_at` column.
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Date format for birth dates and examination dates.
const DATE_FORMAT: &str = "%Y-%m-%d";

const ITEM_SEPARATOR: char = '|';
const FIELD_SEPARATOR: char = ';';

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv failure: {0}")]
    Csv(#[from] csv::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// CSV-backed store rooted at a data directory.
///
/// `load` tolerates missing files (an empty system) and skips rows it
/// cannot decode with a warning; `save` rewrites all three files in full.
pub struct CsvStore {
    dir: PathBuf,
}

impl CsvStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn patients_path(&self) -> PathBuf {
        self.dir.join("patients.csv")
    }

    fn doctors_path(&self) -> PathBuf {
        self.dir.join("doctors.csv")
    }

    fn clinics_path(&self) -> PathBuf {
        self.dir.join("clinics.csv")
    }

    /// Reads all three entity files into a snapshot.
    ///
    /// A missing file yields an empty entity set. A row that fails to
    /// decode is logged and skipped rather than failing the whole load.
    ///
    /// # Errors
    ///
    /// [`StoreError`] on i/o failures other than a missing file.
    pub fn load(&self) -> StoreResult<Snapshot> {
        Ok(Snapshot {
            patients: read_rows(&self.patients_path(), PatientRow::into_patient)?,
            doctors: read_rows(&self.doctors_path(), DoctorRow::into_doctor)?,
            clinics: read_rows(&self.clinics_path(), ClinicRow::into_clinic)?,
        })
    }

    /// Writes the snapshot out, replacing all three files.
    ///
    /// # Errors
    ///
    /// [`StoreError`] when the directory cannot be created or a file
    /// cannot be written.
    pub fn save(&self, snapshot: &Snapshot) -> StoreResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        write_rows(
            &self.patients_path(),
            snapshot.patients.iter().map(PatientRow::from_patient),
        )?;
        write_rows(
            &self.doctors_path(),
            snapshot.doctors.iter().map(DoctorRow::from_doctor),
        )?;
        write_rows(
            &self.clinics_path(),
            snapshot.clinics.iter().map(ClinicRow::from_clinic),
        )?;
        Ok(())
    }
}

fn read_rows<Row, Entity, F>(path: &Path, decode: F) -> StoreResult<Vec<Entity>>
where
    Row: for<'de> Deserialize<'de>,
    F: Fn(Row) -> Result<Entity, String>,
{
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(path)?;
    let mut entities = Vec::new();
    for (index, row) in reader.deserialize::<Row>().enumerate() {
        match row {
            Ok(row) => match decode(row) {
                Ok(entity) => entities.push(entity),
                Err(reason) => {
                    warn!(file = %path.display(), row = index + 1, reason, "skipping bad row");
                }
            },
            Err(err) => {
                warn!(file = %path.display(), row = index + 1, error = %err, "skipping bad row");
            }
        }
    }
    Ok(entities)
}

fn write_rows<Row: Serialize>(
    path: &Path,
    rows: impl Iterator<Item = Row>,
) -> StoreResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Blanks out the flattened-column separators from free text.
fn sanitize(text: &str) -> String {
    text.replace([ITEM_SEPARATOR, FIELD_SEPARATOR], " ")
}

fn encode_history<'a>(records: impl Iterator<Item = &'a ExaminationRecord>) -> String {
    records
        .map(|record| {
            [
                record.date.format(DATE_FORMAT).to_string(),
                sanitize(&record.exam_type),
                sanitize(&record.result),
                sanitize(&record.notes),
                record
                    .doctor_id
                    .as_ref()
                    .map(|id| id.as_str().to_string())
                    .unwrap_or_default(),
                record
                    .clinic_id
                    .as_ref()
                    .map(|id| id.as_str().to_string())
                    .unwrap_or_default(),
            ]
            .join(&FIELD_SEPARATOR.to_string())
        })
        .collect::<Vec<_>>()
        .join(&ITEM_SEPARATOR.to_string())
}

fn decode_history(column: &str) -> Result<Sequence<ExaminationRecord>, String> {
    let mut history = Sequence::new();
    if column.is_empty() {
        return Ok(history);
    }
    for item in column.split(ITEM_SEPARATOR) {
        let fields: Vec<&str> = item.split(FIELD_SEPARATOR).collect();
        if fields.len() != 6 {
            return Err(format!("examination item has {} fields", fields.len()));
        }
        let date = NaiveDate::parse_from_str(fields[0], DATE_FORMAT)
            .map_err(|_| format!("bad examination date '{}'", fields[0]))?;
        history.append(ExaminationRecord {
            date,
            exam_type: fields[1].to_string(),
            result: fields[2].to_string(),
            notes: fields[3].to_string(),
            doctor_id: (!fields[4].is_empty()).then(|| DoctorId::new(fields[4])),
            clinic_id: (!fields[5].is_empty()).then(|| ClinicId::new(fields[5])),
        });
    }
    Ok(history)
}

fn encode_id_list<'a>(ids: impl Iterator<Item = &'a str>) -> String {
    ids.collect::<Vec<_>>().join(",")
}

fn decode_id_list<T>(column: &str, make: impl Fn(&str) -> T) -> Sequence<T> {
    column
        .split(',')
        .filter(|part| !part.is_empty())
        .map(make)
        .collect()
}

#[derive(Debug, Serialize, Deserialize)]
struct PatientRow {
    id: String,
    full_name: String,
    date_of_birth: String,
    gender: String,
    address: String,
    phone: String,
    national_id: String,
    insurance_id: String,
    medical_history: String,
    drug_allergies: String,
    registered_at: String,
    examinations: String,
}

impl PatientRow {
    fn from_patient(patient: &Patient) -> Self {
        Self {
            id: patient.id.as_str().to_string(),
            full_name: patient.full_name.clone(),
            date_of_birth: patient
                .date_of_birth
                .map(|date| date.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            gender: patient.gender.clone(),
            address: patient.address.clone(),
            phone: patient.phone.clone(),
            national_id: patient.national_id.clone(),
            insurance_id: patient.insurance_id.clone(),
            medical_history: patient.medical_history.clone(),
            drug_allergies: patient.drug_allergies.clone(),
            registered_at: patient.registered_at.format(DATETIME_FORMAT).to_string(),
            examinations: encode_history(patient.examinations.iter()),
        }
    }

    fn into_patient(self) -> Result<Patient, String> {
        let date_of_birth = if self.date_of_birth.is_empty() {
            None
        } else {
            Some(
                NaiveDate::parse_from_str(&self.date_of_birth, DATE_FORMAT)
                    .map_err(|_| format!("bad birth date '{}'", self.date_of_birth))?,
            )
        };
        let registered_at = parse_datetime(&self.registered_at)?;
        Ok(Patient {
            id: PatientId::new(self.id),
            full_name: self.full_name,
            date_of_birth,
            gender: self.gender,
            address: self.address,
            phone: self.phone,
            national_id: self.national_id,
            insurance_id: self.insurance_id,
            medical_history: self.medical_history,
            drug_allergies: self.drug_allergies,
            registered_at,
            examinations: decode_history(&self.examinations)?,
        })
    }
}

fn parse_datetime(text: &str) -> Result<DateTime<Utc>, String> {
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| format!("bad timestamp '{text}'"))
}

#[derive(Debug, Serialize, Deserialize)]
struct DoctorRow {
    id: String,
    name: String,
    specialty: String,
    clinic_ids: String,
}

impl DoctorRow {
    fn from_doctor(doctor: &Doctor) -> Self {
        Self {
            id: doctor.id.as_str().to_string(),
            name: doctor.name.clone(),
            specialty: doctor.specialty.clone(),
            clinic_ids: encode_id_list(doctor.clinic_ids.iter().map(ClinicId::as_str)),
        }
    }

    fn into_doctor(self) -> Result<Doctor, String> {
        Ok(Doctor {
            id: DoctorId::new(self.id),
            name: self.name,
            specialty: self.specialty,
            clinic_ids: decode_id_list(&self.clinic_ids, |id| ClinicId::new(id)),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ClinicRow {
    id: String,
    name: String,
    specialty: String,
    doctor_ids: String,
}

impl ClinicRow {
    fn from_clinic(clinic: &Clinic) -> Self {
        Self {
            id: clinic.id.as_str().to_string(),
            name: clinic.name.clone(),
            specialty: clinic.specialty.clone(),
            doctor_ids: encode_id_list(clinic.doctor_ids.iter().map(DoctorId::as_str)),
        }
    }

    fn into_clinic(self) -> Result<Clinic, String> {
        Ok(Clinic {
            id: ClinicId::new(self.id),
            name: self.name,
            specialty: self.specialty,
            doctor_ids: decode_id_list(&self.doctor_ids, |id| DoctorId::new(id)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_patient() -> Patient {
        let mut examinations = Sequence::new();
        examinations.append(ExaminationRecord {
            date: NaiveDate::from_ymd_opt(2026, 8, 30).expect("valid date"),
            exam_type: "checkup".to_string(),
            result: "healthy; follow up | later".to_string(),
            notes: String::new(),
            doctor_id: Some(DoctorId::new("D001")),
            clinic_id: Some(ClinicId::new("C001")),
        });
        Patient {
            id: PatientId::new("P0001"),
            full_name: "Alice Smith".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 15),
            gender: "F".to_string(),
            address: "12 Elm St, Springfield".to_string(),
            phone: "0901234567".to_string(),
            national_id: "111222333".to_string(),
            insurance_id: "INS-9".to_string(),
            medical_history: "asthma".to_string(),
            drug_allergies: String::new(),
            registered_at: Utc
                .with_ymd_and_hms(2026, 8, 1, 9, 30, 0)
                .single()
                .expect("valid timestamp"),
            examinations,
        }
    }

    #[test]
    fn save_then_load_round_trips_every_entity() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = CsvStore::new(dir.path());

        let mut clinic_doctors = Sequence::new();
        clinic_doctors.append(DoctorId::new("D001"));
        let mut doctor_clinics = Sequence::new();
        doctor_clinics.append(ClinicId::new("C001"));

        let snapshot = Snapshot {
            patients: vec![sample_patient()],
            doctors: vec![Doctor {
                id: DoctorId::new("D001"),
                name: "Dr. House".to_string(),
                specialty: "diagnostics".to_string(),
                clinic_ids: doctor_clinics,
            }],
            clinics: vec![Clinic {
                id: ClinicId::new("C001"),
                name: "Cardiology".to_string(),
                specialty: "cardiology".to_string(),
                doctor_ids: clinic_doctors,
            }],
        };
        store.save(&snapshot).expect("save should succeed");

        let loaded = store.load().expect("load should succeed");
        assert_eq!(loaded.patients.len(), 1);
        let patient = &loaded.patients[0];
        assert_eq!(patient.id.as_str(), "P0001");
        assert_eq!(patient.registered_at, snapshot.patients[0].registered_at);
        assert_eq!(patient.examinations.len(), 1);
        let exam = patient.examinations.get(0).expect("one examination");
        // Separators in free text were blanked out on write.
        assert_eq!(exam.result, "healthy  follow up   later");
        assert_eq!(exam.doctor_id.as_ref().map(DoctorId::as_str), Some("D001"));

        assert_eq!(loaded.doctors.len(), 1);
        assert_eq!(
            loaded.doctors[0]
                .clinic_ids
                .iter()
                .map(ClinicId::as_str)
                .collect::<Vec<_>>(),
            vec!["C001"]
        );
        assert_eq!(loaded.clinics.len(), 1);
        assert_eq!(
            loaded.clinics[0]
                .doctor_ids
                .iter()
                .map(DoctorId::as_str)
                .collect::<Vec<_>>(),
            vec!["D001"]
        );
    }

    #[test]
    fn missing_files_load_as_an_empty_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = CsvStore::new(dir.path().join("never-written"));

        let loaded = store.load().expect("load should succeed");
        assert!(loaded.patients.is_empty());
        assert!(loaded.doctors.is_empty());
        assert!(loaded.clinics.is_empty());
    }

    #[test]
    fn bad_rows_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = CsvStore::new(dir.path());
        store
            .save(&Snapshot {
                patients: vec![sample_patient()],
                ..Default::default()
            })
            .expect("save should succeed");

        // Append a row with a mangled timestamp.
        let path = dir.path().join("patients.csv");
        let mut contents = std::fs::read_to_string(&path).expect("file should exist");
        contents.push_str("P0002,Bob,,M,,0909,999,,,,not-a-timestamp,\n");
        std::fs::write(&path, contents).expect("file should be writable");

        let loaded = store.load().expect("load should succeed");
        assert_eq!(loaded.patients.len(), 1);
        assert_eq!(loaded.patients[0].id.as_str(), "P0001");
    }

    #[test]
    fn empty_history_and_membership_columns_decode_to_empty() {
        assert!(decode_history("").expect("empty history decodes").is_empty());
        assert!(decode_id_list("", |id| ClinicId::new(id)).is_empty());
    }

    #[test]
    fn membership_columns_split_on_commas() {
        let ids = decode_id_list("C001,C002", |id| ClinicId::new(id));
        assert_eq!(
            ids.iter().map(ClinicId::as_str).collect::<Vec<_>>(),
            vec!["C001", "C002"]
        );
    }
}
