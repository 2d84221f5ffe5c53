//! Doctor record registry.

use mediq_containers::{ChainMap, Sequence};

use crate::error::{CoreError, CoreResult};
use crate::ids::DoctorId;
use crate::models::Doctor;

pub struct DoctorRegistry {
    records: ChainMap<DoctorId, Doctor>,
    next_id: u32,
}

impl DoctorRegistry {
    pub fn new(bucket_count: usize) -> Self {
        Self {
            records: ChainMap::new(bucket_count),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &DoctorId) -> Option<&Doctor> {
        self.records.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &DoctorId) -> Option<&mut Doctor> {
        self.records.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Doctor> {
        self.records.values()
    }

    /// Creates a doctor record with an empty clinic membership list.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidInput`] when the name is empty.
    pub fn create(&mut self, name: &str, specialty: &str) -> CoreResult<Doctor> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::InvalidInput("doctor name is required".to_string()));
        }
        let id = DoctorId::new(format!("D{:03}", self.next_id));
        self.next_id += 1;
        let doctor = Doctor {
            id: id.clone(),
            name: name.to_string(),
            specialty: specialty.trim().to_string(),
            clinic_ids: Sequence::new(),
        };
        self.records.put(id, doctor.clone());
        Ok(doctor)
    }

    /// Renames or re-specialises a doctor, returning whether anything changed.
    ///
    /// # Errors
    ///
    /// [`CoreError::DoctorNotFound`].
    pub fn update(
        &mut self,
        id: &DoctorId,
        name: Option<&str>,
        specialty: Option<&str>,
    ) -> CoreResult<bool> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| CoreError::DoctorNotFound(id.clone()))?;
        let mut changed = false;
        if let Some(name) = name {
            let name = name.trim();
            if !name.is_empty() && record.name != name {
                record.name = name.to_string();
                changed = true;
            }
        }
        if let Some(specialty) = specialty {
            let specialty = specialty.trim();
            if record.specialty != specialty {
                record.specialty = specialty.to_string();
                changed = true;
            }
        }
        Ok(changed)
    }

    /// Removes a doctor record, returning it so the caller can unlink the
    /// clinics it still references.
    ///
    /// # Errors
    ///
    /// [`CoreError::DoctorNotFound`].
    pub fn remove(&mut self, id: &DoctorId) -> CoreResult<Doctor> {
        self.records
            .remove(id)
            .ok_or_else(|| CoreError::DoctorNotFound(id.clone()))
    }

    /// Inserts a record loaded from the store and resynchronises the id
    /// counter past the loaded id.
    pub(crate) fn insert_loaded(&mut self, doctor: Doctor) {
        if let Some(numeric) = doctor
            .id
            .as_str()
            .strip_prefix('D')
            .and_then(|digits| digits.parse::<u32>().ok())
        {
            self.next_id = self.next_id.max(numeric + 1);
        }
        self.records.put(doctor.id.clone(), doctor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_assigns_sequential_ids() {
        let mut registry = DoctorRegistry::new(50);
        let first = registry
            .create("Dr. House", "diagnostics")
            .expect("create should succeed");
        let second = registry
            .create("Dr. Wilson", "oncology")
            .expect("create should succeed");

        assert_eq!(first.id.as_str(), "D001");
        assert_eq!(second.id.as_str(), "D002");
        assert!(first.clinic_ids.is_empty());
    }

    #[test]
    fn create_rejects_blank_name() {
        let mut registry = DoctorRegistry::new(50);
        let err = registry
            .create("   ", "cardiology")
            .expect_err("blank name should fail");
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn update_reports_whether_anything_changed() {
        let mut registry = DoctorRegistry::new(50);
        let doctor = registry
            .create("Dr. House", "diagnostics")
            .expect("create should succeed");

        let changed = registry
            .update(&doctor.id, None, Some("nephrology"))
            .expect("update should succeed");
        assert!(changed);

        let changed = registry
            .update(&doctor.id, None, Some("nephrology"))
            .expect("update should succeed");
        assert!(!changed);
    }

    #[test]
    fn loaded_records_resync_the_id_counter() {
        let mut registry = DoctorRegistry::new(50);
        registry.insert_loaded(Doctor {
            id: DoctorId::new("D007"),
            name: "Dr. Bond".to_string(),
            specialty: "trauma".to_string(),
            clinic_ids: Sequence::new(),
        });

        let next = registry
            .create("Dr. After", "general")
            .expect("create should succeed");
        assert_eq!(next.id.as_str(), "D008");
    }
}
