//! Clinic record registry.

use mediq_containers::{ChainMap, Sequence};

use crate::error::{CoreError, CoreResult};
use crate::ids::ClinicId;
use crate::models::Clinic;

pub struct ClinicRegistry {
    records: ChainMap<ClinicId, Clinic>,
    next_id: u32,
}

impl ClinicRegistry {
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

    pub fn get(&self, id: &ClinicId) -> Option<&Clinic> {
        self.records.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &ClinicId) -> Option<&mut Clinic> {
        self.records.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clinic> {
        self.records.values()
    }

    /// Creates a clinic record with an empty staffing list.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidInput`] when the name is empty.
    pub fn create(&mut self, name: &str, specialty: &str) -> CoreResult<Clinic> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::InvalidInput("clinic name is required".to_string()));
        }
        let id = ClinicId::new(format!("C{:03}", self.next_id));
        self.next_id += 1;
        let clinic = Clinic {
            id: id.clone(),
            name: name.to_string(),
            specialty: specialty.trim().to_string(),
            doctor_ids: Sequence::new(),
        };
        self.records.put(id, clinic.clone());
        Ok(clinic)
    }

    /// Renames or re-specialises a clinic, returning whether anything changed.
    ///
    /// # Errors
    ///
    /// [`CoreError::ClinicNotFound`].
    pub fn update(
        &mut self,
        id: &ClinicId,
        name: Option<&str>,
        specialty: Option<&str>,
    ) -> CoreResult<bool> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| CoreError::ClinicNotFound(id.clone()))?;
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

    /// Removes a clinic record, returning it so the caller can unlink the
    /// doctors it still references.
    ///
    /// # Errors
    ///
    /// [`CoreError::ClinicNotFound`].
    pub fn remove(&mut self, id: &ClinicId) -> CoreResult<Clinic> {
        self.records
            .remove(id)
            .ok_or_else(|| CoreError::ClinicNotFound(id.clone()))
    }

    /// Inserts a record loaded from the store and resynchronises the id
    /// counter past the loaded id.
    pub(crate) fn insert_loaded(&mut self, clinic: Clinic) {
        if let Some(numeric) = clinic
            .id
            .as_str()
            .strip_prefix('C')
            .and_then(|digits| digits.parse::<u32>().ok())
        {
            self.next_id = self.next_id.max(numeric + 1);
        }
        self.records.put(clinic.id.clone(), clinic);
    }
}
