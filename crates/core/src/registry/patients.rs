//! Patient record registry.
//!
//! Owns the patient hash table, the id counter, and the two exact-match
//! trie indexes over the natural keys (phone number, national id). A
//! natural key maps to at most one patient; both indexes are checked
//! before any record commit and rewritten whenever a stored key changes,
//! so records and indexes can never drift apart under the single-writer
//! model.

use chrono::Utc;
use mediq_containers::{ChainMap, Sequence, Trie};

use crate::error::{CoreError, CoreResult};
use crate::ids::PatientId;
use crate::models::{parse_date, NewPatient, Patient, PatientQuery, PatientUpdate};

pub struct PatientRegistry {
    records: ChainMap<PatientId, Patient>,
    phone_index: Trie<PatientId>,
    national_id_index: Trie<PatientId>,
    next_id: u32,
}

impl PatientRegistry {
    pub fn new(bucket_count: usize) -> Self {
        Self {
            records: ChainMap::new(bucket_count),
            phone_index: Trie::new(),
            national_id_index: Trie::new(),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &PatientId) -> Option<&Patient> {
        self.records.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &PatientId) -> Option<&mut Patient> {
        self.records.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Patient> {
        self.records.values()
    }

    /// Resolves a phone number to its owning patient, exact match only.
    pub fn find_by_phone(&self, phone: &str) -> Option<&Patient> {
        let id = self.phone_index.search(phone.trim())?;
        self.records.get(id)
    }

    /// Resolves a national id to its owning patient, exact match only.
    pub fn find_by_national_id(&self, national_id: &str) -> Option<&Patient> {
        let id = self.national_id_index.search(national_id.trim())?;
        self.records.get(id)
    }

    /// Allocates the next patient id together with the insert it numbers.
    fn allocate_id(&mut self) -> PatientId {
        let id = PatientId::new(format!("P{:04}", self.next_id));
        self.next_id += 1;
        id
    }

    fn check_phone_free(&self, phone: &str, exclude: Option<&PatientId>) -> CoreResult<()> {
        if let Some(owner) = self.phone_index.search(phone) {
            if exclude != Some(owner) {
                return Err(CoreError::DuplicateNaturalKey {
                    field: "phone number",
                    value: phone.to_string(),
                    owner: owner.clone(),
                });
            }
        }
        Ok(())
    }

    fn check_national_id_free(
        &self,
        national_id: &str,
        exclude: Option<&PatientId>,
    ) -> CoreResult<()> {
        if let Some(owner) = self.national_id_index.search(national_id) {
            if exclude != Some(owner) {
                return Err(CoreError::DuplicateNaturalKey {
                    field: "national id",
                    value: national_id.to_string(),
                    owner: owner.clone(),
                });
            }
        }
        Ok(())
    }

    /// Creates a patient record.
    ///
    /// Required fields must be non-empty and the birth date well-formed;
    /// both natural keys are checked for uniqueness before anything is
    /// committed, so a rejected create leaves no trace.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidInput`] for missing fields or a malformed date,
    /// [`CoreError::DuplicateNaturalKey`] when a key belongs to someone
    /// else.
    pub fn create(&mut self, draft: NewPatient) -> CoreResult<Patient> {
        let required = [
            ("full name", draft.full_name.trim()),
            ("date of birth", draft.date_of_birth.trim()),
            ("gender", draft.gender.trim()),
            ("phone number", draft.phone.trim()),
            ("national id", draft.national_id.trim()),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(CoreError::InvalidInput(format!("{field} is required")));
            }
        }
        let date_of_birth = parse_date(&draft.date_of_birth)?;

        let phone = draft.phone.trim().to_string();
        let national_id = draft.national_id.trim().to_string();
        self.check_national_id_free(&national_id, None)?;
        self.check_phone_free(&phone, None)?;

        let id = self.allocate_id();
        let patient = Patient {
            id: id.clone(),
            full_name: draft.full_name.trim().to_string(),
            date_of_birth: Some(date_of_birth),
            gender: draft.gender.trim().to_string(),
            address: draft.address,
            phone: phone.clone(),
            national_id: national_id.clone(),
            insurance_id: draft.insurance_id,
            medical_history: draft.medical_history,
            drug_allergies: draft.drug_allergies,
            registered_at: Utc::now(),
            examinations: Sequence::new(),
        };
        self.records.put(id.clone(), patient.clone());
        self.phone_index.insert(&phone, id.clone());
        self.national_id_index.insert(&national_id, id);
        Ok(patient)
    }

    /// Applies a partial update, returning whether anything changed.
    ///
    /// Natural-key changes are checked against the indexes first (a key
    /// may stay with its current owner) and the indexes rewritten after
    /// the record mutates.
    ///
    /// # Errors
    ///
    /// [`CoreError::PatientNotFound`], [`CoreError::InvalidInput`] (empty
    /// replacement national id), [`CoreError::DuplicateNaturalKey`].
    pub fn update(&mut self, id: &PatientId, update: PatientUpdate) -> CoreResult<bool> {
        let current = self
            .records
            .get(id)
            .ok_or_else(|| CoreError::PatientNotFound(id.clone()))?;
        let old_phone = current.phone.clone();
        let old_national_id = current.national_id.clone();

        let new_national_id = match update.national_id.as_deref() {
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(CoreError::InvalidInput(
                        "national id cannot be cleared".to_string(),
                    ));
                }
                Some(trimmed.to_string())
            }
            None => None,
        };
        let new_phone = update
            .phone
            .as_deref()
            .map(|raw| raw.trim().to_string());

        if let Some(national_id) = new_national_id.as_deref() {
            if national_id != old_national_id {
                self.check_national_id_free(national_id, Some(id))?;
            }
        }
        if let Some(phone) = new_phone.as_deref() {
            if !phone.is_empty() && phone != old_phone {
                self.check_phone_free(phone, Some(id))?;
            }
        }

        let Some(record) = self.records.get_mut(id) else {
            return Err(CoreError::PatientNotFound(id.clone()));
        };
        let mut changed = false;
        let mut apply = |target: &mut String, source: Option<String>| {
            if let Some(value) = source {
                if *target != value {
                    *target = value;
                    changed = true;
                }
            }
        };
        apply(&mut record.full_name, update.full_name);
        apply(&mut record.gender, update.gender);
        apply(&mut record.address, update.address);
        apply(&mut record.phone, new_phone);
        apply(&mut record.national_id, new_national_id);
        apply(&mut record.insurance_id, update.insurance_id);
        apply(&mut record.medical_history, update.medical_history);
        apply(&mut record.drug_allergies, update.drug_allergies);
        drop(apply);
        if let Some(date_of_birth) = update.date_of_birth {
            if record.date_of_birth != date_of_birth {
                record.date_of_birth = date_of_birth;
                changed = true;
            }
        }
        let phone_now = record.phone.clone();
        let national_id_now = record.national_id.clone();

        if phone_now != old_phone {
            if !old_phone.is_empty() {
                self.phone_index.remove(&old_phone);
            }
            if !phone_now.is_empty() {
                self.phone_index.insert(&phone_now, id.clone());
            }
        }
        if national_id_now != old_national_id {
            if !old_national_id.is_empty() {
                self.national_id_index.remove(&old_national_id);
            }
            if !national_id_now.is_empty() {
                self.national_id_index.insert(&national_id_now, id.clone());
            }
        }
        Ok(changed)
    }

    /// Removes a patient record and both of its natural-key index entries.
    ///
    /// # Errors
    ///
    /// [`CoreError::PatientNotFound`].
    pub fn remove(&mut self, id: &PatientId) -> CoreResult<Patient> {
        let patient = self
            .records
            .remove(id)
            .ok_or_else(|| CoreError::PatientNotFound(id.clone()))?;
        if !patient.phone.is_empty() {
            self.phone_index.remove(&patient.phone);
        }
        if !patient.national_id.is_empty() {
            self.national_id_index.remove(&patient.national_id);
        }
        Ok(patient)
    }

    /// Multi-criteria search.
    ///
    /// An exact phone or national id wins outright through the trie (at
    /// most one hit); otherwise every record is matched against the
    /// containment criteria.
    pub fn search(&self, query: &PatientQuery) -> Vec<&Patient> {
        if let Some(phone) = query.phone_exact.as_deref() {
            return self.find_by_phone(phone).into_iter().collect();
        }
        if let Some(national_id) = query.national_id_exact.as_deref() {
            return self.find_by_national_id(national_id).into_iter().collect();
        }

        self.records
            .values()
            .filter(|patient| {
                let name_ok = query.name_contains.as_deref().is_none_or(|needle| {
                    patient
                        .full_name
                        .to_lowercase()
                        .contains(&needle.to_lowercase())
                });
                let phone_ok = query
                    .phone_contains
                    .as_deref()
                    .is_none_or(|needle| patient.phone.contains(needle));
                let national_id_ok = query.national_id_contains.as_deref().is_none_or(|needle| {
                    patient
                        .national_id
                        .to_lowercase()
                        .contains(&needle.to_lowercase())
                });
                let dob_ok = query
                    .date_of_birth
                    .is_none_or(|date| patient.date_of_birth == Some(date));
                name_ok && phone_ok && national_id_ok && dob_ok
            })
            .collect()
    }

    /// Inserts a record loaded from the store, indexing its natural keys
    /// and resynchronising the id counter past the loaded id.
    pub(crate) fn insert_loaded(&mut self, patient: Patient) {
        if let Some(numeric) = patient
            .id
            .as_str()
            .strip_prefix('P')
            .and_then(|digits| digits.parse::<u32>().ok())
        {
            self.next_id = self.next_id.max(numeric + 1);
        }
        if !patient.phone.is_empty() {
            self.phone_index.insert(&patient.phone, patient.id.clone());
        }
        if !patient.national_id.is_empty() {
            self.national_id_index
                .insert(&patient.national_id, patient.id.clone());
        }
        self.records.put(patient.id.clone(), patient);
    }
}
