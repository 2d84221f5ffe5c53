//! System orchestration boundary.
//!
//! [`MedicalSystem`] owns every registry and one scheduling queue per
//! clinic, and is the only place cross-entity rules live: queue membership
//! is mutually exclusive across clinics, deletion is blocked while
//! referenced, and the clinic↔doctor membership lists are reconciled here
//! and nowhere else.
//!
//! Mutating operations answer with the uniform [`Outcome`] triple;
//! internal steps use [`CoreResult`] and `?`. The system is single-writer:
//! wrap it in external serialisation before sharing it across threads.

use chrono::{TimeDelta, Utc};
use mediq_containers::{ChainMap, Sequence};
use tracing::{info, warn};

use crate::config::SystemConfig;
use crate::error::{CoreError, CoreResult};
use crate::ids::{ClinicId, DoctorId, PatientId};
use crate::models::{
    Clinic, Doctor, ExaminationDraft, ExaminationRecord, NewPatient, Patient, PatientQuery,
    PatientUpdate,
};
use crate::outcome::{Outcome, Severity};
use crate::priority::{PriorityLabel, MAX_LEVEL, MIN_LEVEL};
use crate::queue::{AbsenceOutcome, QueueEntry, SchedulingQueue};
use crate::registry::{ClinicRegistry, DoctorRegistry, PatientRegistry};

/// Everything the store persists, in plain owned form.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub patients: Vec<Patient>,
    pub doctors: Vec<Doctor>,
    pub clinics: Vec<Clinic>,
}

pub struct MedicalSystem {
    config: SystemConfig,
    patients: PatientRegistry,
    doctors: DoctorRegistry,
    clinics: ClinicRegistry,
    /// One scheduling queue per clinic, keyed by clinic id.
    queues: ChainMap<ClinicId, SchedulingQueue>,
    /// Patients whose examination completed this session, in order.
    examined: Sequence<PatientId>,
}

impl MedicalSystem {
    pub fn new(config: SystemConfig) -> Self {
        Self {
            patients: PatientRegistry::new(config.patient_buckets),
            doctors: DoctorRegistry::new(config.doctor_buckets),
            clinics: ClinicRegistry::new(config.clinic_buckets),
            queues: ChainMap::new(config.queue_buckets),
            examined: Sequence::new(),
            config,
        }
    }

    /// Rebuilds a system from persisted records.
    ///
    /// Registry id counters resynchronise past the highest loaded id, and
    /// every loaded clinic gets its (empty) queue. Queue contents are
    /// session state and are not part of a snapshot.
    pub fn from_snapshot(snapshot: Snapshot, config: SystemConfig) -> Self {
        let mut system = Self::new(config);
        for patient in snapshot.patients {
            system.patients.insert_loaded(patient);
        }
        for doctor in snapshot.doctors {
            system.doctors.insert_loaded(doctor);
        }
        for clinic in snapshot.clinics {
            system.queues.put(clinic.id.clone(), SchedulingQueue::new());
            system.clinics.insert_loaded(clinic);
        }
        system
    }

    /// Clones the persistent state out for the store.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            patients: self.patients.iter().cloned().collect(),
            doctors: self.doctors.iter().cloned().collect(),
            clinics: self.clinics.iter().cloned().collect(),
        }
    }

    // ---- reads ----

    pub fn patient(&self, id: &PatientId) -> Option<&Patient> {
        self.patients.get(id)
    }

    pub fn patients(&self) -> impl Iterator<Item = &Patient> {
        self.patients.iter()
    }

    pub fn search_patients(&self, query: &PatientQuery) -> Vec<&Patient> {
        self.patients.search(query)
    }

    pub fn find_patient_by_phone(&self, phone: &str) -> Option<&Patient> {
        self.patients.find_by_phone(phone)
    }

    pub fn find_patient_by_national_id(&self, national_id: &str) -> Option<&Patient> {
        self.patients.find_by_national_id(national_id)
    }

    pub fn doctor(&self, id: &DoctorId) -> Option<&Doctor> {
        self.doctors.get(id)
    }

    pub fn doctors(&self) -> impl Iterator<Item = &Doctor> {
        self.doctors.iter()
    }

    pub fn clinic(&self, id: &ClinicId) -> Option<&Clinic> {
        self.clinics.get(id)
    }

    pub fn clinics(&self) -> impl Iterator<Item = &Clinic> {
        self.clinics.iter()
    }

    /// Patients examined this session, in completion order.
    pub fn examined_today(&self) -> impl Iterator<Item = &PatientId> {
        self.examined.iter()
    }

    /// The waiting list of one clinic in call order, top first.
    ///
    /// # Errors
    ///
    /// [`CoreError::ClinicNotFound`].
    pub fn queue_overview(&self, clinic_id: &ClinicId) -> CoreResult<Vec<QueueEntry>> {
        if self.clinics.get(clinic_id).is_none() {
            return Err(CoreError::ClinicNotFound(clinic_id.clone()));
        }
        Ok(self
            .queues
            .get(clinic_id)
            .map(SchedulingQueue::ranked_snapshot)
            .unwrap_or_default())
    }

    // ---- patient records ----

    pub fn create_patient(&mut self, draft: NewPatient) -> Outcome<Patient> {
        match self.patients.create(draft) {
            Ok(patient) => {
                info!(patient = %patient.id, "patient registered");
                let message = format!("patient {} ({}) created", patient.id, patient.full_name);
                Outcome::info(patient, message)
            }
            Err(err) => reject("create patient", err),
        }
    }

    pub fn update_patient(&mut self, id: &PatientId, update: PatientUpdate) -> Outcome<bool> {
        if update.is_empty() {
            return Outcome::warning("nothing to update");
        }
        match self.patients.update(id, update) {
            Ok(changed) => {
                info!(patient = %id, changed, "patient updated");
                Outcome::info(changed, format!("patient {id} updated"))
            }
            Err(err) => reject("update patient", err),
        }
    }

    /// Deletes a patient record.
    ///
    /// Blocked while the patient waits in any queue; the examination
    /// history disappears with the record.
    pub fn delete_patient(&mut self, id: &PatientId) -> Outcome<Patient> {
        match self.try_delete_patient(id) {
            Ok(patient) => {
                info!(patient = %id, "patient deleted");
                let message = format!("patient {id} deleted");
                Outcome::info(patient, message)
            }
            Err(err) => reject("delete patient", err),
        }
    }

    fn try_delete_patient(&mut self, id: &PatientId) -> CoreResult<Patient> {
        if let Some(clinic_id) = self.queue_holding(id) {
            return Err(CoreError::InvalidInput(format!(
                "patient {id} is waiting at clinic {clinic_id}; remove them from the queue first"
            )));
        }
        self.patients.remove(id)
    }

    /// Appends an examination to the patient's permanent history and marks
    /// them examined for this session. The date is stamped now.
    pub fn complete_examination(
        &mut self,
        id: &PatientId,
        draft: ExaminationDraft,
    ) -> Outcome<()> {
        let Some(patient) = self.patients.get_mut(id) else {
            return reject("complete examination", CoreError::PatientNotFound(id.clone()));
        };
        patient.add_examination(ExaminationRecord {
            date: Utc::now().date_naive(),
            exam_type: draft.exam_type,
            result: draft.result,
            notes: draft.notes,
            doctor_id: draft.doctor_id,
            clinic_id: draft.clinic_id,
        });
        // Listed once per day no matter how many examinations.
        if !self.examined.iter().any(|examined| examined == id) {
            self.examined.append(id.clone());
        }
        info!(patient = %id, "examination recorded");
        Outcome::info((), format!("examination recorded for patient {id}"))
    }

    // ---- doctor records ----

    pub fn create_doctor(&mut self, name: &str, specialty: &str) -> Outcome<Doctor> {
        match self.doctors.create(name, specialty) {
            Ok(doctor) => {
                info!(doctor = %doctor.id, "doctor created");
                let message = format!("doctor {} ({}) created", doctor.id, doctor.name);
                Outcome::info(doctor, message)
            }
            Err(err) => reject("create doctor", err),
        }
    }

    pub fn update_doctor(
        &mut self,
        id: &DoctorId,
        name: Option<&str>,
        specialty: Option<&str>,
    ) -> Outcome<bool> {
        match self.doctors.update(id, name, specialty) {
            Ok(changed) => Outcome::info(changed, format!("doctor {id} updated")),
            Err(err) => reject("update doctor", err),
        }
    }

    /// Deletes a doctor and unlinks them from every clinic they staffed.
    pub fn delete_doctor(&mut self, id: &DoctorId) -> Outcome<Doctor> {
        match self.doctors.remove(id) {
            Ok(doctor) => {
                for clinic_id in doctor.clinic_ids.iter() {
                    if let Some(clinic) = self.clinics.get_mut(clinic_id) {
                        unlink(&mut clinic.doctor_ids, id);
                    }
                }
                info!(doctor = %id, "doctor deleted");
                let message = format!("doctor {id} deleted");
                Outcome::info(doctor, message)
            }
            Err(err) => reject("delete doctor", err),
        }
    }

    // ---- clinic records ----

    /// Creates a clinic together with its (empty) scheduling queue.
    pub fn create_clinic(&mut self, name: &str, specialty: &str) -> Outcome<Clinic> {
        match self.clinics.create(name, specialty) {
            Ok(clinic) => {
                self.queues.put(clinic.id.clone(), SchedulingQueue::new());
                info!(clinic = %clinic.id, "clinic created");
                let message = format!("clinic {} ({}) created", clinic.id, clinic.name);
                Outcome::info(clinic, message)
            }
            Err(err) => reject("create clinic", err),
        }
    }

    pub fn update_clinic(
        &mut self,
        id: &ClinicId,
        name: Option<&str>,
        specialty: Option<&str>,
    ) -> Outcome<bool> {
        match self.clinics.update(id, name, specialty) {
            Ok(changed) => Outcome::info(changed, format!("clinic {id} updated")),
            Err(err) => reject("update clinic", err),
        }
    }

    /// Deletes a clinic. Blocked while patients are waiting; staffing
    /// links on both sides are dropped with the record.
    pub fn delete_clinic(&mut self, id: &ClinicId) -> Outcome<Clinic> {
        match self.try_delete_clinic(id) {
            Ok(clinic) => {
                info!(clinic = %id, "clinic deleted");
                let message = format!("clinic {id} deleted");
                Outcome::info(clinic, message)
            }
            Err(err) => reject("delete clinic", err),
        }
    }

    fn try_delete_clinic(&mut self, id: &ClinicId) -> CoreResult<Clinic> {
        if self.queues.get(id).is_some_and(|queue| !queue.is_empty()) {
            return Err(CoreError::InvalidInput(format!(
                "clinic {id} still has patients waiting"
            )));
        }
        let clinic = self.clinics.remove(id)?;
        self.queues.remove(id);
        for doctor_id in clinic.doctor_ids.iter() {
            if let Some(doctor) = self.doctors.get_mut(doctor_id) {
                unlink(&mut doctor.clinic_ids, id);
            }
        }
        Ok(clinic)
    }

    // ---- staffing ----

    /// Links a doctor to a clinic, updating both membership lists.
    pub fn assign_doctor(&mut self, doctor_id: &DoctorId, clinic_id: &ClinicId) -> Outcome<()> {
        match self.try_assign(doctor_id, clinic_id) {
            Ok(true) => {
                info!(doctor = %doctor_id, clinic = %clinic_id, "doctor assigned");
                Outcome::info((), format!("doctor {doctor_id} assigned to clinic {clinic_id}"))
            }
            Ok(false) => Outcome::warning(format!(
                "doctor {doctor_id} already works at clinic {clinic_id}"
            )),
            Err(err) => reject("assign doctor", err),
        }
    }

    fn try_assign(&mut self, doctor_id: &DoctorId, clinic_id: &ClinicId) -> CoreResult<bool> {
        if self.clinics.get(clinic_id).is_none() {
            return Err(CoreError::ClinicNotFound(clinic_id.clone()));
        }
        let doctor = self
            .doctors
            .get_mut(doctor_id)
            .ok_or_else(|| CoreError::DoctorNotFound(doctor_id.clone()))?;
        if doctor.clinic_ids.iter().any(|id| id == clinic_id) {
            return Ok(false);
        }
        doctor.clinic_ids.append(clinic_id.clone());
        if let Some(clinic) = self.clinics.get_mut(clinic_id) {
            clinic.doctor_ids.append(doctor_id.clone());
        }
        Ok(true)
    }

    /// Unlinks a doctor from a clinic on both sides.
    pub fn unassign_doctor(&mut self, doctor_id: &DoctorId, clinic_id: &ClinicId) -> Outcome<()> {
        match self.try_unassign(doctor_id, clinic_id) {
            Ok(true) => {
                info!(doctor = %doctor_id, clinic = %clinic_id, "doctor unassigned");
                Outcome::info(
                    (),
                    format!("doctor {doctor_id} unassigned from clinic {clinic_id}"),
                )
            }
            Ok(false) => Outcome::warning(format!(
                "doctor {doctor_id} does not work at clinic {clinic_id}"
            )),
            Err(err) => reject("unassign doctor", err),
        }
    }

    fn try_unassign(&mut self, doctor_id: &DoctorId, clinic_id: &ClinicId) -> CoreResult<bool> {
        if self.clinics.get(clinic_id).is_none() {
            return Err(CoreError::ClinicNotFound(clinic_id.clone()));
        }
        let doctor = self
            .doctors
            .get_mut(doctor_id)
            .ok_or_else(|| CoreError::DoctorNotFound(doctor_id.clone()))?;
        let dropped = unlink(&mut doctor.clinic_ids, clinic_id);
        if let Some(clinic) = self.clinics.get_mut(clinic_id) {
            unlink(&mut clinic.doctor_ids, doctor_id);
        }
        Ok(dropped)
    }

    // ---- queue protocol ----

    /// Registers a patient in a clinic's queue under a priority label.
    ///
    /// A patient may wait in at most one queue across the whole system;
    /// a second registration anywhere is answered with a warning naming
    /// the clinic already holding them, and changes nothing.
    pub fn register(
        &mut self,
        patient_id: &PatientId,
        clinic_id: &ClinicId,
        priority: &str,
    ) -> Outcome<QueueEntry> {
        match self.try_register(patient_id, clinic_id, priority) {
            Ok(entry) => {
                info!(
                    patient = %patient_id,
                    clinic = %clinic_id,
                    level = entry.priority_level,
                    "patient queued"
                );
                let message = format!(
                    "patient {patient_id} queued at clinic {clinic_id} (level {})",
                    entry.priority_level
                );
                Outcome::info(entry, message)
            }
            Err(err) => reject("register", err),
        }
    }

    fn try_register(
        &mut self,
        patient_id: &PatientId,
        clinic_id: &ClinicId,
        priority: &str,
    ) -> CoreResult<QueueEntry> {
        if self.patients.get(patient_id).is_none() {
            return Err(CoreError::PatientNotFound(patient_id.clone()));
        }
        if self.clinics.get(clinic_id).is_none() {
            return Err(CoreError::ClinicNotFound(clinic_id.clone()));
        }
        if let Some(holding) = self.queue_holding(patient_id) {
            return Err(CoreError::AlreadyQueued {
                patient: patient_id.clone(),
                clinic: holding,
            });
        }
        let level = PriorityLabel::parse(priority)?.level();
        let entry = QueueEntry::new(patient_id.clone(), level, Utc::now());
        self.queue_mut(clinic_id).add(entry.clone());
        Ok(entry)
    }

    /// Calls the next patient at a clinic: highest priority level first,
    /// earliest registration breaking ties. The entry leaves the queue;
    /// the caller decides whether the patient showed up (and on absence
    /// feeds the entry back through [`MedicalSystem::handle_absence`]).
    ///
    /// An empty queue and an unknown clinic both answer informationally;
    /// nobody waiting is not a fault.
    pub fn call_next(&mut self, clinic_id: &ClinicId) -> Outcome<QueueEntry> {
        let top = self.queues.get_mut(clinic_id).and_then(SchedulingQueue::pop_top);
        match top {
            Some(entry) => {
                info!(patient = %entry.patient_id, clinic = %clinic_id, "patient called");
                let message = format!("now serving patient {}", entry.patient_id);
                Outcome::info(entry, message)
            }
            None => Outcome::info_empty(format!("no patients waiting at clinic {clinic_id}")),
        }
    }

    /// Handles a called patient who did not show up.
    ///
    /// The absence counter increments; at the configured limit the entry
    /// is ejected for good, otherwise it returns to the same queue one
    /// priority level lower (never below the minimum) with its original
    /// registration time intact, so remaining seniority survives.
    ///
    /// The clinic may have been deleted while the patient was out of its
    /// queue in the `Called` state; the entry is then dropped with an
    /// error rather than requeued into a queue that no longer exists.
    pub fn handle_absence(
        &mut self,
        mut entry: QueueEntry,
        clinic_id: &ClinicId,
    ) -> Outcome<AbsenceOutcome> {
        if self.queues.get(clinic_id).is_none() {
            return reject("handle absence", CoreError::QueueNotFound(clinic_id.clone()));
        }
        entry.absences = entry.absences.saturating_add(1);
        if entry.absences >= self.config.absence_limit {
            warn!(
                patient = %entry.patient_id,
                clinic = %clinic_id,
                absences = entry.absences,
                "patient ejected after repeated absences"
            );
            return Outcome {
                value: Some(AbsenceOutcome::Ejected),
                message: format!(
                    "patient {} removed from the queue after {} absences",
                    entry.patient_id, entry.absences
                ),
                severity: Severity::Warning,
            };
        }
        entry.priority_level = entry.priority_level.saturating_sub(1).max(MIN_LEVEL);
        let new_level = entry.priority_level;
        let patient_id = entry.patient_id.clone();
        self.queue_mut(clinic_id).add(entry);
        info!(patient = %patient_id, clinic = %clinic_id, new_level, "absent patient requeued");
        Outcome::info(
            AbsenceOutcome::Requeued { new_level },
            format!("patient {patient_id} requeued at level {new_level}"),
        )
    }

    /// Removes a waiting patient from a clinic's queue at their request.
    pub fn leave_queue(&mut self, patient_id: &PatientId, clinic_id: &ClinicId) -> Outcome<()> {
        if self.clinics.get(clinic_id).is_none() {
            return reject("leave queue", CoreError::ClinicNotFound(clinic_id.clone()));
        }
        let removed = self
            .queues
            .get_mut(clinic_id)
            .is_some_and(|queue| queue.remove_by_key(patient_id));
        if removed {
            info!(patient = %patient_id, clinic = %clinic_id, "patient left the queue");
            Outcome::info((), format!("patient {patient_id} left the queue"))
        } else {
            Outcome::warning(format!(
                "patient {patient_id} is not waiting at clinic {clinic_id}"
            ))
        }
    }

    /// Changes the priority level of a patient already waiting in a queue;
    /// their position follows the new level immediately.
    pub fn change_priority(
        &mut self,
        patient_id: &PatientId,
        clinic_id: &ClinicId,
        priority: &str,
    ) -> Outcome<u8> {
        let level = match PriorityLabel::parse(priority) {
            Ok(label) => label.level(),
            Err(err) => return reject("change priority", err),
        };
        if self.clinics.get(clinic_id).is_none() {
            return reject("change priority", CoreError::ClinicNotFound(clinic_id.clone()));
        }
        let moved = self
            .queues
            .get_mut(clinic_id)
            .is_some_and(|queue| queue.update_priority(patient_id, level));
        if moved {
            info!(patient = %patient_id, clinic = %clinic_id, level, "priority changed");
            Outcome::info(level, format!("patient {patient_id} moved to level {level}"))
        } else {
            Outcome::error(format!(
                "patient {patient_id} is not waiting at clinic {clinic_id}"
            ))
        }
    }

    /// Raises the priority of everyone who has waited longer than the
    /// threshold (the configured default when `threshold_secs` is `None`).
    pub fn escalate_long_waiters(
        &mut self,
        clinic_id: &ClinicId,
        threshold_secs: Option<i64>,
    ) -> Outcome<usize> {
        if self.clinics.get(clinic_id).is_none() {
            return reject("escalate", CoreError::ClinicNotFound(clinic_id.clone()));
        }
        let threshold =
            TimeDelta::seconds(threshold_secs.unwrap_or(self.config.escalation_threshold_secs));
        let step = self.config.escalation_step;
        let escalated = self
            .queues
            .get_mut(clinic_id)
            .map(|queue| queue.escalate_long_waiters(Utc::now(), threshold, step, MAX_LEVEL))
            .unwrap_or(0);
        if escalated > 0 {
            info!(clinic = %clinic_id, escalated, "long waiters escalated");
        }
        Outcome::info(escalated, format!("{escalated} patient(s) escalated"))
    }

    // ---- internals ----

    /// The clinic whose queue currently holds `patient_id`, if any.
    fn queue_holding(&self, patient_id: &PatientId) -> Option<ClinicId> {
        self.queues
            .iter()
            .find(|(_, queue)| queue.contains(patient_id))
            .map(|(clinic_id, _)| clinic_id.clone())
    }

    /// The queue for `clinic_id`, created on first touch. Loaded snapshots
    /// and direct construction both converge here.
    fn queue_mut(&mut self, clinic_id: &ClinicId) -> &mut SchedulingQueue {
        if !self.queues.contains(clinic_id) {
            self.queues.put(clinic_id.clone(), SchedulingQueue::new());
        }
        // Present by the insert above.
        match self.queues.get_mut(clinic_id) {
            Some(queue) => queue,
            None => unreachable!("queue inserted for clinic"),
        }
    }

}

fn reject<T>(operation: &str, err: CoreError) -> Outcome<T> {
    warn!(operation, error = %err, "operation rejected");
    err.into()
}

fn unlink<T: PartialEq>(list: &mut Sequence<T>, item: &T) -> bool {
    let position = list.iter().position(|candidate| candidate == item);
    match position {
        Some(index) => list.remove(index).is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    fn system() -> MedicalSystem {
        MedicalSystem::new(SystemConfig::default())
    }

    fn patient(system: &mut MedicalSystem, name: &str, phone: &str, national_id: &str) -> PatientId {
        let outcome = system.create_patient(NewPatient {
            full_name: name.to_string(),
            date_of_birth: "1985-06-20".to_string(),
            gender: "M".to_string(),
            phone: phone.to_string(),
            national_id: national_id.to_string(),
            ..Default::default()
        });
        outcome.value.expect("patient should be created").id
    }

    fn clinic(system: &mut MedicalSystem, name: &str) -> ClinicId {
        system
            .create_clinic(name, "general")
            .value
            .expect("clinic should be created")
            .id
    }

    #[test]
    fn call_order_is_priority_then_arrival() {
        let mut sys = system();
        let clinic_id = clinic(&mut sys, "Triage");
        let routine = patient(&mut sys, "Routine", "0901", "111");
        let urgent = patient(&mut sys, "Urgent", "0902", "222");
        let emergency = patient(&mut sys, "Emergency", "0903", "333");

        assert!(!sys.register(&routine, &clinic_id, "routine").is_error());
        sleep(Duration::from_millis(2));
        assert!(!sys.register(&urgent, &clinic_id, "urgent").is_error());
        sleep(Duration::from_millis(2));
        assert!(!sys.register(&emergency, &clinic_id, "emergency").is_error());

        let mut called = Vec::new();
        while let Some(entry) = sys.call_next(&clinic_id).value {
            called.push(entry.patient_id);
        }
        assert_eq!(called, vec![emergency, urgent, routine]);
    }

    #[test]
    fn equal_priority_is_served_in_arrival_order() {
        let mut sys = system();
        let clinic_id = clinic(&mut sys, "Triage");
        let first = patient(&mut sys, "First", "0901", "111");
        let second = patient(&mut sys, "Second", "0902", "222");

        sys.register(&first, &clinic_id, "routine");
        sleep(Duration::from_millis(2));
        sys.register(&second, &clinic_id, "routine");

        let called = sys.call_next(&clinic_id).value.expect("someone is waiting");
        assert_eq!(called.patient_id, first);
    }

    #[test]
    fn second_registration_anywhere_is_a_warning_and_changes_nothing() {
        let mut sys = system();
        let clinic_a = clinic(&mut sys, "Cardiology");
        let clinic_b = clinic(&mut sys, "Radiology");
        let id = patient(&mut sys, "Alice", "0901", "111");

        sys.register(&id, &clinic_a, "routine");
        let outcome = sys.register(&id, &clinic_b, "urgent");

        assert_eq!(outcome.severity, Severity::Warning);
        assert!(outcome.value.is_none());
        assert!(outcome.message.contains(clinic_a.as_str()));
        assert!(sys
            .queue_overview(&clinic_b)
            .expect("clinic exists")
            .is_empty());
        assert_eq!(
            sys.queue_overview(&clinic_a).expect("clinic exists").len(),
            1
        );
    }

    #[test]
    fn absence_decays_priority_and_keeps_the_arrival_time() {
        let mut sys = system();
        let clinic_id = clinic(&mut sys, "Triage");
        let id = patient(&mut sys, "Alice", "0901", "111");

        sys.register(&id, &clinic_id, "urgent");
        let called = sys.call_next(&clinic_id).value.expect("patient waiting");
        let original_arrival = called.registered_at;

        let outcome = sys.handle_absence(called, &clinic_id);
        assert_eq!(
            outcome.value,
            Some(AbsenceOutcome::Requeued { new_level: 3 })
        );

        let requeued = sys.call_next(&clinic_id).value.expect("patient requeued");
        assert_eq!(requeued.priority_level, 3);
        assert_eq!(requeued.absences, 1);
        assert_eq!(requeued.registered_at, original_arrival);
    }

    #[test]
    fn priority_decay_floors_at_the_minimum_level() {
        let mut sys = system();
        let clinic_id = clinic(&mut sys, "Triage");
        let id = patient(&mut sys, "Alice", "0901", "111");

        sys.register(&id, &clinic_id, "routine"); // level 2
        let called = sys.call_next(&clinic_id).value.expect("waiting");
        sys.handle_absence(called, &clinic_id); // 2 -> 1

        let called = sys.call_next(&clinic_id).value.expect("requeued");
        assert_eq!(called.priority_level, MIN_LEVEL);
        let outcome = sys.handle_absence(called, &clinic_id); // stays at 1
        assert_eq!(
            outcome.value,
            Some(AbsenceOutcome::Requeued {
                new_level: MIN_LEVEL
            })
        );
    }

    #[test]
    fn third_absence_ejects_for_good() {
        let mut sys = system();
        let clinic_id = clinic(&mut sys, "Triage");
        let id = patient(&mut sys, "Alice", "0901", "111");

        sys.register(&id, &clinic_id, "emergency");
        for expected_more in [true, true, false] {
            let called = sys.call_next(&clinic_id).value.expect("still queued");
            let outcome = sys.handle_absence(called, &clinic_id);
            match outcome.value {
                Some(AbsenceOutcome::Requeued { .. }) => assert!(expected_more),
                Some(AbsenceOutcome::Ejected) => {
                    assert!(!expected_more);
                    assert_eq!(outcome.severity, Severity::Warning);
                }
                None => panic!("absence handling should always produce a value"),
            }
        }
        assert!(sys.call_next(&clinic_id).value.is_none());
    }

    #[test]
    fn call_next_on_empty_or_unknown_queue() {
        let mut sys = system();
        let clinic_id = clinic(&mut sys, "Triage");

        let outcome = sys.call_next(&clinic_id);
        assert_eq!(outcome.severity, Severity::Info);
        assert!(outcome.value.is_none());

        // An unknown clinic is answered informationally too.
        let outcome = sys.call_next(&ClinicId::new("C999"));
        assert_eq!(outcome.severity, Severity::Info);
        assert!(outcome.value.is_none());
    }

    #[test]
    fn absence_for_a_deleted_clinic_drops_the_entry() {
        let mut sys = system();
        let clinic_id = clinic(&mut sys, "Triage");
        let id = patient(&mut sys, "Alice", "0901", "111");

        sys.register(&id, &clinic_id, "routine");
        let called = sys.call_next(&clinic_id).value.expect("waiting");
        // The queue is empty while the patient is in the Called state, so
        // nothing blocks deleting the clinic out from under them.
        assert!(!sys.delete_clinic(&clinic_id).is_error());

        let outcome = sys.handle_absence(called, &clinic_id);
        assert!(outcome.is_error());
        assert!(outcome.value.is_none());

        // The patient is free, not stuck in a queue for a dead clinic.
        let other = clinic(&mut sys, "Radiology");
        assert_eq!(sys.register(&id, &other, "routine").severity, Severity::Info);
    }

    #[test]
    fn leaving_and_absent_from_queue() {
        let mut sys = system();
        let clinic_id = clinic(&mut sys, "Triage");
        let id = patient(&mut sys, "Alice", "0901", "111");

        sys.register(&id, &clinic_id, "routine");
        assert_eq!(sys.leave_queue(&id, &clinic_id).severity, Severity::Info);
        assert_eq!(sys.leave_queue(&id, &clinic_id).severity, Severity::Warning);
        assert!(sys.call_next(&clinic_id).value.is_none());
    }

    #[test]
    fn mid_queue_priority_change_reorders_the_queue() {
        let mut sys = system();
        let clinic_id = clinic(&mut sys, "Triage");
        let first = patient(&mut sys, "First", "0901", "111");
        let second = patient(&mut sys, "Second", "0902", "222");

        sys.register(&first, &clinic_id, "urgent");
        sleep(Duration::from_millis(2));
        sys.register(&second, &clinic_id, "routine");

        let outcome = sys.change_priority(&second, &clinic_id, "emergency");
        assert_eq!(outcome.value, Some(5));

        let called = sys.call_next(&clinic_id).value.expect("waiting");
        assert_eq!(called.patient_id, second);
    }

    #[test]
    fn escalation_raises_long_waiters_only() {
        let mut sys = system();
        let clinic_id = clinic(&mut sys, "Triage");
        let id = patient(&mut sys, "Alice", "0901", "111");

        sys.register(&id, &clinic_id, "routine");
        // Everyone has waited longer than zero seconds.
        let outcome = sys.escalate_long_waiters(&clinic_id, Some(0));
        assert_eq!(outcome.value, Some(1));

        // Nobody has waited an hour yet.
        let outcome = sys.escalate_long_waiters(&clinic_id, None);
        assert_eq!(outcome.value, Some(0));

        let entries = sys.queue_overview(&clinic_id).expect("clinic exists");
        assert_eq!(entries[0].priority_level, 3);
    }

    #[test]
    fn queued_patient_cannot_be_deleted() {
        let mut sys = system();
        let clinic_id = clinic(&mut sys, "Triage");
        let id = patient(&mut sys, "Alice", "0901", "111");

        sys.register(&id, &clinic_id, "routine");
        assert!(sys.delete_patient(&id).is_error());
        assert!(sys.patient(&id).is_some());

        sys.leave_queue(&id, &clinic_id);
        assert!(!sys.delete_patient(&id).is_error());
        assert!(sys.patient(&id).is_none());
    }

    #[test]
    fn clinic_with_waiting_patients_cannot_be_deleted() {
        let mut sys = system();
        let clinic_id = clinic(&mut sys, "Triage");
        let id = patient(&mut sys, "Alice", "0901", "111");

        sys.register(&id, &clinic_id, "routine");
        assert!(sys.delete_clinic(&clinic_id).is_error());

        sys.leave_queue(&id, &clinic_id);
        assert!(!sys.delete_clinic(&clinic_id).is_error());
        assert!(sys.clinic(&clinic_id).is_none());
    }

    #[test]
    fn staffing_links_are_kept_mutual() {
        let mut sys = system();
        let clinic_id = clinic(&mut sys, "Cardiology");
        let doctor_id = sys
            .create_doctor("Dr. House", "cardiology")
            .value
            .expect("doctor created")
            .id;

        assert_eq!(
            sys.assign_doctor(&doctor_id, &clinic_id).severity,
            Severity::Info
        );
        assert_eq!(
            sys.assign_doctor(&doctor_id, &clinic_id).severity,
            Severity::Warning
        );
        assert!(sys
            .clinic(&clinic_id)
            .expect("clinic exists")
            .doctor_ids
            .iter()
            .any(|id| id == &doctor_id));

        let deleted = sys.delete_doctor(&doctor_id);
        assert!(!deleted.is_error());
        assert!(sys
            .clinic(&clinic_id)
            .expect("clinic exists")
            .doctor_ids
            .is_empty());
    }

    #[test]
    fn unassign_drops_both_sides() {
        let mut sys = system();
        let clinic_id = clinic(&mut sys, "Cardiology");
        let doctor_id = sys
            .create_doctor("Dr. Wilson", "oncology")
            .value
            .expect("doctor created")
            .id;

        sys.assign_doctor(&doctor_id, &clinic_id);
        assert_eq!(
            sys.unassign_doctor(&doctor_id, &clinic_id).severity,
            Severity::Info
        );
        assert!(sys
            .doctor(&doctor_id)
            .expect("doctor exists")
            .clinic_ids
            .is_empty());
        assert_eq!(
            sys.unassign_doctor(&doctor_id, &clinic_id).severity,
            Severity::Warning
        );
    }

    #[test]
    fn completed_examinations_build_history_and_the_daily_list() {
        let mut sys = system();
        let clinic_id = clinic(&mut sys, "Triage");
        let id = patient(&mut sys, "Alice", "0901", "111");

        sys.register(&id, &clinic_id, "routine");
        let called = sys.call_next(&clinic_id).value.expect("waiting");
        let outcome = sys.complete_examination(
            &called.patient_id,
            ExaminationDraft {
                exam_type: "checkup".to_string(),
                result: "healthy".to_string(),
                clinic_id: Some(clinic_id.clone()),
                ..Default::default()
            },
        );
        assert!(!outcome.is_error());

        let record = sys.patient(&id).expect("patient exists");
        assert_eq!(record.examinations.len(), 1);
        let examined: Vec<&PatientId> = sys.examined_today().collect();
        assert_eq!(examined, vec![&id]);

        // A second examination extends the history but the daily list
        // names each patient once.
        sys.complete_examination(
            &id,
            ExaminationDraft {
                exam_type: "x-ray".to_string(),
                result: "clear".to_string(),
                ..Default::default()
            },
        );
        let record = sys.patient(&id).expect("patient exists");
        assert_eq!(record.examinations.len(), 2);
        assert_eq!(sys.examined_today().count(), 1);
    }

    #[test]
    fn snapshot_round_trip_preserves_records_and_id_counters() {
        let mut sys = system();
        let clinic_id = clinic(&mut sys, "Cardiology");
        let doctor_id = sys
            .create_doctor("Dr. House", "cardiology")
            .value
            .expect("doctor created")
            .id;
        sys.assign_doctor(&doctor_id, &clinic_id);
        patient(&mut sys, "Alice", "0901", "111");

        let snapshot = sys.snapshot();
        let mut restored = MedicalSystem::from_snapshot(snapshot, SystemConfig::default());

        assert_eq!(restored.patients().count(), 1);
        assert!(restored.find_patient_by_phone("0901").is_some());
        assert!(restored
            .queue_overview(&clinic_id)
            .expect("clinic restored")
            .is_empty());

        // Counters continue past the loaded ids.
        let next = patient(&mut restored, "Bob", "0902", "222");
        assert_eq!(next.as_str(), "P0002");
        let next_clinic = clinic(&mut restored, "Radiology");
        assert_eq!(next_clinic.as_str(), "C002");
    }
}
