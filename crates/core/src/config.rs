//! System configuration.
//!
//! Resolved once at startup and passed into [`MedicalSystem`](crate::MedicalSystem)
//! rather than read from ambient state during operation. Bucket counts are
//! fixed for the life of each table (the hash tables never rehash).

/// Tunables for a [`MedicalSystem`](crate::MedicalSystem).
#[derive(Debug, Clone)]
pub struct SystemConfig {
    /// Buckets in the patient record table.
    pub patient_buckets: usize,
    /// Buckets in the doctor record table.
    pub doctor_buckets: usize,
    /// Buckets in the clinic record table.
    pub clinic_buckets: usize,
    /// Buckets in the clinic→queue table.
    pub queue_buckets: usize,
    /// Absences after which a called patient is ejected for good.
    pub absence_limit: u8,
    /// Levels added per escalation pass for a long waiter.
    pub escalation_step: u8,
    /// Default waiting time, in seconds, before a patient counts as a
    /// long waiter. Callers may override per invocation.
    pub escalation_threshold_secs: i64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            patient_buckets: 100,
            doctor_buckets: 50,
            clinic_buckets: 20,
            queue_buckets: 20,
            absence_limit: 3,
            escalation_step: 1,
            escalation_threshold_secs: 3600,
        }
    }
}
