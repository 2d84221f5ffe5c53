use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediq_core::{
    models::parse_date, ClinicId, DoctorId, ExaminationDraft, MedicalSystem, NewPatient, Outcome,
    Patient, PatientId, PatientQuery, PatientUpdate, SystemConfig,
};
use mediq_store::CsvStore;

#[derive(Parser)]
#[command(name = "mediq")]
#[command(about = "Clinic examination-queue management CLI")]
struct Cli {
    /// Data directory for the CSV files (overrides MEDIQ_DATA_DIR)
    #[arg(long)]
    data_dir: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new patient record
    AddPatient {
        /// Full name
        name: String,
        /// Date of birth (YYYY-MM-DD)
        date_of_birth: String,
        /// Gender
        gender: String,
        /// Phone number (unique)
        phone: String,
        /// National id (unique)
        national_id: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        insurance_id: String,
        #[arg(long, default_value = "")]
        medical_history: String,
        #[arg(long, default_value = "")]
        drug_allergies: String,
    },
    /// Update fields of an existing patient record
    UpdatePatient {
        /// Patient id
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// New date of birth (YYYY-MM-DD); pass an empty string to clear
        #[arg(long)]
        date_of_birth: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        national_id: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        insurance_id: Option<String>,
        #[arg(long)]
        medical_history: Option<String>,
        #[arg(long)]
        drug_allergies: Option<String>,
    },
    /// Delete a patient record
    DeletePatient {
        /// Patient id
        id: String,
    },
    /// List all patient records
    ListPatients,
    /// Search patient records
    Find {
        /// Exact phone number
        #[arg(long)]
        phone: Option<String>,
        /// Exact national id
        #[arg(long)]
        national_id: Option<String>,
        /// Name fragment, case-insensitive
        #[arg(long)]
        name: Option<String>,
        /// Phone fragment
        #[arg(long)]
        phone_contains: Option<String>,
        /// National id fragment
        #[arg(long)]
        national_id_contains: Option<String>,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        date_of_birth: Option<String>,
    },
    /// Create a doctor record
    AddDoctor {
        /// Doctor name
        name: String,
        /// Specialty
        specialty: String,
    },
    /// Create a clinic (and its scheduling queue)
    AddClinic {
        /// Clinic name
        name: String,
        /// Specialty
        specialty: String,
    },
    /// Assign a doctor to a clinic
    Assign {
        /// Doctor id
        doctor_id: String,
        /// Clinic id
        clinic_id: String,
    },
    /// Remove a doctor from a clinic
    Unassign {
        /// Doctor id
        doctor_id: String,
        /// Clinic id
        clinic_id: String,
    },
    /// Put a patient into a clinic's queue
    Register {
        /// Patient id
        patient_id: String,
        /// Clinic id
        clinic_id: String,
        /// Priority label: follow-up, routine, priority, urgent, emergency
        priority: String,
    },
    /// Call the next patient at a clinic
    CallNext {
        /// Clinic id
        clinic_id: String,
        /// The called patient did not show up
        #[arg(long)]
        absent: bool,
    },
    /// Show a clinic's queue in call order
    Queue {
        /// Clinic id
        clinic_id: String,
    },
    /// Raise the priority of long waiters at a clinic
    Escalate {
        /// Clinic id
        clinic_id: String,
        /// Waiting time, in seconds, that counts as long
        #[arg(long)]
        threshold_secs: Option<i64>,
    },
    /// Change the priority of a waiting patient
    ChangePriority {
        /// Patient id
        patient_id: String,
        /// Clinic id
        clinic_id: String,
        /// New priority label
        priority: String,
    },
    /// Remove a waiting patient from a queue at their request
    Leave {
        /// Patient id
        patient_id: String,
        /// Clinic id
        clinic_id: String,
    },
    /// Record a completed examination in the patient's history
    Complete {
        /// Patient id
        patient_id: String,
        /// Examination type
        exam_type: String,
        /// Examination result
        result: String,
        #[arg(long, default_value = "")]
        notes: String,
        #[arg(long)]
        doctor_id: Option<String>,
        #[arg(long)]
        clinic_id: Option<String>,
    },
}

const DEFAULT_DATA_DIR: &str = "mediq-data";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mediq=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let data_dir = cli
        .data_dir
        .or_else(|| std::env::var("MEDIQ_DATA_DIR").ok())
        .unwrap_or_else(|| DEFAULT_DATA_DIR.into());

    let store = CsvStore::new(&data_dir);
    let snapshot = store.load()?;
    let mut system = MedicalSystem::from_snapshot(snapshot, SystemConfig::default());

    run(&mut system, cli.command)?;

    store.save(&system.snapshot())?;
    Ok(())
}

fn run(system: &mut MedicalSystem, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::AddPatient {
            name,
            date_of_birth,
            gender,
            phone,
            national_id,
            address,
            insurance_id,
            medical_history,
            drug_allergies,
        } => {
            let outcome = system.create_patient(NewPatient {
                full_name: name,
                date_of_birth,
                gender,
                phone,
                national_id,
                address,
                insurance_id,
                medical_history,
                drug_allergies,
            });
            report(&outcome);
        }
        Commands::UpdatePatient {
            id,
            name,
            date_of_birth,
            gender,
            phone,
            national_id,
            address,
            insurance_id,
            medical_history,
            drug_allergies,
        } => {
            let date_of_birth = match date_of_birth.as_deref() {
                Some("") => Some(None),
                Some(raw) => Some(Some(parse_date(raw)?)),
                None => None,
            };
            let outcome = system.update_patient(
                &PatientId::new(id),
                PatientUpdate {
                    full_name: name,
                    date_of_birth,
                    gender,
                    phone,
                    national_id,
                    address,
                    insurance_id,
                    medical_history,
                    drug_allergies,
                },
            );
            report(&outcome);
        }
        Commands::DeletePatient { id } => {
            report(&system.delete_patient(&PatientId::new(id)));
        }
        Commands::ListPatients => {
            let mut count = 0;
            for patient in system.patients() {
                print_patient(patient);
                count += 1;
            }
            if count == 0 {
                println!("No patients found.");
            }
        }
        Commands::Find {
            phone,
            national_id,
            name,
            phone_contains,
            national_id_contains,
            date_of_birth,
        } => {
            let query = PatientQuery {
                phone_exact: phone,
                national_id_exact: national_id,
                name_contains: name,
                phone_contains,
                national_id_contains,
                date_of_birth: date_of_birth.as_deref().map(parse_date).transpose()?,
            };
            let hits = system.search_patients(&query);
            if hits.is_empty() {
                println!("No patients matched.");
            }
            for patient in hits {
                print_patient(patient);
            }
        }
        Commands::AddDoctor { name, specialty } => {
            report(&system.create_doctor(&name, &specialty));
        }
        Commands::AddClinic { name, specialty } => {
            report(&system.create_clinic(&name, &specialty));
        }
        Commands::Assign {
            doctor_id,
            clinic_id,
        } => {
            report(&system.assign_doctor(&DoctorId::new(doctor_id), &ClinicId::new(clinic_id)));
        }
        Commands::Unassign {
            doctor_id,
            clinic_id,
        } => {
            report(&system.unassign_doctor(&DoctorId::new(doctor_id), &ClinicId::new(clinic_id)));
        }
        Commands::Register {
            patient_id,
            clinic_id,
            priority,
        } => {
            report(&system.register(
                &PatientId::new(patient_id),
                &ClinicId::new(clinic_id),
                &priority,
            ));
        }
        Commands::CallNext { clinic_id, absent } => {
            let clinic_id = ClinicId::new(clinic_id);
            let outcome = system.call_next(&clinic_id);
            report(&outcome);
            if absent {
                if let Some(entry) = outcome.value {
                    report(&system.handle_absence(entry, &clinic_id));
                }
            }
        }
        Commands::Queue { clinic_id } => {
            let entries = system.queue_overview(&ClinicId::new(clinic_id))?;
            if entries.is_empty() {
                println!("Queue is empty.");
            }
            for (position, entry) in entries.iter().enumerate() {
                println!(
                    "{}. Patient: {}, Level: {}, Since: {}, Absences: {}",
                    position + 1,
                    entry.patient_id,
                    entry.priority_level,
                    entry.registered_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.absences
                );
            }
        }
        Commands::Escalate {
            clinic_id,
            threshold_secs,
        } => {
            report(&system.escalate_long_waiters(&ClinicId::new(clinic_id), threshold_secs));
        }
        Commands::ChangePriority {
            patient_id,
            clinic_id,
            priority,
        } => {
            report(&system.change_priority(
                &PatientId::new(patient_id),
                &ClinicId::new(clinic_id),
                &priority,
            ));
        }
        Commands::Leave {
            patient_id,
            clinic_id,
        } => {
            report(&system.leave_queue(&PatientId::new(patient_id), &ClinicId::new(clinic_id)));
        }
        Commands::Complete {
            patient_id,
            exam_type,
            result,
            notes,
            doctor_id,
            clinic_id,
        } => {
            report(&system.complete_examination(
                &PatientId::new(patient_id),
                ExaminationDraft {
                    exam_type,
                    result,
                    notes,
                    doctor_id: doctor_id.map(DoctorId::new),
                    clinic_id: clinic_id.map(ClinicId::new),
                },
            ));
        }
    }
    Ok(())
}

fn report<T>(outcome: &Outcome<T>) {
    println!("[{}] {}", outcome.severity, outcome.message);
}

fn print_patient(patient: &Patient) {
    println!(
        "ID: {}, Name: {}, Born: {}, Phone: {}, National id: {}, Examinations: {}",
        patient.id,
        patient.full_name,
        patient
            .date_of_birth
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".to_string()),
        patient.phone,
        patient.national_id,
        patient.examinations.len()
    );
}
