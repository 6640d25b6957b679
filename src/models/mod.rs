//! Records exchanged with the clinical backend.
//!
//! Field names on the wire are the backend's (`idPaciente`, `nombre`, ...);
//! the Rust side uses English names and `serde` renames. Identifiers are
//! `None` until the backend has persisted the record.

mod medication;
mod patient;
mod record;
mod statistics;
mod user;

pub use medication::{Medication, MedicationUpdate};
pub use patient::{Patient, PatientUpdate};
pub use record::{MedicalRecord, RecordRef, Treatment, TreatmentUpdate};
pub use statistics::Statistics;
pub use user::{Role, User, UserUpdate};

pub(crate) fn id_text(id: Option<u64>) -> Option<String> {
    id.map(|id| id.to_string())
}
