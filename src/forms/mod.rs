//! Create/edit drafts and the field rules they are checked against before
//! anything is sent to the backend. Rules are checked in order and the first
//! failure is reported.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{
    MedicalRecord, Medication, MedicationUpdate, Patient, RecordRef, Role, Treatment, User,
    UserUpdate,
};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("enter a valid email address")]
    InvalidEmail,

    #[error("a patient must be selected")]
    PatientNotSelected,

    #[error("patient {id} not found")]
    PatientNotFound { id: u64 },

    #[error("all fields are required, including a physician and at least one medication")]
    TreatmentIncomplete,

    #[error("physician {id} not found")]
    UnknownPhysician { id: u64 },

    #[error("medication {id} not found")]
    UnknownMedication { id: u64 },

    #[error("nothing to update")]
    EmptyUpdate,
}

fn min_chars(field: &'static str, value: &str, min: usize) -> Result<(), FormError> {
    if value.chars().count() < min {
        return Err(FormError::TooShort { field, min });
    }
    Ok(())
}

#[derive(Clone, Debug, Default)]
pub struct PatientDraft {
    pub given_name: String,
    pub family_name: String,
    pub birth_date: Option<NaiveDate>,
    pub phone: String,
    pub email: String,
}

impl PatientDraft {
    pub fn validate(self) -> Result<Patient, FormError> {
        min_chars("given name", &self.given_name, 3)?;
        min_chars("family name", &self.family_name, 3)?;
        let birth_date = self.birth_date.ok_or(FormError::Required {
            field: "birth date",
        })?;
        min_chars("phone", &self.phone, 10)?;
        if !self.email.contains('@') {
            return Err(FormError::InvalidEmail);
        }
        Ok(Patient {
            id: None,
            given_name: self.given_name,
            family_name: self.family_name,
            birth_date,
            phone: self.phone,
            email: self.email,
        })
    }
}

#[derive(Clone, Default)]
pub struct UserDraft {
    pub username: String,
    pub password: String,
    pub role: Option<Role>,
}

impl UserDraft {
    pub fn validate(self) -> Result<User, FormError> {
        min_chars("username", &self.username, 5)?;
        min_chars("password", &self.password, 6)?;
        let role = self.role.unwrap_or(Role::Administrator);
        Ok(User {
            id: None,
            username: self.username,
            password: Some(self.password),
            role_id: Some(role.id()),
        })
    }
}

/// An empty password on edit means "keep the current one".
pub fn validate_user_update(mut update: UserUpdate) -> Result<UserUpdate, FormError> {
    if update.password.as_deref() == Some("") {
        update.password = None;
    }
    if let Some(password) = update.password.as_deref() {
        min_chars("password", password, 6)?;
    }
    if update.username.is_none() && update.password.is_none() && update.role_id.is_none() {
        return Err(FormError::EmptyUpdate);
    }
    Ok(update)
}

#[derive(Clone, Debug, Default)]
pub struct MedicationDraft {
    pub name: String,
    pub description: String,
    pub contraindications: String,
    pub recommended_dosage: String,
}

impl MedicationDraft {
    pub fn validate(self) -> Result<Medication, FormError> {
        check_medication_fields(
            Some(&self.name),
            Some(&self.description),
            Some(&self.recommended_dosage),
        )?;
        Ok(Medication {
            id: None,
            name: self.name,
            description: self.description,
            contraindications: self.contraindications,
            recommended_dosage: self.recommended_dosage,
        })
    }
}

/// Edits follow the same rules as creation, applied to the fields supplied.
pub fn validate_medication_update(update: MedicationUpdate) -> Result<MedicationUpdate, FormError> {
    check_medication_fields(
        update.name.as_deref(),
        update.description.as_deref(),
        update.recommended_dosage.as_deref(),
    )?;
    if update == MedicationUpdate::default() {
        return Err(FormError::EmptyUpdate);
    }
    Ok(update)
}

fn check_medication_fields(
    name: Option<&str>,
    description: Option<&str>,
    dosage: Option<&str>,
) -> Result<(), FormError> {
    if let Some(name) = name {
        min_chars("name", name, 3)?;
    }
    if let Some(description) = description {
        min_chars("description", description, 5)?;
    }
    if let Some(dosage) = dosage {
        min_chars("recommended dosage", dosage, 3)?;
    }
    Ok(())
}

#[derive(Clone, Debug, Default)]
pub struct RecordDraft {
    pub patient_id: Option<u64>,
    pub notes: String,
}

impl RecordDraft {
    /// Embeds a snapshot of the chosen patient, taken from `patients`.
    pub fn into_record(
        self,
        patients: &[Patient],
        today: NaiveDate,
    ) -> Result<MedicalRecord, FormError> {
        let patient_id = self.patient_id.ok_or(FormError::PatientNotSelected)?;
        min_chars("medical notes", self.notes.trim(), 10)?;
        let patient = patients
            .iter()
            .find(|p| p.id == Some(patient_id))
            .cloned()
            .ok_or(FormError::PatientNotFound { id: patient_id })?;
        Ok(MedicalRecord {
            id: None,
            patient,
            notes: self.notes,
            last_updated: today,
            treatments: Vec::new(),
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct TreatmentDraft {
    pub record_id: u64,
    /// Defaults to today.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub instructions: String,
    pub physician_id: Option<u64>,
    pub medication_ids: Vec<u64>,
}

impl TreatmentDraft {
    pub fn into_treatment(
        self,
        physicians: &[User],
        medications: &[Medication],
        today: NaiveDate,
    ) -> Result<Treatment, FormError> {
        let start_date = self.start_date.unwrap_or(today);
        let (Some(end_date), Some(physician_id)) = (self.end_date, self.physician_id) else {
            return Err(FormError::TreatmentIncomplete);
        };
        if self.instructions.is_empty() || self.medication_ids.is_empty() {
            return Err(FormError::TreatmentIncomplete);
        }

        let physician = physicians
            .iter()
            .find(|u| u.id == Some(physician_id))
            .map(|u| User {
                role_id: Some(Role::Physician.id()),
                ..u.snapshot()
            })
            .ok_or(FormError::UnknownPhysician { id: physician_id })?;

        if let Some(unknown) = self
            .medication_ids
            .iter()
            .find(|id| !medications.iter().any(|m| m.id == Some(**id)))
        {
            return Err(FormError::UnknownMedication { id: *unknown });
        }
        // Catalogue order, each medication at most once.
        let chosen: Vec<Medication> = medications
            .iter()
            .filter(|m| m.id.is_some_and(|id| self.medication_ids.contains(&id)))
            .cloned()
            .collect();

        Ok(Treatment {
            id: None,
            record: Some(RecordRef { id: self.record_id }),
            physician: Some(physician),
            start_date,
            end_date,
            instructions: self.instructions,
            medications: chosen,
        })
    }
}
