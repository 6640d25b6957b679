//! Role-scoped screens and the URL paths they live under.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::models::Role;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Area {
    Dashboard,
    Users,
    Patients,
    Medications,
    MedicalRecords,
    Treatments,
}

impl Area {
    pub fn label(self) -> &'static str {
        match self {
            Area::Dashboard => "dashboard",
            Area::Users => "users",
            Area::Patients => "patients",
            Area::Medications => "medications",
            Area::MedicalRecords => "medical records",
            Area::Treatments => "treatments",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    AdminDashboard,
    AdminUsers,
    AdminPatients,
    AdminMedications,
    PhysicianDashboard,
    PhysicianPatients,
    PhysicianRecords,
    PhysicianTreatments,
    NurseDashboard,
    NursePatients,
}

impl Screen {
    pub const ALL: [Screen; 10] = [
        Screen::AdminDashboard,
        Screen::AdminUsers,
        Screen::AdminPatients,
        Screen::AdminMedications,
        Screen::PhysicianDashboard,
        Screen::PhysicianPatients,
        Screen::PhysicianRecords,
        Screen::PhysicianTreatments,
        Screen::NurseDashboard,
        Screen::NursePatients,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Screen::AdminDashboard => "/admin/dashboard",
            Screen::AdminUsers => "/admin/usuarios",
            Screen::AdminPatients => "/admin/pacientes",
            Screen::AdminMedications => "/admin/medicamentos",
            Screen::PhysicianDashboard => "/medico/dashboard",
            Screen::PhysicianPatients => "/medico/pacientes",
            Screen::PhysicianRecords => "/medico/historias-clinicas",
            Screen::PhysicianTreatments => "/medico/tratamientos",
            Screen::NurseDashboard => "/enfermera/dashboard",
            Screen::NursePatients => "/enfermera/pacientes",
        }
    }

    pub fn role(self) -> Role {
        match self {
            Screen::AdminDashboard
            | Screen::AdminUsers
            | Screen::AdminPatients
            | Screen::AdminMedications => Role::Administrator,
            Screen::PhysicianDashboard
            | Screen::PhysicianPatients
            | Screen::PhysicianRecords
            | Screen::PhysicianTreatments => Role::Physician,
            Screen::NurseDashboard | Screen::NursePatients => Role::Nurse,
        }
    }

    pub fn area(self) -> Area {
        match self {
            Screen::AdminDashboard | Screen::PhysicianDashboard | Screen::NurseDashboard => {
                Area::Dashboard
            }
            Screen::AdminUsers => Area::Users,
            Screen::AdminPatients | Screen::PhysicianPatients | Screen::NursePatients => {
                Area::Patients
            }
            Screen::AdminMedications => Area::Medications,
            Screen::PhysicianRecords => Area::MedicalRecords,
            Screen::PhysicianTreatments => Area::Treatments,
        }
    }

    /// Whether the screen offers create/edit/delete actions. The physician
    /// and nurse patient lists are read-only.
    pub fn is_editable(self) -> bool {
        !matches!(
            self,
            Screen::AdminDashboard
                | Screen::PhysicianDashboard
                | Screen::NurseDashboard
                | Screen::PhysicianPatients
                | Screen::NursePatients
        )
    }

    /// Dashboards backed by the statistics endpoints.
    pub fn shows_statistics(self) -> bool {
        self == Screen::AdminDashboard
    }

    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim();
        let normalized = if trimmed.len() > 1 {
            trimmed.trim_end_matches('/')
        } else {
            trimmed
        };
        Self::ALL.into_iter().find(|s| s.path() == normalized)
    }

    pub fn for_role(role: Role) -> Vec<Screen> {
        Self::ALL.into_iter().filter(|s| s.role() == role).collect()
    }

    pub fn find(role: Role, area: Area) -> Option<Screen> {
        Self::ALL
            .into_iter()
            .find(|s| s.role() == role && s.area() == area)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("role {role} has no {} screen", .area.label())]
    NoScreen { role: Role, area: Area },

    #[error("{screen} is read-only for role {role}")]
    ReadOnly { role: Role, screen: Screen },

    #[error("no screen at '{path}'")]
    NotFound { path: String },

    #[error("{screen} belongs to role {}, not {role}", .screen.role())]
    WrongRole { role: Role, screen: Screen },
}

/// Resolves the screen `role` uses for `area`, requiring an editable screen
/// when the caller is about to mutate data.
pub fn authorize(role: Role, area: Area, mutates: bool) -> Result<Screen, AccessError> {
    let screen = Screen::find(role, area).ok_or(AccessError::NoScreen { role, area })?;
    if mutates && !screen.is_editable() {
        return Err(AccessError::ReadOnly { role, screen });
    }
    Ok(screen)
}

/// Resolves a URL path to a screen the active role may open.
pub fn open(role: Role, path: &str) -> Result<Screen, AccessError> {
    let screen = Screen::from_path(path).ok_or_else(|| AccessError::NotFound {
        path: path.to_string(),
    })?;
    if screen.role() != role {
        return Err(AccessError::WrongRole { role, screen });
    }
    Ok(screen)
}
