use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id_text;
use crate::table::{Filterable, MatchRule};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Administrator,
    Physician,
    Nurse,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Administrator, Role::Physician, Role::Nurse];

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Administrator),
            2 => Some(Role::Physician),
            3 => Some(Role::Nurse),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        match self {
            Role::Administrator => 1,
            Role::Physician => 2,
            Role::Nurse => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Administrator => "ADMINISTRATOR",
            Role::Physician => "PHYSICIAN",
            Role::Nurse => "NURSE",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "admin" | "administrator" | "administrador" => Ok(Role::Administrator),
            "2" | "physician" | "doctor" | "medico" | "médico" => Ok(Role::Physician),
            "3" | "nurse" | "enfermera" => Ok(Role::Nurse),
            other => Err(format!(
                "unknown role '{other}', expected admin, physician or nurse (or 1, 2, 3)"
            )),
        }
    }
}

/// An account. The password is write-only: it is sent on create/edit and is
/// never printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "idUsuario", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(rename = "nombreUsuario")]
    pub username: String,
    #[serde(rename = "contraseña", default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(rename = "rolId", default)]
    pub role_id: Option<u8>,
}

impl User {
    pub fn role(&self) -> Option<Role> {
        self.role_id.and_then(Role::from_id)
    }

    pub fn role_label(&self) -> &'static str {
        self.role().map(Role::label).unwrap_or("")
    }

    /// Copy without the password, for embedding in other records.
    pub fn snapshot(&self) -> User {
        User {
            password: None,
            ..self.clone()
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("role_id", &self.role_id)
            .finish()
    }
}

impl Filterable for User {
    const FILTER_FIELDS: &'static [(&'static str, MatchRule)] = &[
        ("id", MatchRule::Contains),
        ("name", MatchRule::Contains),
        ("role", MatchRule::Exact),
    ];

    fn field_text(&self, field: &str) -> Option<String> {
        match field {
            "id" => id_text(self.id),
            "name" => Some(self.username.clone()),
            "role" => self.role_id.map(|id| id.to_string()),
            _ => None,
        }
    }
}

#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserUpdate {
    #[serde(rename = "nombreUsuario", skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "contraseña", skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(rename = "rolId", skip_serializing_if = "Option::is_none")]
    pub role_id: Option<u8>,
}

impl fmt::Debug for UserUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserUpdate")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("role_id", &self.role_id)
            .finish()
    }
}
