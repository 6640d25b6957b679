use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::id_text;
use crate::table::{Filterable, MatchRule};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(rename = "idPaciente", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(rename = "nombre")]
    pub given_name: String,
    #[serde(rename = "apellido")]
    pub family_name: String,
    #[serde(rename = "fechaNacimiento")]
    pub birth_date: NaiveDate,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(rename = "correo")]
    pub email: String,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }
}

impl Filterable for Patient {
    const FILTER_FIELDS: &'static [(&'static str, MatchRule)] = &[
        ("id", MatchRule::Contains),
        ("name", MatchRule::Contains),
        ("email", MatchRule::Contains),
    ];

    fn field_text(&self, field: &str) -> Option<String> {
        match field {
            "id" => id_text(self.id),
            "name" => Some(self.given_name.clone()),
            "email" => Some(self.email.clone()),
            _ => None,
        }
    }
}

/// Partial update; only the fields that are set are sent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PatientUpdate {
    #[serde(rename = "nombre", skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(rename = "apellido", skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(rename = "fechaNacimiento", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "telefono", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "correo", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl PatientUpdate {
    pub fn is_empty(&self) -> bool {
        self.given_name.is_none()
            && self.family_name.is_none()
            && self.birth_date.is_none()
            && self.phone.is_none()
            && self.email.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_backend_field_names() {
        let patient: Patient = serde_json::from_str(
            r#"{"idPaciente":7,"nombre":"Ana","apellido":"Ruiz","fechaNacimiento":"1990-05-17","telefono":"5551234567","correo":"ana@example.com"}"#,
        )
        .unwrap();
        assert_eq!(patient.id, Some(7));
        assert_eq!(patient.full_name(), "Ana Ruiz");
        assert_eq!(
            patient.birth_date,
            NaiveDate::from_ymd_opt(1990, 5, 17).unwrap()
        );
    }

    #[test]
    fn unsaved_patient_omits_id() {
        let patient = Patient {
            id: None,
            given_name: "Ana".into(),
            family_name: "Ruiz".into(),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
            phone: "5551234567".into(),
            email: "ana@example.com".into(),
        };
        let json = serde_json::to_value(&patient).unwrap();
        assert!(json.get("idPaciente").is_none());
        assert_eq!(json["fechaNacimiento"], "1990-05-17");
    }

    #[test]
    fn update_sends_only_set_fields() {
        let update = PatientUpdate {
            phone: Some("5550000000".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(json, r#"{"telefono":"5550000000"}"#);
    }
}
