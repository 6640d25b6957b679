use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{id_text, Medication, Patient, User};
use crate::table::{Filterable, MatchRule};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalRecord {
    #[serde(rename = "idHistoria", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(rename = "paciente")]
    pub patient: Patient,
    #[serde(rename = "notasMedicas")]
    pub notes: String,
    #[serde(rename = "fechaUltimaActualizacion")]
    pub last_updated: NaiveDate,
    #[serde(rename = "tratamientos", default, skip_serializing_if = "Vec::is_empty")]
    pub treatments: Vec<Treatment>,
}

impl Filterable for MedicalRecord {
    const FILTER_FIELDS: &'static [(&'static str, MatchRule)] = &[
        ("id", MatchRule::Contains),
        ("name", MatchRule::Contains),
        ("date", MatchRule::Exact),
    ];

    fn field_text(&self, field: &str) -> Option<String> {
        match field {
            "id" => id_text(self.id),
            "name" => Some(self.patient.given_name.clone()),
            "date" => Some(self.last_updated.format("%Y-%m-%d").to_string()),
            _ => None,
        }
    }
}

/// Back-reference from a treatment to the record that owns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    #[serde(rename = "idHistoria")]
    pub id: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treatment {
    #[serde(rename = "idTratamiento", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    // Omitted by the backend when the treatment is nested inside its record.
    #[serde(rename = "historiaClinica", default, skip_serializing_if = "Option::is_none")]
    pub record: Option<RecordRef>,
    #[serde(rename = "medico", default, skip_serializing_if = "Option::is_none")]
    pub physician: Option<User>,
    #[serde(rename = "fechaInicio")]
    pub start_date: NaiveDate,
    #[serde(rename = "fechaFin")]
    pub end_date: NaiveDate,
    #[serde(rename = "indicaciones")]
    pub instructions: String,
    #[serde(rename = "medicamentos", default)]
    pub medications: Vec<Medication>,
}

impl Treatment {
    pub fn medication_ids(&self) -> Vec<u64> {
        self.medications.iter().filter_map(|m| m.id).collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TreatmentUpdate {
    #[serde(rename = "fechaInicio", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "fechaFin", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "indicaciones", skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl TreatmentUpdate {
    pub fn is_empty(&self) -> bool {
        self.start_date.is_none() && self.end_date.is_none() && self.instructions.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = r#"{
        "idHistoria": 4,
        "paciente": {"idPaciente":7,"nombre":"Ana","apellido":"Ruiz","fechaNacimiento":"1990-05-17","telefono":"5551234567","correo":"ana@example.com"},
        "notasMedicas": "Seasonal allergies, follow up in spring.",
        "fechaUltimaActualizacion": "2024-03-01"
    }"#;

    #[test]
    fn record_without_treatments_key_has_empty_list() {
        let record: MedicalRecord = serde_json::from_str(RECORD).unwrap();
        assert!(record.treatments.is_empty());
        assert_eq!(record.field_text("date").as_deref(), Some("2024-03-01"));
        assert_eq!(record.field_text("name").as_deref(), Some("Ana"));
    }

    #[test]
    fn nested_treatment_decodes_without_back_reference() {
        let treatment: Treatment = serde_json::from_str(
            r#"{"idTratamiento":9,"medico":{"idUsuario":2,"nombreUsuario":"drlopez","rolId":2},
                "fechaInicio":"2024-03-01","fechaFin":"2024-03-15","indicaciones":"Every 8h",
                "medicamentos":[{"idMedicamento":5,"nombre":"Ibuprofen","descripcion":"NSAID","contraindicaciones":"Ulcers","dosisRecomendada":"400mg"}]}"#,
        )
        .unwrap();
        assert_eq!(treatment.record, None);
        assert_eq!(treatment.medication_ids(), vec![5]);
        assert_eq!(
            treatment.physician.as_ref().map(|p| p.username.as_str()),
            Some("drlopez")
        );
    }
}
