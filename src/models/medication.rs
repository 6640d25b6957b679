use serde::{Deserialize, Serialize};

use super::id_text;
use crate::table::{Filterable, MatchRule};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    #[serde(rename = "idMedicamento", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "contraindicaciones", default)]
    pub contraindications: String,
    #[serde(rename = "dosisRecomendada")]
    pub recommended_dosage: String,
}

impl Filterable for Medication {
    const FILTER_FIELDS: &'static [(&'static str, MatchRule)] = &[
        ("id", MatchRule::Contains),
        ("name", MatchRule::Contains),
        ("description", MatchRule::Contains),
    ];

    fn field_text(&self, field: &str) -> Option<String> {
        match field {
            "id" => id_text(self.id),
            "name" => Some(self.name.clone()),
            "description" => Some(self.description.clone()),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MedicationUpdate {
    #[serde(rename = "nombre", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "contraindicaciones", skip_serializing_if = "Option::is_none")]
    pub contraindications: Option<String>,
    #[serde(rename = "dosisRecomendada", skip_serializing_if = "Option::is_none")]
    pub recommended_dosage: Option<String>,
}
