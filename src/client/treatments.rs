use reqwest::Method;

use super::{ApiClient, ClientError};
use crate::models::{Treatment, TreatmentUpdate};

impl ApiClient {
    pub async fn treatment(&self, id: u64) -> Result<Treatment, ClientError> {
        self.get_json(&format!("/tratamientos/{id}")).await
    }

    pub async fn create_treatment(&self, treatment: &Treatment) -> Result<Treatment, ClientError> {
        self.post_json("/tratamientos", treatment).await
    }

    pub async fn update_treatment(
        &self,
        id: u64,
        update: &TreatmentUpdate,
    ) -> Result<(), ClientError> {
        self.send_only(Method::PUT, &format!("/tratamientos/{id}"), update)
            .await
    }

    /// Associates medications with a treatment. The body is the bare list of
    /// medication ids.
    pub async fn add_medications(
        &self,
        treatment_id: u64,
        medication_ids: &[u64],
    ) -> Result<(), ClientError> {
        self.send_only(
            Method::POST,
            &format!("/tratamientos/{treatment_id}/medicamentos"),
            medication_ids,
        )
        .await
    }

    pub async fn remove_medication(
        &self,
        treatment_id: u64,
        medication_id: u64,
    ) -> Result<(), ClientError> {
        self.delete(&format!(
            "/tratamientos/{treatment_id}/medicamentos/{medication_id}"
        ))
        .await
    }
}
