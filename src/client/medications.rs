use reqwest::Method;

use super::{ApiClient, ClientError};
use crate::models::{Medication, MedicationUpdate};

impl ApiClient {
    pub async fn list_medications(&self) -> Result<Vec<Medication>, ClientError> {
        self.get_json("/medicamentos").await
    }

    pub async fn medication(&self, id: u64) -> Result<Medication, ClientError> {
        self.get_json(&format!("/medicamentos/{id}")).await
    }

    pub async fn create_medication(
        &self,
        medication: &Medication,
    ) -> Result<Medication, ClientError> {
        self.post_json("/medicamentos", medication).await
    }

    pub async fn update_medication(
        &self,
        id: u64,
        update: &MedicationUpdate,
    ) -> Result<(), ClientError> {
        self.send_only(Method::PUT, &format!("/medicamentos/{id}"), update)
            .await
    }

    pub async fn delete_medication(&self, id: u64) -> Result<(), ClientError> {
        self.delete(&format!("/medicamentos/{id}")).await
    }
}
