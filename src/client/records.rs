use super::{ApiClient, ClientError};
use crate::models::MedicalRecord;

impl ApiClient {
    pub async fn list_records(&self) -> Result<Vec<MedicalRecord>, ClientError> {
        self.get_json("/historias").await
    }

    /// A single record including its treatments.
    pub async fn record(&self, id: u64) -> Result<MedicalRecord, ClientError> {
        self.get_json(&format!("/historias/{id}")).await
    }

    pub async fn create_record(
        &self,
        record: &MedicalRecord,
    ) -> Result<MedicalRecord, ClientError> {
        self.post_json("/historias", record).await
    }
}
