use reqwest::Method;

use super::{ApiClient, ClientError};
use crate::models::{Patient, PatientUpdate};

impl ApiClient {
    pub async fn list_patients(&self) -> Result<Vec<Patient>, ClientError> {
        self.get_json("/pacientes").await
    }

    pub async fn patient(&self, id: u64) -> Result<Patient, ClientError> {
        self.get_json(&format!("/pacientes/{id}")).await
    }

    pub async fn create_patient(&self, patient: &Patient) -> Result<Patient, ClientError> {
        self.post_json("/pacientes", patient).await
    }

    pub async fn update_patient(&self, id: u64, update: &PatientUpdate) -> Result<(), ClientError> {
        self.send_only(Method::PUT, &format!("/pacientes/{id}"), update)
            .await
    }

    pub async fn delete_patient(&self, id: u64) -> Result<(), ClientError> {
        self.delete(&format!("/pacientes/{id}")).await
    }
}
