use reqwest::Method;

use super::{ApiClient, ClientError};
use crate::models::{User, UserUpdate};

impl ApiClient {
    pub async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        self.get_json("/usuarios").await
    }

    /// Accounts with the physician role, as offered when assigning treatments.
    pub async fn list_physicians(&self) -> Result<Vec<User>, ClientError> {
        self.get_json("/usuarios/medicos").await
    }

    /// Loads an account for the edit form.
    pub async fn user_for_edit(&self, id: u64) -> Result<User, ClientError> {
        self.get_json(&format!("/usuarios/newpassword/{id}")).await
    }

    pub async fn create_user(&self, user: &User) -> Result<User, ClientError> {
        self.post_json("/usuarios", user).await
    }

    pub async fn update_user(&self, id: u64, update: &UserUpdate) -> Result<(), ClientError> {
        self.send_only(Method::PUT, &format!("/usuarios/{id}"), update)
            .await
    }

    pub async fn delete_user(&self, id: u64) -> Result<(), ClientError> {
        self.delete(&format!("/usuarios/{id}")).await
    }
}
