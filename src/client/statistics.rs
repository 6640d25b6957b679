use super::{ApiClient, ClientError};
use crate::models::Statistics;

impl ApiClient {
    async fn count(&self, path: &str) -> Result<u64, ClientError> {
        self.get_json(path).await
    }

    /// Fetches the four dashboard counters concurrently. Any failure is logged
    /// and the whole summary falls back to zero.
    pub async fn statistics(&self) -> Statistics {
        let counts = futures::try_join!(
            self.count("/estadisticas/total-usuarios"),
            self.count("/estadisticas/total-pacientes"),
            self.count("/estadisticas/total-citas-programadas"),
            self.count("/estadisticas/total-medicamentos"),
        );
        match counts {
            Ok((users, patients, appointments, medications)) => Statistics {
                total_users: users,
                total_patients: patients,
                total_scheduled_appointments: appointments,
                total_medications: medications,
            },
            Err(e) => {
                tracing::warn!(error = %e, "failed to load statistics, showing zeros");
                Statistics::default()
            }
        }
    }
}
