use serde::Serialize;

/// Dashboard counters. All zero when the backend could not be reached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total_users: u64,
    pub total_patients: u64,
    pub total_scheduled_appointments: u64,
    pub total_medications: u64,
}
