use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::patient::PatientId;

/// Appointment lifecycle status. Booking produces `Scheduled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub patient_id: PatientId,
    /// Time exactly as supplied; interpretation is left to the model
    pub scheduled_time: String,
    pub status: AppointmentStatus,
}

impl Appointment {
    pub fn scheduled(patient_id: PatientId, scheduled_time: impl Into<String>) -> Self {
        Self {
            patient_id,
            scheduled_time: scheduled_time.into(),
            status: AppointmentStatus::Scheduled,
        }
    }

    /// Whether this appointment still occupies the patient's single slot
    pub fn is_active(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyReport {
    pub patient_id: PatientId,
    pub details: String,
    pub reported_at: DateTime<Utc>,
}
