//! Tool dispatch against the patient record store

use assistant_core::{Appointment, Capability, DispatchError, PatientId};
use chrono::NaiveTime;

use crate::store::PatientRecordStore;

const REPORT_BODY: &str = "Blood pressure - 120/80, Cholesterol - 190 mg/dL.";

/// How strictly appointment times are checked before booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimePolicy {
    /// Any non-blank value is booked exactly as given
    #[default]
    Lenient,
    /// Value must be `HH:MM` on a 24-hour clock
    Strict24h,
}

impl TimePolicy {
    fn check(self, time: &str) -> Result<(), DispatchError> {
        if time.is_empty() {
            return Err(DispatchError::MissingTime);
        }
        match self {
            TimePolicy::Lenient => Ok(()),
            TimePolicy::Strict24h => NaiveTime::parse_from_str(time, "%H:%M")
                .map(|_| ())
                .map_err(|_| DispatchError::InvalidTime {
                    value: time.to_string(),
                }),
        }
    }
}

/// Who may receive a medical report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportPolicy {
    /// Only patients with an appointment on file
    #[default]
    RequireAppointment,
    Open,
}

/// Runs the three backend capabilities for a patient
#[derive(Clone)]
pub struct ToolDispatcher {
    records: PatientRecordStore,
    time_policy: TimePolicy,
    report_policy: ReportPolicy,
}

impl ToolDispatcher {
    pub fn new(records: PatientRecordStore) -> Self {
        Self {
            records,
            time_policy: TimePolicy::default(),
            report_policy: ReportPolicy::default(),
        }
    }

    pub fn with_time_policy(mut self, policy: TimePolicy) -> Self {
        self.time_policy = policy;
        self
    }

    pub fn with_report_policy(mut self, policy: ReportPolicy) -> Self {
        self.report_policy = policy;
        self
    }

    pub fn records(&self) -> &PatientRecordStore {
        &self.records
    }

    /// Route a capability to its handler. `value` is the tool-specific
    /// parameter (time or details) and is ignored by `get_report`.
    pub async fn dispatch(
        &self,
        patient_id: &PatientId,
        capability: Capability,
        value: Option<&str>,
    ) -> Result<String, DispatchError> {
        let value = value.unwrap_or_default();
        let result = match capability {
            Capability::BookAppointment => self.book_appointment(patient_id, value).await,
            Capability::GetReport => self.get_report(patient_id).await,
            Capability::ReportEmergency => self.report_emergency(patient_id, value).await,
        };

        let outcome = if result.is_ok() { "ok" } else { "rejected" };
        metrics::counter!(
            "assistant_tool_dispatch_total",
            "tool" => capability.as_str(),
            "result" => outcome
        )
        .increment(1);

        result
    }

    pub async fn book_appointment(
        &self,
        patient_id: &PatientId,
        time: &str,
    ) -> Result<String, DispatchError> {
        let time = time.trim();
        self.time_policy.check(time)?;

        let appointment = self.records.schedule(patient_id, time).await?;
        tracing::info!(patient_id = %patient_id, time = %appointment.scheduled_time, "Appointment booked");

        Ok(format!(
            "Appointment booked successfully for {} at {}.",
            patient_id, appointment.scheduled_time
        ))
    }

    pub async fn get_report(&self, patient_id: &PatientId) -> Result<String, DispatchError> {
        if self.report_policy == ReportPolicy::RequireAppointment
            && self
                .records
                .appointment(patient_id)
                .await
                .filter(Appointment::is_active)
                .is_none()
        {
            return Err(DispatchError::NoRecord {
                patient_id: patient_id.to_string(),
            });
        }

        Ok(format!("Medical report for {patient_id}: {REPORT_BODY}"))
    }

    pub async fn report_emergency(
        &self,
        patient_id: &PatientId,
        details: &str,
    ) -> Result<String, DispatchError> {
        let details = details.trim();
        if details.is_empty() {
            return Err(DispatchError::MissingDetails);
        }

        self.records.append_emergency(patient_id, details).await;
        tracing::warn!(patient_id = %patient_id, details_len = details.len(), "Emergency reported");

        Ok(format!(
            "Emergency reported for {patient_id}. Details: {details}. Help is on the way!"
        ))
    }
}
