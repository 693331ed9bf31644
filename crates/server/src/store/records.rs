use std::collections::HashMap;
use std::sync::Arc;

use assistant_core::{Appointment, AppointmentStatus, DispatchError, EmergencyReport, PatientId};
use chrono::Utc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Records {
    appointments: HashMap<PatientId, Appointment>,
    emergencies: HashMap<PatientId, Vec<EmergencyReport>>,
}

/// Appointments and emergency reports keyed by patient
#[derive(Clone, Default)]
pub struct PatientRecordStore {
    records: Arc<RwLock<Records>>,
}

impl PatientRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scheduled appointment unless the patient already holds an
    /// active one. Check and insert happen under the same write lock.
    pub async fn schedule(
        &self,
        patient_id: &PatientId,
        time: &str,
    ) -> Result<Appointment, DispatchError> {
        let mut records = self.records.write().await;

        if let Some(existing) = records
            .appointments
            .get(patient_id)
            .filter(|a| a.is_active())
        {
            return Err(DispatchError::AlreadyBooked {
                patient_id: patient_id.to_string(),
                time: existing.scheduled_time.clone(),
            });
        }

        let appointment = Appointment::scheduled(patient_id.clone(), time);
        records
            .appointments
            .insert(patient_id.clone(), appointment.clone());
        Ok(appointment)
    }

    pub async fn appointment(&self, patient_id: &PatientId) -> Option<Appointment> {
        let records = self.records.read().await;
        records.appointments.get(patient_id).cloned()
    }

    /// Move the patient's appointment to a new status. Returns the updated
    /// appointment, or `None` when the patient has never booked.
    pub async fn update_status(
        &self,
        patient_id: &PatientId,
        status: AppointmentStatus,
    ) -> Option<Appointment> {
        let mut records = self.records.write().await;
        let appointment = records.appointments.get_mut(patient_id)?;
        appointment.status = status;
        Some(appointment.clone())
    }

    /// Append an emergency report; earlier reports are kept as they are
    pub async fn append_emergency(&self, patient_id: &PatientId, details: &str) -> EmergencyReport {
        let report = EmergencyReport {
            patient_id: patient_id.clone(),
            details: details.to_string(),
            reported_at: Utc::now(),
        };

        let mut records = self.records.write().await;
        records
            .emergencies
            .entry(patient_id.clone())
            .or_default()
            .push(report.clone());
        report
    }

    pub async fn emergencies(&self, patient_id: &PatientId) -> Vec<EmergencyReport> {
        let records = self.records.read().await;
        records
            .emergencies
            .get(patient_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(id: &str) -> PatientId {
        PatientId::new(id).unwrap()
    }

    #[tokio::test]
    async fn second_booking_is_rejected_not_overwritten() {
        let store = PatientRecordStore::new();
        let p = patient("p1");

        let first = store.schedule(&p, "10:00").await.unwrap();
        assert_eq!(first.status, AppointmentStatus::Scheduled);

        let err = store.schedule(&p, "11:00").await.unwrap_err();
        assert_eq!(
            err,
            DispatchError::AlreadyBooked {
                patient_id: "p1".to_string(),
                time: "10:00".to_string(),
            }
        );
        assert_eq!(store.appointment(&p).await.unwrap().scheduled_time, "10:00");
    }

    #[tokio::test]
    async fn concurrent_bookings_create_one_appointment() {
        let store = PatientRecordStore::new();
        let p = patient("racer");

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                let p = p.clone();
                tokio::spawn(async move { store.schedule(&p, &format!("{i}:00")).await })
            })
            .collect();

        let mut booked = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                booked += 1;
            }
        }
        assert_eq!(booked, 1);
    }

    #[tokio::test]
    async fn emergencies_accumulate() {
        let store = PatientRecordStore::new();
        let p = patient("p1");

        store.append_emergency(&p, "snake bite").await;
        store.append_emergency(&p, "fever").await;

        let details: Vec<_> = store
            .emergencies(&p)
            .await
            .into_iter()
            .map(|r| r.details)
            .collect();
        assert_eq!(details, ["snake bite", "fever"]);
        assert!(store.emergencies(&patient("p2")).await.is_empty());
    }

    #[tokio::test]
    async fn cancelled_appointment_frees_the_slot() {
        let store = PatientRecordStore::new();
        let p = patient("p1");

        assert!(store.update_status(&p, AppointmentStatus::Cancelled).await.is_none());

        store.schedule(&p, "10:00").await.unwrap();
        let cancelled = store
            .update_status(&p, AppointmentStatus::Cancelled)
            .await
            .unwrap();
        assert!(!cancelled.is_active());

        let rebooked = store.schedule(&p, "11:00").await.unwrap();
        assert_eq!(rebooked.status, AppointmentStatus::Scheduled);
        assert_eq!(store.appointment(&p).await.unwrap().scheduled_time, "11:00");
    }
}
