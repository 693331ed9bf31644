use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use assistant_core::PatientId;
use tokio::sync::OwnedMutexGuard;

type LockMap = HashMap<PatientId, Arc<tokio::sync::Mutex<()>>>;

/// One async mutex per patient. Holding a patient's guard serializes that
/// patient's turns; other patients are unaffected. An entry lives only while
/// some turn holds or waits on it.
#[derive(Default)]
pub struct TurnLocks {
    locks: Arc<Mutex<LockMap>>,
}

impl TurnLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other turn for this patient is in flight
    pub async fn acquire(&self, patient_id: &PatientId) -> TurnGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(patient_id.clone()).or_default())
        };
        TurnGuard {
            guard: Some(lock.lock_owned().await),
            patient_id: patient_id.clone(),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of patients with a turn in flight or queued
    pub fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Held for the duration of one turn. Dropping it lets the next queued turn
/// run and forgets the patient's mutex once nobody else refers to it.
pub struct TurnGuard {
    guard: Option<OwnedMutexGuard<()>>,
    patient_id: PatientId,
    locks: Arc<Mutex<LockMap>>,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // The map holds one reference; any other is a queued turn or a caller about to lock
        if locks
            .get(&self.patient_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.patient_id);
        }
    }
}
