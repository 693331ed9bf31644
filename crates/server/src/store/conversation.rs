use std::collections::HashMap;
use std::sync::Arc;

use assistant_core::{ConversationTurn, PatientId, PendingSlotRequest, Role};
use chrono::Utc;
use tokio::sync::RwLock;

/// Turn log and open slot-filling request for one patient
#[derive(Debug, Default)]
struct Thread {
    turns: Vec<ConversationTurn>,
    pending: Option<PendingSlotRequest>,
}

/// Append-only conversation log keyed by patient
#[derive(Clone, Default)]
pub struct ConversationStore {
    threads: Arc<RwLock<HashMap<PatientId, Thread>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single turn
    pub async fn record(&self, patient_id: &PatientId, role: Role, text: &str) {
        let mut threads = self.threads.write().await;
        threads
            .entry(patient_id.clone())
            .or_default()
            .turns
            .push(ConversationTurn::new(role, text, Utc::now()));
    }

    /// Full ordered history, or `None` on first contact
    pub async fn history(&self, patient_id: &PatientId) -> Option<Vec<ConversationTurn>> {
        let threads = self.threads.read().await;
        threads
            .get(patient_id)
            .filter(|thread| !thread.turns.is_empty())
            .map(|thread| thread.turns.clone())
    }

    /// The most recent `limit` turns, oldest first, or `None` on first contact
    pub async fn recent_history(
        &self,
        patient_id: &PatientId,
        limit: usize,
    ) -> Option<Vec<ConversationTurn>> {
        let threads = self.threads.read().await;
        threads
            .get(patient_id)
            .filter(|thread| !thread.turns.is_empty())
            .map(|thread| {
                let start = thread.turns.len().saturating_sub(limit);
                thread.turns[start..].to_vec()
            })
    }

    pub async fn turn_count(&self, patient_id: &PatientId) -> usize {
        let threads = self.threads.read().await;
        threads.get(patient_id).map_or(0, |thread| thread.turns.len())
    }

    pub async fn pending(&self, patient_id: &PatientId) -> Option<PendingSlotRequest> {
        let threads = self.threads.read().await;
        threads
            .get(patient_id)
            .and_then(|thread| thread.pending.clone())
    }

    pub async fn set_pending(&self, patient_id: &PatientId, request: Option<PendingSlotRequest>) {
        let mut threads = self.threads.write().await;
        threads.entry(patient_id.clone()).or_default().pending = request;
    }

    /// Record a complete turn in one step: the user message, the bot reply,
    /// and the slot-filling request left open afterwards (`None` clears it).
    pub async fn commit_turn(
        &self,
        patient_id: &PatientId,
        user_text: &str,
        bot_text: &str,
        pending: Option<PendingSlotRequest>,
    ) {
        let now = Utc::now();
        let mut threads = self.threads.write().await;
        let thread = threads.entry(patient_id.clone()).or_default();
        thread
            .turns
            .push(ConversationTurn::new(Role::User, user_text, now));
        thread
            .turns
            .push(ConversationTurn::new(Role::Bot, bot_text, now));
        thread.pending = pending;
    }
}
