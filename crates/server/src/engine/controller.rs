//! Dialogue controller: drives one patient turn from message to reply
//!
//! Per patient the controller is either idle or waiting on a single missing
//! tool parameter. An idle turn goes through the model; a waiting turn takes
//! the message as the missing value and goes straight to the dispatcher.
//! Either way exactly one user turn and one bot turn are recorded.

use std::sync::Arc;
use std::time::{Duration, Instant};

use assistant_core::{
    Capability, ParseFailure, ParsedDecision, PatientId, PendingSlotRequest, decision, prompt,
};
use chrono::Utc;
use thiserror::Error;

use super::dispatcher::ToolDispatcher;
use super::locks::TurnLocks;
use crate::ai::{CompletionProvider, ProviderError};
use crate::store::ConversationStore;

/// Reply used when the model cannot be reached or answers with garbage
pub const DEGRADED_REPLY: &str =
    "Sorry, I'm having trouble understanding right now. Please try again in a moment.";

/// Reply used when a turn fails for an unexpected internal reason
pub const INTERNAL_ERROR_REPLY: &str = "An error occurred. Please try again later.";

const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_HISTORY_WINDOW: usize = 20;

/// Why a fresh request could not produce a decision
#[derive(Debug, Error)]
enum TurnFailure {
    #[error("model provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("model reply could not be parsed: {0}")]
    Parse(#[from] ParseFailure),
}

/// What a turn produced, before it is committed
struct TurnOutcome {
    reply: String,
    pending: Option<PendingSlotRequest>,
    path: &'static str,
}

pub struct DialogueController {
    provider: Arc<dyn CompletionProvider>,
    conversations: ConversationStore,
    dispatcher: ToolDispatcher,
    locks: TurnLocks,
    model_timeout: Duration,
    history_window: usize,
}

impl DialogueController {
    pub fn new(provider: Arc<dyn CompletionProvider>, dispatcher: ToolDispatcher) -> Self {
        Self {
            provider,
            conversations: ConversationStore::new(),
            dispatcher,
            locks: TurnLocks::new(),
            model_timeout: DEFAULT_MODEL_TIMEOUT,
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }

    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    pub fn with_history_window(mut self, turns: usize) -> Self {
        self.history_window = turns;
        self
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Process one inbound message and return the reply for the patient.
    ///
    /// Turns for the same patient are queued behind each other. The turn lock
    /// is owned by a supervising task, so it stays held until the turn is
    /// committed even if the caller goes away. The turn itself runs on its
    /// own task so a panic inside it still yields a reply and a recorded
    /// user/bot pair.
    pub async fn respond(self: &Arc<Self>, patient_id: &PatientId, message: &str) -> String {
        let turn = self.locks.acquire(patient_id).await;

        let engine = Arc::clone(self);
        let (id, text) = (patient_id.clone(), message.to_string());
        let supervisor = tokio::spawn(async move {
            let _turn = turn;
            engine.supervise_turn(id, text).await
        });

        supervisor.await.unwrap_or_else(|err| {
            tracing::error!(patient_id = %patient_id, error = %err, "Turn supervisor failed");
            INTERNAL_ERROR_REPLY.to_string()
        })
    }

    /// Run one turn while the caller holds the patient's turn lock
    async fn supervise_turn(self: Arc<Self>, patient_id: PatientId, message: String) -> String {
        let engine = Arc::clone(&self);
        let (id, text) = (patient_id.clone(), message.clone());
        let worker = tokio::spawn(async move { engine.run_turn(&id, &text).await });

        match worker.await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!(patient_id = %patient_id, error = %err, "Turn aborted");
                metrics::counter!("assistant_turns_total", "path" => "internal").increment(1);
                self.conversations
                    .commit_turn(&patient_id, &message, INTERNAL_ERROR_REPLY, None)
                    .await;
                INTERNAL_ERROR_REPLY.to_string()
            }
        }
    }

    async fn run_turn(&self, patient_id: &PatientId, message: &str) -> String {
        let outcome = match self.conversations.pending(patient_id).await {
            Some(request) => self.complete_slot(patient_id, request, message).await,
            None => self.fresh_request(patient_id, message).await,
        };

        metrics::counter!("assistant_turns_total", "path" => outcome.path).increment(1);
        self.conversations
            .commit_turn(patient_id, message, &outcome.reply, outcome.pending)
            .await;
        outcome.reply
    }

    async fn fresh_request(&self, patient_id: &PatientId, message: &str) -> TurnOutcome {
        let history = self
            .conversations
            .recent_history(patient_id, self.history_window)
            .await;
        let prompt = prompt::build(Utc::now(), history.as_deref(), message);

        let decision = match self.consult_model(&prompt).await {
            Ok(decision) => decision,
            Err(failure) => {
                tracing::warn!(patient_id = %patient_id, error = %failure, "Degraded turn");
                return TurnOutcome {
                    reply: DEGRADED_REPLY.to_string(),
                    pending: None,
                    path: "degraded",
                };
            }
        };

        tracing::info!(
            patient_id = %patient_id,
            tool = decision.tool.as_str(),
            missing = ?decision.missing_field,
            "Model decision"
        );

        let Some(capability) = decision.tool.capability() else {
            return TurnOutcome {
                reply: decision.output_text,
                pending: None,
                path: "fresh",
            };
        };

        match decision.missing_field {
            Some(missing_field) => {
                let reply = if decision.output_text.trim().is_empty() {
                    format!("Could you please provide the {missing_field}?")
                } else {
                    decision.output_text
                };
                TurnOutcome {
                    reply,
                    pending: Some(PendingSlotRequest {
                        tool: capability,
                        missing_field,
                    }),
                    path: "fresh",
                }
            }
            None => TurnOutcome {
                reply: self
                    .run_tool(patient_id, capability, decision.supplied_value.as_deref())
                    .await,
                pending: None,
                path: "fresh",
            },
        }
    }

    async fn complete_slot(
        &self,
        patient_id: &PatientId,
        request: PendingSlotRequest,
        message: &str,
    ) -> TurnOutcome {
        tracing::info!(
            patient_id = %patient_id,
            tool = request.tool.as_str(),
            field = %request.missing_field,
            "Filling pending slot"
        );

        TurnOutcome {
            reply: self.run_tool(patient_id, request.tool, Some(message)).await,
            pending: None,
            path: "slot",
        }
    }

    async fn run_tool(
        &self,
        patient_id: &PatientId,
        capability: Capability,
        value: Option<&str>,
    ) -> String {
        match self.dispatcher.dispatch(patient_id, capability, value).await {
            Ok(reply) => reply,
            Err(rejection) => {
                tracing::info!(
                    patient_id = %patient_id,
                    tool = capability.as_str(),
                    reason = %rejection,
                    "Tool rejected"
                );
                rejection.to_string()
            }
        }
    }

    async fn consult_model(&self, prompt: &str) -> Result<ParsedDecision, TurnFailure> {
        let started = Instant::now();
        let result = tokio::time::timeout(self.model_timeout, self.provider.complete(prompt)).await;
        metrics::histogram!("assistant_model_call_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        let raw = result.map_err(|_| TurnFailure::Timeout(self.model_timeout))??;
        Ok(decision::parse(&raw)?)
    }
}
