//! Chat endpoint: the transport entry point into the dialogue engine

use axum::{Extension, Json, extract::State};
use assistant_core::PatientId;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::commands;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

/// Request body for chat
#[derive(Deserialize)]
pub struct ChatRequest {
    patient_id: String,
    message: String,
}

/// Response body for chat
#[derive(Serialize)]
pub struct ChatResponse {
    reply: String,
}

/// POST /chat - Deliver one patient message and return the reply
///
/// Slash commands are answered here with static text. Everything else is a
/// dialogue turn handled by the engine.
pub async fn post(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let patient_id = PatientId::new(body.patient_id)?;
    if body.message.trim().is_empty() {
        return Err(AppError::BadRequest("Message must not be empty".to_string()));
    }

    if let Some(reply) = commands::reply_for(&body.message) {
        tracing::debug!(patient_id = %patient_id, "Answered command");
        return Ok(Json(ChatResponse {
            reply: reply.to_string(),
        }));
    }

    tracing::info!(request_id = %request_id.0, patient_id = %patient_id, "Chat turn");
    let reply = state.controller.respond(&patient_id, &body.message).await;

    Ok(Json(ChatResponse { reply }))
}
