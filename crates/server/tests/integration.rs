//! Integration tests for the hospital assistant server.
//!
//! These tests build the Axum router in-process with a scripted model
//! provider and exercise the HTTP endpoints end to end, checking both the
//! replies and the state left behind in the stores.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assistant_core::PatientId;
use assistant_server::{
    AppState,
    ai::{CompletionProvider, ProviderError},
    config::Config,
    engine::{DEGRADED_REPLY, DialogueController, ToolDispatcher},
    store::PatientRecordStore,
};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value as JsonValue, json};
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const TEST_API_KEY: &str = "test-secret-key";

/// Model stand-in that answers with canned replies, in order
struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedProvider {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
        }
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(ProviderError::EmptyResponse)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn test_config() -> Config {
    Config {
        bind_address: "0.0.0.0:0".to_string(),
        api_key: Some(TEST_API_KEY.to_string()),
        cors_origins: vec!["*".to_string()],
        rate_limit_rps: 1000,
        anthropic_api_key: None,
        anthropic_model: None,
        model_timeout: Duration::from_secs(5),
        history_window: 20,
        strict_time_format: false,
        report_requires_appointment: true,
    }
}

/// Build the app around a scripted model; the state is returned for inspection.
fn test_app(replies: &[&str]) -> (Router, AppState) {
    let controller = DialogueController::new(
        Arc::new(ScriptedProvider::new(replies)),
        ToolDispatcher::new(PatientRecordStore::new()),
    );
    let state = AppState::new(Arc::new(controller));
    let app = assistant_server::build_app(state.clone(), &test_config());
    (app, state)
}

/// Send a request to the app and return (status, body as JSON).
async fn request(app: &Router, req: Request<Body>) -> (StatusCode, JsonValue) {
    let response = app.clone().oneshot(req).await.expect("Request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();

    let body = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };

    (status, body)
}

/// Build a POST /chat request with auth header.
fn chat(patient_id: &str, message: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header("Content-Type", "application/json")
        .header("X-API-Key", TEST_API_KEY)
        .body(Body::from(
            serde_json::to_vec(&json!({"patient_id": patient_id, "message": message})).unwrap(),
        ))
        .unwrap()
}

/// Send a chat message and return the reply text.
async fn say(app: &Router, patient_id: &str, message: &str) -> String {
    let (status, body) = request(app, chat(patient_id, message)).await;
    assert_eq!(status, StatusCode::OK, "unexpected body: {body}");
    body["reply"].as_str().expect("reply should be a string").to_string()
}

fn patient(id: &str) -> PatientId {
    PatientId::new(id).unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health() {
    let (app, _) = test_app(&[]);

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = request(&app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model"], "scripted");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = test_app(&[]);

    let req = Request::builder()
        .method("GET")
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_general_turn_records_pair() {
    let (app, state) = test_app(&[r#"{"tool": "general", "output": "Visiting hours are 9 to 5.", "missing_info": "none"}"#]);

    let reply = say(&app, "p1", "when can my family visit?").await;

    assert_eq!(reply, "Visiting hours are 9 to 5.");
    let conversations = state.controller.conversations();
    assert_eq!(conversations.turn_count(&patient("p1")).await, 2);
}

#[tokio::test]
async fn test_emergency_scenario() {
    let (app, state) = test_app(&[
        r#"{"tool": "report_emergency", "output": "Stay calm, help is coming.", "missing_info": "none", "details": "snake bite"}"#,
    ]);

    let reply = say(&app, "p1", "I have an emergency, snake bite").await;

    assert!(reply.contains("snake bite"), "reply was: {reply}");
    let reports = state
        .controller
        .dispatcher()
        .records()
        .emergencies(&patient("p1"))
        .await;
    assert_eq!(reports.len(), 1);
}

#[tokio::test]
async fn test_booking_slot_filling() {
    let (app, state) = test_app(&[
        r#"{"tool": "book_appointment", "output": "Sure, what time works for you?", "missing_info": "time"}"#,
    ]);
    let p = patient("p1");
    let conversations = state.controller.conversations();

    let reply = say(&app, "p1", "book me an appointment").await;
    assert_eq!(reply, "Sure, what time works for you?");
    assert!(conversations.pending(&p).await.is_some());

    let reply = say(&app, "p1", "3pm tomorrow").await;
    assert!(reply.starts_with("Appointment booked successfully"), "reply was: {reply}");
    assert!(conversations.pending(&p).await.is_none());
    assert_eq!(conversations.turn_count(&p).await, 4);

    let appointment = state.controller.dispatcher().records().appointment(&p).await;
    assert_eq!(appointment.unwrap().scheduled_time, "3pm tomorrow");
}

#[tokio::test]
async fn test_double_booking_and_report_round_trip() {
    let (app, _) = test_app(&[
        r#"{"tool": "get_report", "output": "Fetching", "missing_info": "none"}"#,
        r#"{"tool": "book_appointment", "output": "Booking", "missing_info": "none", "time": "10:00"}"#,
        r#"{"tool": "book_appointment", "output": "Booking", "missing_info": "none", "time": "12:00"}"#,
        r#"{"tool": "get_report", "output": "Fetching", "missing_info": "none"}"#,
    ]);

    // No appointment yet, so no report
    assert_eq!(
        say(&app, "p7", "show me my report").await,
        "No records found for patient p7."
    );

    assert_eq!(
        say(&app, "p7", "book me at 10:00").await,
        "Appointment booked successfully for p7 at 10:00."
    );
    assert_eq!(
        say(&app, "p7", "actually book 12:00 too").await,
        "Patient p7 already has an appointment at 10:00."
    );

    let report = say(&app, "p7", "show me my report").await;
    assert!(report.contains("p7"), "report was: {report}");
}

#[tokio::test]
async fn test_malformed_model_output_degrades() {
    let (app, state) = test_app(&["I think you want an appointment? {tool: book"]);

    let reply = say(&app, "p1", "book something").await;

    assert_eq!(reply, DEGRADED_REPLY);
    assert_eq!(
        state.controller.conversations().turn_count(&patient("p1")).await,
        2
    );
}

#[tokio::test]
async fn test_commands_bypass_engine() {
    let (app, state) = test_app(&[]);

    let reply = say(&app, "p1", "/start").await;

    assert!(reply.contains("Welcome"));
    assert_eq!(
        state.controller.conversations().turn_count(&patient("p1")).await,
        0
    );
}

#[tokio::test]
async fn test_rejects_blank_input() {
    let (app, _) = test_app(&[]);

    let (status, body) = request(&app, chat("  ", "hello")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = request(&app, chat("p1", "   ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_auth() {
    let (app, _) = test_app(&[r#"{"tool": "general", "output": "Hi"}"#]);
    let body = serde_json::to_vec(&json!({"patient_id": "p1", "message": "hi"})).unwrap();

    // No API key → 401
    let req = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("Content-Type", "application/json")
        .body(Body::from(body.clone()))
        .unwrap();
    let (status, resp) = request(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(resp["error"].is_string());

    // Wrong API key → 401
    let req = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("Content-Type", "application/json")
        .header("X-API-Key", "wrong-key")
        .body(Body::from(body))
        .unwrap();
    let (status, _) = request(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Correct API key → 200
    assert_eq!(say(&app, "p1", "hi").await, "Hi");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (app, _) = test_app(&[]);

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .header("X-Request-ID", "trace-123")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.headers()["X-Request-ID"], "trace-123");

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert!(response.headers().contains_key("X-Request-ID"));
}
