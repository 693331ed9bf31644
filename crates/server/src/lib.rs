//! assistant-server library crate
//!
//! Exposes the dialogue engine, its stores, and `build_app` for integration
//! tests. The actual binary entrypoint is in `main.rs`.

pub mod ai;
mod commands;
pub mod config;
pub mod engine;
mod error;
mod middleware;
mod routes;
pub mod store;

use std::sync::Arc;

use axum::{
    Extension, Router, middleware as axum_mw,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use ai::{ClaudeClient, CompletionProvider, UnconfiguredProvider};
use config::Config;
use engine::{DialogueController, ReportPolicy, TimePolicy, ToolDispatcher};
use middleware::ApiKeyAuth;
use store::PatientRecordStore;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<DialogueController>,
}

impl AppState {
    pub fn new(controller: Arc<DialogueController>) -> Self {
        Self { controller }
    }

    /// Wire the engine from configuration.
    ///
    /// Without an Anthropic key the engine still runs; every fresh request
    /// simply gets the degraded-service reply.
    pub fn from_config(config: &Config) -> Self {
        let provider: Arc<dyn CompletionProvider> = match &config.anthropic_api_key {
            Some(key) => {
                let client = ClaudeClient::new(key.clone());
                match &config.anthropic_model {
                    Some(model) => Arc::new(client.with_model(model.clone())),
                    None => Arc::new(client),
                }
            }
            None => Arc::new(UnconfiguredProvider),
        };

        let time_policy = if config.strict_time_format {
            TimePolicy::Strict24h
        } else {
            TimePolicy::Lenient
        };
        let report_policy = if config.report_requires_appointment {
            ReportPolicy::RequireAppointment
        } else {
            ReportPolicy::Open
        };

        let dispatcher = ToolDispatcher::new(PatientRecordStore::new())
            .with_time_policy(time_policy)
            .with_report_policy(report_policy);

        let controller = DialogueController::new(provider, dispatcher)
            .with_model_timeout(config.model_timeout)
            .with_history_window(config.history_window);

        Self::new(Arc::new(controller))
    }
}

/// Build the full application router with all routes and middleware.
///
/// Extracted from `main()` so integration tests can construct the app
/// without binding to a TCP port.
pub fn build_app(state: AppState, config: &Config) -> Router {
    let auth = ApiKeyAuth::new(config.api_key.clone());
    let rate_limiter = middleware::create_rate_limiter(config.rate_limit_rps);

    // Transport routes (API key + rate limit)
    let chat_routes = Router::new()
        .route("/chat", post(routes::chat::post))
        .layer(axum_mw::from_fn(middleware::auth_middleware))
        .layer(Extension(auth))
        .layer(axum_mw::from_fn(middleware::rate_limit_middleware))
        .layer(Extension(rate_limiter));

    // Install Prometheus metrics recorder.
    // Repeated calls (e.g. in integration tests) keep the first global
    // recorder; the handle is still valid for /metrics.
    let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
    let prometheus_handle = recorder.handle();
    let _ = metrics::set_global_recorder(recorder);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(routes::health::check))
        .route("/metrics", get(routes::metrics::render))
        .layer(Extension(prometheus_handle));

    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .merge(public_routes)
        .merge(chat_routes)
        .with_state(state)
        .layer(axum_mw::from_fn(middleware::request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum_mw::from_fn(middleware::metrics_middleware))
}
