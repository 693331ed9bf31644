//! Shared-secret check for the transport caller
//!
//! This guards the service endpoint, not individual patients.

use axum::{
    body::Body,
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// API Key authentication state
#[derive(Clone)]
pub struct ApiKeyAuth {
    api_key: Option<String>,
}

impl ApiKeyAuth {
    pub fn new(api_key: Option<String>) -> Self {
        Self { api_key }
    }

    /// Whether a request presenting `provided` may pass
    fn allows(&self, provided: Option<&str>) -> bool {
        match &self.api_key {
            None => true,
            Some(expected) => provided == Some(expected.as_str()),
        }
    }
}

/// Reject requests without the configured API key
pub async fn auth_middleware(request: Request<Body>, next: Next) -> Response {
    let auth = request.extensions().get::<ApiKeyAuth>().cloned();

    if let Some(auth) = auth {
        let provided = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());

        if !auth.allows(provided) {
            tracing::warn!(path = %request.uri().path(), "Rejected request with missing or invalid API key");
            return AppError::Unauthorized("Missing or invalid API key".to_string()).into_response();
        }
    }

    next.run(request).await
}
