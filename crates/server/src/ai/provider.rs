//! Language model provider seam

use async_trait::async_trait;
use thiserror::Error;

/// Failure of the model call itself (as opposed to a bad reply)
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Model API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode model response: {0}")]
    Decode(String),

    #[error("No text content in model response")]
    EmptyResponse,

    #[error("No model provider configured")]
    NotConfigured,
}

/// Anything that can turn a rendered prompt into raw completion text
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Short name reported by the health endpoint
    fn name(&self) -> &str;
}

/// Stand-in used when no API key is configured; every call fails
pub struct UnconfiguredProvider;

#[async_trait]
impl CompletionProvider for UnconfiguredProvider {
    async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError::NotConfigured)
    }

    fn name(&self) -> &str {
        "unconfigured"
    }
}
