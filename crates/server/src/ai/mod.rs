//! Language model access

pub mod client;
pub mod provider;

pub use client::ClaudeClient;
pub use provider::{CompletionProvider, ProviderError, UnconfiguredProvider};
