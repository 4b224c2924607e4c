//! Completion provider integrations

mod openai_compat;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use thiserror::Error;

use crate::conversation::Message;

pub use openai_compat::{OpenAICompatConfig, OpenAICompatProvider};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Everything the provider needs for one completion
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Persona instruction, sent ahead of the history as a system message
    pub system: String,
    /// Full conversation history in display order
    pub messages: Vec<Message>,
    pub temperature: f32,
}

/// An external service that turns a conversation into the next assistant reply
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}
