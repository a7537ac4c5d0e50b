//! Chat-completion provider abstraction.
//!
//! The relay talks to its upstream through [`CompletionProvider`] so the
//! HTTP client can be swapped for a mock in tests.

pub mod groq;
pub mod mock;

use crate::error::RelayError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One message of a chat-completion conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Generation parameters sent with every completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub temperature: f64,

    /// Ask the model for a JSON object instead of prose.
    pub json_object: bool,
}

/// Trait for chat-completion backends.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send the conversation and return the text content of the first choice.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<String, RelayError>;

    /// Short label for logs and metrics.
    fn name(&self) -> &'static str;
}
