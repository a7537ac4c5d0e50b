//! Mock provider for testing.

use super::{ChatMessage, CompletionProvider, GenerationParams};
use crate::error::RelayError;
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return this content verbatim.
    Reply(String),
    /// Fail with this error.
    Fail(RelayError),
    /// Reply with an analysis whose only keyword is the user message.
    EchoUserMessage,
}

/// Mock completion provider for testing.
pub struct MockCompletionProvider {
    behavior: MockBehavior,
    delay: Option<Duration>,
}

impl MockCompletionProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _params: &GenerationParams,
    ) -> Result<String, RelayError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            MockBehavior::Reply(content) => Ok(content.clone()),
            MockBehavior::Fail(err) => Err(err.clone()),
            MockBehavior::EchoUserMessage => {
                let user = messages
                    .iter()
                    .rev()
                    .find(|m| m.role == "user")
                    .map(|m| m.content.clone())
                    .unwrap_or_default();

                Ok(serde_json::json!({ "keywords": [user] }).to_string())
            }
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
