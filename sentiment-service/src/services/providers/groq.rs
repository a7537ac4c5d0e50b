//! Groq provider implementation.
//!
//! Speaks the OpenAI-compatible `chat/completions` protocol, so any
//! compatible endpoint can be targeted through `base_url`.

use super::{ChatMessage, CompletionProvider, GenerationParams};
use crate::error::RelayError;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Groq provider configuration.
#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub api_key: Secret<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

/// Groq chat-completion provider.
///
/// Holds one pooled [`Client`]; cloning it is cheap and it is safe to share
/// across concurrent requests.
pub struct GroqProvider {
    config: GroqConfig,
    client: Client,
}

impl GroqProvider {
    pub fn new(config: GroqConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn map_reqwest_error(&self, err: reqwest::Error) -> RelayError {
        if err.is_timeout() {
            RelayError::Timeout(self.config.timeout)
        } else {
            RelayError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl CompletionProvider for GroqProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<String, RelayError> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            temperature: params.temperature,
            response_format: params.json_object.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        tracing::debug!(
            model = %self.config.model,
            message_count = messages.len(),
            "Sending request to Groq API"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        tracing::debug!(status = %status, body = %body, "Groq response");

        if !status.is_success() {
            return Err(RelayError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let api_response: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| RelayError::SchemaMismatch(format!("Failed to parse response: {}", e)))?;

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                RelayError::SchemaMismatch("missing choices[0].message.content".to_string())
            })
    }

    fn name(&self) -> &'static str {
        "groq"
    }
}

// ============================================================================
// Chat Completion Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str, timeout: Duration) -> GroqProvider {
        GroqProvider::new(GroqConfig {
            api_key: Secret::new("test-key".to_string()),
            base_url: base_url.to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            timeout,
        })
        .unwrap()
    }

    fn params() -> GenerationParams {
        GenerationParams {
            temperature: 0.3,
            json_object: true,
        }
    }

    #[tokio::test]
    async fn sends_bearer_token_and_json_mode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "llama-3.3-70b-versatile",
                "temperature": 0.3,
                "response_format": {"type": "json_object"},
                "messages": [{"role": "user", "content": "Analyze: hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "{}"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let content = provider(&format!("{}/", server.uri()), Duration::from_secs(5))
            .complete(&[ChatMessage::user("Analyze: hi")], &params())
            .await
            .unwrap();

        assert_eq!(content, "{}");
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = provider(&server.uri(), Duration::from_secs(5))
            .complete(&[ChatMessage::user("x")], &params())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            RelayError::UpstreamStatus {
                status: 401,
                body: "invalid api key".to_string()
            }
        );
    }

    #[tokio::test]
    async fn missing_content_is_schema_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let err = provider(&server.uri(), Duration::from_secs(5))
            .complete(&[ChatMessage::user("x")], &params())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "schema_mismatch");
    }

    #[tokio::test]
    async fn slow_upstream_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(3))
                    .set_body_json(json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let err = provider(&server.uri(), Duration::from_millis(200))
            .complete(&[ChatMessage::user("x")], &params())
            .await
            .unwrap_err();

        assert_eq!(err, RelayError::Timeout(Duration::from_millis(200)));
    }
}
