//! The sentiment relay: prompt in, normalized analysis out.

use crate::error::RelayError;
use crate::models::AnalysisResult;
use crate::services::metrics;
use crate::services::providers::{ChatMessage, CompletionProvider, GenerationParams};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

pub const SYSTEM_PROMPT: &str = "You are a sentiment analyzer. Return only valid JSON with these fields: 'sentiment' (float 0-1, where 0=negative, 1=positive), 'emotion' (string: 'happy', 'sad', 'angry', 'calm', 'excited', 'anxious'), 'intensity' (float 0-1, how strong the emotion is), and 'keywords' (array of 3-5 key words/phrases).";

pub const USER_PREFIX: &str = "Analyze: ";

#[derive(Clone)]
pub struct SentimentRelay {
    provider: Arc<dyn CompletionProvider>,
    params: GenerationParams,
}

impl SentimentRelay {
    pub fn new(provider: Arc<dyn CompletionProvider>, temperature: f64) -> Self {
        Self {
            provider,
            params: GenerationParams {
                temperature,
                json_object: true,
            },
        }
    }

    /// The fixed two-message conversation sent for `text`.
    pub fn build_messages(text: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!("{}{}", USER_PREFIX, text)),
        ]
    }

    /// Run one analysis. The text is forwarded as-is, with no length or
    /// emptiness checks.
    pub async fn analyze(&self, text: &str) -> Result<AnalysisResult, RelayError> {
        let messages = Self::build_messages(text);

        let started = Instant::now();
        let content = self.provider.complete(&messages, &self.params).await;
        metrics::record_upstream_latency(self.provider.name(), started.elapsed().as_secs_f64());

        let analysis = parse_analysis(&content?)?;

        if analysis.emotion_kind().is_none() {
            tracing::debug!(
                emotion = %analysis.emotion,
                "Model returned an emotion outside the prompted vocabulary"
            );
        }

        Ok(analysis)
    }
}

/// Parse the model's content string, filling defaults for absent fields.
///
/// The content must be a JSON object. Present values, `null` included, are
/// passed through untouched: no type checks, no clamping to `[0, 1]` and no
/// vocabulary check on `emotion`. Other keys are ignored.
pub fn parse_analysis(content: &str) -> Result<AnalysisResult, RelayError> {
    let mut fields: Map<String, Value> =
        serde_json::from_str(content).map_err(|e| RelayError::ContentParse(e.to_string()))?;

    let defaults = AnalysisResult::default();
    let mut take = |key: &str, default: Value| fields.remove(key).unwrap_or(default);

    Ok(AnalysisResult {
        sentiment: take("sentiment", defaults.sentiment),
        emotion: take("emotion", defaults.emotion),
        intensity: take("intensity", defaults.intensity),
        keywords: take("keywords", defaults.keywords),
    })
}
