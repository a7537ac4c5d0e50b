use crate::error::RelayError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;

pub const DEFAULT_SENTIMENT: f64 = 0.5;
pub const DEFAULT_INTENSITY: f64 = 0.5;
pub const DEFAULT_EMOTION: &str = "neutral";

/// Body of `POST /process_text`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisRequest {
    pub text: String,
}

/// Normalized analysis returned on success.
///
/// Fields hold whatever JSON the model produced for them, so an unexpected
/// type (a string score, a comma-joined keyword string) reaches the caller
/// unchanged. Only absent fields are replaced by the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub sentiment: Value,
    pub emotion: Value,
    pub intensity: Value,
    pub keywords: Value,
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            sentiment: json!(DEFAULT_SENTIMENT),
            emotion: json!(DEFAULT_EMOTION),
            intensity: json!(DEFAULT_INTENSITY),
            keywords: json!([]),
        }
    }
}

impl AnalysisResult {
    /// The emotion as a known label, or `None` if the model went off-vocabulary.
    pub fn emotion_kind(&self) -> Option<Emotion> {
        self.emotion.as_str().and_then(|e| e.parse().ok())
    }

    pub fn keyword_count(&self) -> usize {
        self.keywords.as_array().map_or(0, Vec::len)
    }
}

/// Returned in place of an [`AnalysisResult`] when the relay fails.
///
/// `sentiment` and `keywords` keep their defaults so callers that skip the
/// `error` check still read well-typed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradedResult {
    pub error: String,
    pub sentiment: f64,
    pub keywords: Vec<String>,
}

impl From<&RelayError> for DegradedResult {
    fn from(err: &RelayError) -> Self {
        Self {
            error: err.to_string(),
            sentiment: DEFAULT_SENTIMENT,
            keywords: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisResponse {
    Success(AnalysisResult),
    Degraded(DegradedResult),
}

impl From<Result<AnalysisResult, RelayError>> for AnalysisResponse {
    fn from(result: Result<AnalysisResult, RelayError>) -> Self {
        match result {
            Ok(analysis) => AnalysisResponse::Success(analysis),
            Err(err) => AnalysisResponse::Degraded(DegradedResult::from(&err)),
        }
    }
}

/// Emotion labels the system prompt asks the model to choose from,
/// plus the `neutral` fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Calm,
    Excited,
    Anxious,
    Neutral,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Calm => "calm",
            Emotion::Excited => "excited",
            Emotion::Anxious => "anxious",
            Emotion::Neutral => "neutral",
        }
    }
}

impl FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "happy" => Ok(Emotion::Happy),
            "sad" => Ok(Emotion::Sad),
            "angry" => Ok(Emotion::Angry),
            "calm" => Ok(Emotion::Calm),
            "excited" => Ok(Emotion::Excited),
            "anxious" => Ok(Emotion::Anxious),
            "neutral" => Ok(Emotion::Neutral),
            other => Err(format!("unknown emotion '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn success_serializes_flat() {
        let response = AnalysisResponse::Success(AnalysisResult {
            sentiment: json!(0.9),
            emotion: json!("happy"),
            intensity: json!(0.8),
            keywords: json!(["love", "great"]),
        });

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "sentiment": 0.9,
                "emotion": "happy",
                "intensity": 0.8,
                "keywords": ["love", "great"]
            })
        );
    }

    #[test]
    fn degraded_shape_has_no_emotion_or_intensity() {
        let err = RelayError::Timeout(Duration::from_secs(30));
        let response = AnalysisResponse::from(Err(err));
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["sentiment"], json!(0.5));
        assert_eq!(value["keywords"], json!([]));
        assert!(value["error"].as_str().unwrap().contains("timeout"));
        assert!(value.get("emotion").is_none());
        assert!(value.get("intensity").is_none());
    }

    #[test]
    fn emotion_kind_tolerates_unknown_labels() {
        let mut result = AnalysisResult::default();
        assert_eq!(result.emotion_kind(), Some(Emotion::Neutral));

        result.emotion = json!("melancholic");
        assert_eq!(result.emotion_kind(), None);

        result.emotion = json!(3);
        assert_eq!(result.emotion_kind(), None);
    }

    #[test]
    fn keyword_count_ignores_non_array_keywords() {
        let mut result = AnalysisResult::default();
        assert_eq!(result.keyword_count(), 0);

        result.keywords = json!(["a", "b"]);
        assert_eq!(result.keyword_count(), 2);

        result.keywords = json!("a, b");
        assert_eq!(result.keyword_count(), 0);
    }
}
