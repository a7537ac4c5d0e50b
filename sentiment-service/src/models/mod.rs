//! Request and response bodies of the relay.

pub mod analysis;

pub use analysis::{AnalysisRequest, AnalysisResponse, AnalysisResult, DegradedResult, Emotion};
