//! Failure taxonomy for one relay call.
//!
//! Every variant is collapsed into the same degraded response body at the
//! HTTP boundary; `kind()` keeps them distinguishable for logs, metrics and
//! tests.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelayError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Upstream timeout after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("Upstream returned HTTP {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Unexpected upstream response: {0}")]
    SchemaMismatch(String),

    #[error("Model content is not a valid analysis object: {0}")]
    ContentParse(String),
}

impl RelayError {
    /// Stable label used for the metrics `outcome` and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Transport(_) => "transport",
            RelayError::Timeout(_) => "timeout",
            RelayError::UpstreamStatus { .. } => "upstream_status",
            RelayError::SchemaMismatch(_) => "schema_mismatch",
            RelayError::ContentParse(_) => "content_parse",
        }
    }
}
