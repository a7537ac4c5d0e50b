use crate::models::{AnalysisRequest, AnalysisResponse};
use crate::services::metrics;
use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};

/// `POST /process_text`
///
/// Never fails at the HTTP level: relay errors become the degraded body,
/// sent with the configured failure status (200 by default).
pub async fn process_text(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> impl IntoResponse {
    let result = state.relay.analyze(&request.text).await;

    let status = match &result {
        Ok(analysis) => {
            metrics::record_analysis("success");
            tracing::info!(
                emotion = %analysis.emotion,
                keyword_count = analysis.keyword_count(),
                "Analysis completed"
            );
            axum::http::StatusCode::OK
        }
        Err(e) => {
            metrics::record_analysis(e.kind());
            tracing::error!(error = %e, kind = e.kind(), "Analysis failed");
            state.failure_status.status_code()
        }
    };

    (status, Json(AnalysisResponse::from(result)))
}
