//! Prometheus metrics for sentiment-service.

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

pub struct RelayMetrics {
    registry: Registry,
    /// outcome: "success" or a RelayError kind
    analyses_total: IntCounterVec,
    upstream_latency_seconds: HistogramVec,
}

// Global registry
static METRICS: OnceLock<RelayMetrics> = OnceLock::new();

/// Initialize all metrics. Safe to call more than once.
pub fn init_metrics() {
    METRICS.get_or_init(|| {
        let registry = Registry::new();

        let analyses_total = IntCounterVec::new(
            Opts::new("sentiment_analyses_total", "Total analyses by outcome"),
            &["outcome"],
        )
        .expect("Failed to create sentiment_analyses_total metric");

        let upstream_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "sentiment_upstream_latency_seconds",
                "Chat-completion API latency in seconds",
            )
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
            &["provider"],
        )
        .expect("Failed to create sentiment_upstream_latency_seconds metric");

        registry
            .register(Box::new(analyses_total.clone()))
            .expect("Failed to register sentiment_analyses_total");
        registry
            .register(Box::new(upstream_latency_seconds.clone()))
            .expect("Failed to register sentiment_upstream_latency_seconds");

        tracing::info!("Prometheus metrics initialized");

        RelayMetrics {
            registry,
            analyses_total,
            upstream_latency_seconds,
        }
    });
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let metrics = match METRICS.get() {
        Some(m) => m,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    if let Err(e) = encoder.encode(&metrics.registry.gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

/// Record the outcome of one analysis.
pub fn record_analysis(outcome: &str) {
    if let Some(metrics) = METRICS.get() {
        metrics.analyses_total.with_label_values(&[outcome]).inc();
    }
}

/// Record upstream latency.
pub fn record_upstream_latency(provider: &str, duration_secs: f64) {
    if let Some(metrics) = METRICS.get() {
        metrics
            .upstream_latency_seconds
            .with_label_values(&[provider])
            .observe(duration_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_outcomes_appear_in_exposition() {
        init_metrics();
        init_metrics();
        record_analysis("success");
        record_analysis("timeout");

        let text = get_metrics();
        assert!(text.contains("sentiment_analyses_total{outcome=\"success\"}"));
        assert!(text.contains("sentiment_analyses_total{outcome=\"timeout\"}"));
    }
}
