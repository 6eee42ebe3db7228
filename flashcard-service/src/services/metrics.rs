//! Metrics collection and Prometheus export.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Call once at startup, before any metric
/// is recorded.
pub fn init_metrics() -> Result<(), anyhow::Error> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    METRICS_HANDLE
        .set(handle)
        .map_err(|_| anyhow::anyhow!("Metrics handle already initialized"))
}

pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

pub fn record_ai_request(operation: &'static str, success: bool, latency: Duration) {
    let status = if success { "success" } else { "error" };
    metrics::counter!("genai_requests_total", "operation" => operation, "status" => status)
        .increment(1);
    metrics::histogram!("genai_provider_latency_seconds", "operation" => operation)
        .record(latency.as_secs_f64());
}

pub fn record_ai_tokens(operation: &'static str, input: i32, output: i32) {
    metrics::counter!("genai_tokens_total", "operation" => operation, "type" => "input")
        .increment(input.max(0) as u64);
    metrics::counter!("genai_tokens_total", "operation" => operation, "type" => "output")
        .increment(output.max(0) as u64);
}

pub fn record_extraction(kind: &'static str, success: bool) {
    let status = if success { "success" } else { "error" };
    metrics::counter!("content_extractions_total", "kind" => kind, "status" => status)
        .increment(1);
}

pub fn record_cards_generated(source: &'static str, count: usize, fallback: bool) {
    metrics::counter!(
        "flashcards_generated_total",
        "source" => source,
        "fallback" => if fallback { "true" } else { "false" }
    )
    .increment(count as u64);
}

pub fn record_review(correct: bool) {
    metrics::counter!(
        "card_reviews_total",
        "result" => if correct { "correct" } else { "incorrect" }
    )
    .increment(1);
}

pub fn record_quiz_completed(correct: usize, total: usize) {
    metrics::counter!("quizzes_completed_total").increment(1);
    metrics::counter!("quiz_answers_total", "result" => "correct").increment(correct as u64);
    metrics::counter!("quiz_answers_total", "result" => "incorrect")
        .increment(total.saturating_sub(correct) as u64);
}
