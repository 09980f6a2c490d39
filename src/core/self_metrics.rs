/// Prometheus metrics about the gateway itself
///
/// Exposed on `GET /metrics` so the gateway can be scraped like any other
/// target:
/// - HTTP requests by route and status
/// - upstream instant queries by outcome
/// - upstream query latency

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use prometheus::{histogram_opts, opts, Encoder, Histogram, IntCounterVec, Registry, TextEncoder};
use std::time::Duration;

lazy_static! {
    /// Requests served, by matched route and response status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        opts!("nodewatch_http_requests_total", "HTTP requests served by the gateway"),
        &["route", "status"]
    ).expect("valid metric definition");

    /// Instant queries sent to Prometheus, by outcome (success/error)
    pub static ref UPSTREAM_QUERIES_TOTAL: IntCounterVec = IntCounterVec::new(
        opts!("nodewatch_upstream_queries_total", "Instant queries sent to Prometheus"),
        &["outcome"]
    ).expect("valid metric definition");

    /// Instant query round-trip time in seconds
    pub static ref UPSTREAM_QUERY_DURATION: Histogram = Histogram::with_opts(
        histogram_opts!(
            "nodewatch_upstream_query_duration_seconds",
            "Round-trip time of Prometheus instant queries",
            vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
        )
    ).expect("valid metric definition");

    pub static ref REGISTRY: Registry = {
        let r = Registry::new();
        r.register(Box::new(HTTP_REQUESTS_TOTAL.clone())).expect("metric registered once");
        r.register(Box::new(UPSTREAM_QUERIES_TOTAL.clone())).expect("metric registered once");
        r.register(Box::new(UPSTREAM_QUERY_DURATION.clone())).expect("metric registered once");
        r
    };
}

pub fn record_request(route: &str, status: u16) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[route, &status.to_string()])
        .inc();
}

pub fn observe_upstream(success: bool, elapsed: Duration) {
    let outcome = if success { "success" } else { "error" };
    UPSTREAM_QUERIES_TOTAL.with_label_values(&[outcome]).inc();
    UPSTREAM_QUERY_DURATION.observe(elapsed.as_secs_f64());
}

/// Content type of the text exposition format
pub fn content_type() -> String {
    TextEncoder::new().format_type().to_string()
}

/// Render every registered metric in text exposition format
pub fn gather_text() -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .context("Failed to encode metrics")?;

    String::from_utf8(buffer).context("Metrics output is not UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_includes_recorded_series() {
        record_request("/api/system", 200);
        observe_upstream(false, Duration::from_millis(20));

        let text = gather_text().unwrap();
        assert!(text.contains("nodewatch_http_requests_total{route=\"/api/system\",status=\"200\"}"));
        assert!(text.contains("nodewatch_upstream_queries_total{outcome=\"error\"}"));
        assert!(text.contains("nodewatch_upstream_query_duration_seconds_bucket"));
    }

    #[test]
    fn test_content_type_is_text_format() {
        assert!(content_type().starts_with("text/plain"));
    }
}
