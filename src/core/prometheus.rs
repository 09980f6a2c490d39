/// Prometheus instant-query client
///
/// The gateway only ever talks to Prometheus through `GET /api/v1/query`.
/// Everything upstream is reached via the `InstantQuery` trait so the gateway
/// can be exercised without a live Prometheus.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::core::self_metrics;

/// A single result series of an instant vector query
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Series {
    #[serde(default)]
    pub metric: HashMap<String, String>,
    #[serde(default)]
    pub value: Option<SampleValue>,
}

/// `[unix_timestamp, "value"]` pair as Prometheus encodes it
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SampleValue(pub f64, pub String);

impl Series {
    pub fn new(labels: &[(&str, &str)], value: &str) -> Self {
        Self {
            metric: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            value: Some(SampleValue(0.0, value.to_string())),
        }
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.metric.get(name).map(String::as_str)
    }

    /// Sample value as a finite float, if there is one
    pub fn number(&self) -> Option<f64> {
        self.value
            .as_ref()
            .and_then(|v| v.1.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("request to prometheus failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("prometheus returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed prometheus response: {0}")]
    Malformed(String),

    #[error("prometheus rejected query ({error_type}): {error}")]
    Rejected { error_type: String, error: String },
}

/// The one upstream operation the gateway depends on.
///
/// A successful call returns the result series, which may be empty. A success
/// envelope without `data.result` is reported as no series, not as an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstantQuery: Send + Sync {
    async fn instant_query(&self, expr: &str) -> Result<Vec<Series>, QueryError>;
}

#[derive(Debug, Deserialize)]
struct QueryEnvelope {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default, rename = "errorType")]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Option<Vec<Series>>,
}

/// Decode a `/api/v1/query` body into its result series
pub fn parse_query_response(body: &str) -> Result<Vec<Series>, QueryError> {
    let envelope: QueryEnvelope =
        serde_json::from_str(body).map_err(|e| QueryError::Malformed(e.to_string()))?;

    if envelope.status != "success" {
        return Err(QueryError::Rejected {
            error_type: envelope.error_type.unwrap_or_else(|| envelope.status.clone()),
            error: envelope.error.unwrap_or_default(),
        });
    }

    Ok(envelope.data.and_then(|d| d.result).unwrap_or_default())
}

#[derive(Clone)]
pub struct PrometheusClient {
    client: Client,
    query_url: String,
}

impl PrometheusClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, QueryError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            query_url: format!("{}/api/v1/query", base_url.trim_end_matches('/')),
        })
    }

    pub fn query_url(&self) -> &str {
        &self.query_url
    }

    async fn send(&self, expr: &str) -> Result<Vec<Series>, QueryError> {
        let response = self
            .client
            .get(&self.query_url)
            .query(&[("query", expr)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // Prometheus answers 400/422/503 with an error envelope; keep it as detail
        if !status.is_success() {
            return Err(QueryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_query_response(&body)
    }
}

#[async_trait]
impl InstantQuery for PrometheusClient {
    async fn instant_query(&self, expr: &str) -> Result<Vec<Series>, QueryError> {
        let start = Instant::now();
        let result = self.send(expr).await;
        self_metrics::observe_upstream(result.is_ok(), start.elapsed());

        match &result {
            Ok(series) => tracing::debug!(expr, series = series.len(), "instant query"),
            Err(e) => tracing::warn!(expr, error = %e, "instant query failed"),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vector_result() {
        let body = r#"{
            "status": "success",
            "data": {
                "resultType": "vector",
                "result": [
                    {"metric": {"cpu": "0", "instance": "node-a:9100"}, "value": [1700000000.123, "12.5"]},
                    {"metric": {"cpu": "1", "instance": "node-a:9100"}, "value": [1700000000.123, "8.333"]}
                ]
            }
        }"#;

        let series = parse_query_response(body).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].label("cpu"), Some("0"));
        assert_eq!(series[1].number(), Some(8.333));
    }

    #[test]
    fn test_success_without_result_is_empty() {
        let series = parse_query_response(r#"{"status":"success"}"#).unwrap();
        assert!(series.is_empty());

        let series = parse_query_response(r#"{"status":"success","data":{"resultType":"vector"}}"#).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_error_envelope_is_rejected() {
        let body = r#"{"status":"error","errorType":"bad_data","error":"parse error at char 4"}"#;
        match parse_query_response(body) {
            Err(QueryError::Rejected { error_type, error }) => {
                assert_eq!(error_type, "bad_data");
                assert_eq!(error, "parse error at char 4");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_body_is_malformed() {
        assert!(matches!(
            parse_query_response("<html>bad gateway</html>"),
            Err(QueryError::Malformed(_))
        ));
    }

    #[test]
    fn test_non_finite_values_are_dropped() {
        assert_eq!(Series::new(&[], "NaN").number(), None);
        assert_eq!(Series::new(&[], "+Inf").number(), None);
        assert_eq!(Series::new(&[], "not-a-number").number(), None);
        assert_eq!(Series::new(&[], "42.1").number(), Some(42.1));
        assert_eq!(Series::default().number(), None);
    }

    #[test]
    fn test_query_url_trims_trailing_slash() {
        let client = PrometheusClient::new("http://prometheus:9090/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.query_url(), "http://prometheus:9090/api/v1/query");
    }

    // Fake Prometheus on an ephemeral port
    #[cfg(feature = "server")]
    mod over_http {
        use super::*;
        use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
        use serde_json::{json, Value};

        async fn serve(app: Router) -> String {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                let _ = axum::serve(listener, app).await;
            });
            format!("http://{}", addr)
        }

        async fn fixed_response(status: StatusCode, body: &'static str) -> String {
            serve(Router::new().route("/api/v1/query", get(move || async move { (status, body) }))).await
        }

        /// Address nothing listens on
        async fn refused_url() -> String {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            drop(listener);
            format!("http://{}", addr)
        }

        async fn echo_query(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
            Json(json!({
                "status": "success",
                "data": {
                    "resultType": "vector",
                    "result": [{"metric": {"query": params.get("query")}, "value": [1700000000.0, "7.5"]}]
                }
            }))
        }

        fn client(base_url: &str) -> PrometheusClient {
            PrometheusClient::new(base_url, Duration::from_secs(5)).unwrap()
        }

        #[tokio::test]
        async fn test_success_body_over_socket() {
            let base_url = serve(Router::new().route("/api/v1/query", get(echo_query))).await;

            let series = client(&base_url).instant_query(r#"up{job="node"}"#).await.unwrap();
            assert_eq!(series.len(), 1);
            assert_eq!(series[0].label("query"), Some(r#"up{job="node"}"#));
            assert_eq!(series[0].number(), Some(7.5));
        }

        #[tokio::test]
        async fn test_error_status_keeps_body() {
            let base_url = fixed_response(
                StatusCode::BAD_REQUEST,
                r#"{"status":"error","errorType":"bad_data","error":"parse error"}"#,
            )
            .await;

            match client(&base_url).instant_query("up{").await {
                Err(QueryError::Status { status, body }) => {
                    assert_eq!(status, 400);
                    assert!(body.contains("bad_data"));
                }
                other => panic!("expected HTTP status error, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_connection_refused_is_transport_error() {
            let base_url = refused_url().await;

            let err = client(&base_url).instant_query("up").await.unwrap_err();
            assert!(matches!(err, QueryError::Transport(_)));
            assert!(err.to_string().starts_with("request to prometheus failed"));
        }

        #[tokio::test]
        async fn test_scalar_result_is_malformed() {
            let base_url = fixed_response(
                StatusCode::OK,
                r#"{"status":"success","data":{"resultType":"scalar","result":[1700000000.0,"1"]}}"#,
            )
            .await;

            assert!(matches!(
                client(&base_url).instant_query("1").await,
                Err(QueryError::Malformed(_))
            ));
        }
    }
}
