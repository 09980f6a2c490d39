/// Request accounting middleware for the gateway

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};

use crate::core::self_metrics;

/// Count every response by matched route and status
pub async fn track_requests(
    matched: Option<MatchedPath>,
    request: Request,
    next: Next,
) -> Response {
    // Raw paths would explode label cardinality; unmatched requests share one label
    let route = matched
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    self_metrics::record_request(&route, response.status().as_u16());

    response
}
