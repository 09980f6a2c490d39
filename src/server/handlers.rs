/// API Request Handlers
/// Thin wrappers over `Gateway`; every failure is turned into a JSON error here

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::core::{self_metrics, Gateway, InstantQuery, QueryError, SystemSnapshot};

// ============================================================================
// State & Errors
// ============================================================================

pub struct AppState<Q> {
    pub gateway: Arc<Gateway<Q>>,
    pub require_instance: bool,
}

impl<Q> Clone for AppState<Q> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            require_instance: self.require_instance,
        }
    }
}

impl<Q> AppState<Q> {
    pub fn new(gateway: Gateway<Q>, require_instance: bool) -> Self {
        Self {
            gateway: Arc::new(gateway),
            require_instance,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("instance parameter is required")]
    MissingInstance,

    #[error("{message}: {source}")]
    Upstream {
        message: &'static str,
        #[source]
        source: QueryError,
    },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MissingInstance => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": ApiError::MissingInstance.to_string() })),
            )
                .into_response(),
            ApiError::Upstream { message, source } => {
                tracing::error!(error = %source, "{}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": message, "detail": source.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SystemQuery {
    #[serde(default)]
    instance: Option<String>,
}

// ============================================================================
// Gateway Handlers
// ============================================================================

pub async fn get_instances<Q: InstantQuery>(
    State(state): State<AppState<Q>>,
) -> Result<Json<Vec<String>>, ApiError> {
    let instances = state
        .gateway
        .list_instances()
        .await
        .map_err(|source| ApiError::Upstream {
            message: "failed to query prometheus for instances",
            source,
        })?;

    Ok(Json(instances))
}

pub async fn get_system<Q: InstantQuery>(
    State(state): State<AppState<Q>>,
    Query(params): Query<SystemQuery>,
) -> Result<Json<SystemSnapshot>, ApiError> {
    let instance = params.instance.filter(|i| !i.is_empty());

    if instance.is_none() && state.require_instance {
        return Err(ApiError::MissingInstance);
    }

    let snapshot = state
        .gateway
        .current_metrics(instance.as_deref())
        .await
        .map_err(|source| ApiError::Upstream {
            message: "failed to query prometheus",
            source,
        })?;

    Ok(Json(snapshot))
}

// ============================================================================
// Monitoring Handlers
// ============================================================================

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Exposition-format metrics about the gateway itself
pub async fn get_metrics() -> Response {
    match self_metrics::gather_text() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, self_metrics::content_type())],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e)).into_response(),
    }
}
