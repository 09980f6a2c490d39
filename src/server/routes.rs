/// API Routes definition

use axum::{middleware, routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{self, AppState};
use super::middleware::track_requests;
use crate::core::InstantQuery;

pub fn create_router<Q>(state: AppState<Q>, enable_cors: bool) -> Router
where
    Q: InstantQuery + 'static,
{
    // Read-only gateway API
    let api_routes = Router::new()
        .route("/api/instances", get(handlers::get_instances::<Q>))
        .route("/api/system", get(handlers::get_system::<Q>))
        .route("/api/health", get(handlers::health_check))
        .with_state(state);

    let mut app = Router::new()
        .route("/metrics", get(handlers::get_metrics))
        .merge(api_routes)
        .layer(middleware::from_fn(track_requests))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        app = app.layer(CorsLayer::permissive());
    }

    app
}
