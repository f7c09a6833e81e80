//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{analyze, health, ptz, snapshot};
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let camera_routes = Router::new()
        .route("/analyze", post(analyze))
        .route("/snapshot", post(snapshot))
        .route("/ptz", post(ptz));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health));

    Router::new()
        .merge(camera_routes)
        .merge(health_routes)
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
