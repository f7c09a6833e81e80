//! Axum HTTP API server for the Argus vision service.
//!
//! This crate provides:
//! - `POST /analyze` — fetch a snapshot, run both detectors, return a report
//! - `POST /snapshot` — fetch a camera's last snapshot as a data URI
//! - `POST /ptz` — pan/tilt/zoom placeholder
//! - `GET /health` — liveness probe, no dependency checks

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
