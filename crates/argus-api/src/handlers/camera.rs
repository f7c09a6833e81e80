//! Camera snapshot and PTZ handlers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use argus_models::CameraRef;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Snapshot request body.
#[derive(Debug, Deserialize)]
pub struct SnapshotRequest {
    pub camera: CameraRef,
}

/// Snapshot response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResponse {
    pub data_url: String,
}

/// Fetch a camera's last snapshot and return it as a JPEG data URI.
pub async fn snapshot(
    State(state): State<AppState>,
    Json(request): Json<SnapshotRequest>,
) -> ApiResult<Json<SnapshotResponse>> {
    let camera = request.camera;
    let uri = camera.snapshot_url().ok_or(ApiError::MissingSnapshot)?;
    let credentials = camera.credentials();

    let image = state.snapshots.fetch(uri, credentials.as_ref()).await?;

    Ok(Json(SnapshotResponse {
        data_url: argus_fetch::data_url(&image)?,
    }))
}

/// PTZ request body.
#[derive(Debug, Deserialize)]
pub struct PtzRequest {
    pub camera: CameraRef,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// PTZ response.
#[derive(Debug, Serialize)]
pub struct PtzResponse {
    pub status: &'static str,
}

/// Pan/tilt/zoom placeholder.
///
/// PTZ control requires vendor-specific integrations (e.g. ONVIF PTZ
/// services); this endpoint is the extension point and performs no
/// action.
pub async fn ptz(Json(_request): Json<PtzRequest>) -> Json<PtzResponse> {
    Json(PtzResponse {
        status: "not_implemented",
    })
}
