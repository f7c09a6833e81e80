//! Snapshot analysis handler.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use argus_models::{AnalysisReport, Credentials};

use crate::error::ApiResult;
use crate::state::AppState;

/// Analysis request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub camera_id: String,
    pub snapshot_uri: String,
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

/// Analyze one camera snapshot.
///
/// Strict sequence: fetch, object detection, face detection, alarm
/// rules, data-URI re-encode. Fetch and object-detection failures abort
/// the request; face detection degrades to an empty people list.
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<Json<AnalysisReport>> {
    let image = state
        .snapshots
        .fetch(&request.snapshot_uri, request.credentials.as_ref())
        .await?;

    let analysis = state.analyzer.analyze(&image).await?;
    let snapshot_data_url = argus_fetch::data_url(&image)?;

    info!(
        camera_id = %request.camera_id,
        objects = analysis.objects.len(),
        people = analysis.people.len(),
        alarms = analysis.alarms.len(),
        "Snapshot analyzed"
    );

    Ok(Json(AnalysisReport {
        objects: analysis.objects,
        people: analysis.people,
        alarms: analysis.alarms,
        snapshot_data_url,
    }))
}
