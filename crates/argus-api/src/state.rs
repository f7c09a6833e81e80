//! Application state.

use std::sync::Arc;

use argus_fetch::SnapshotClient;
use argus_vision::Analyzer;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub snapshots: Arc<SnapshotClient>,
    pub analyzer: Arc<Analyzer>,
}

impl AppState {
    /// Create new application state.
    ///
    /// Probes face-runtime availability; the object detection model is
    /// loaded lazily on the first `/analyze` call.
    pub fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let snapshots = SnapshotClient::from_env()?;
        let analyzer = Analyzer::from_env();

        Ok(Self {
            config,
            snapshots: Arc::new(snapshots),
            analyzer: Arc::new(analyzer),
        })
    }
}
