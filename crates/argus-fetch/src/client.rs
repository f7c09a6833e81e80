//! Snapshot HTTP client.

use std::io::Cursor;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{ImageOutputFormat, RgbImage};
use reqwest::Client;
use tracing::debug;

use argus_models::Credentials;

use crate::error::{FetchError, FetchResult};

/// JPEG quality used when re-encoding snapshots for data URIs.
const JPEG_QUALITY: u8 = 85;

/// Configuration for the snapshot client.
#[derive(Debug, Clone)]
pub struct SnapshotClientConfig {
    /// Per-request timeout for the snapshot GET
    pub timeout: Duration,
}

impl Default for SnapshotClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

impl SnapshotClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            timeout: Duration::from_secs(
                std::env::var("SNAPSHOT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
        }
    }
}

/// HTTP client for camera snapshots.
///
/// One outbound GET per call, no retry: a failed fetch aborts the whole
/// analysis.
pub struct SnapshotClient {
    http: Client,
}

impl SnapshotClient {
    /// Create a new snapshot client.
    pub fn new(config: SnapshotClientConfig) -> FetchResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(FetchError::Network)?;

        Ok(Self { http })
    }

    /// Create from environment variables.
    pub fn from_env() -> FetchResult<Self> {
        Self::new(SnapshotClientConfig::from_env())
    }

    /// Fetch a snapshot and decode it to an RGB bitmap.
    ///
    /// Any response status >= 400 fails with [`FetchError::UpstreamStatus`].
    /// A missing password is sent as an empty string, matching common
    /// camera firmware expectations.
    pub async fn fetch(
        &self,
        uri: &str,
        credentials: Option<&Credentials>,
    ) -> FetchResult<RgbImage> {
        let mut request = self.http.get(uri);
        if let Some(creds) = credentials {
            let password = creds.password.as_deref().unwrap_or("");
            request = request.basic_auth(&creds.username, Some(password));
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        if status >= 400 {
            return Err(FetchError::UpstreamStatus { status });
        }

        let bytes = response.bytes().await?;
        debug!(uri = %uri, bytes = bytes.len(), "Snapshot fetched");

        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        Ok(decoded.to_rgb8())
    }
}

/// Re-encode an RGB bitmap as a JPEG data URI.
///
/// Format: `data:image/jpeg;base64,<base64(JPEG bytes)>`.
pub fn data_url(image: &RgbImage) -> FetchResult<String> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageOutputFormat::Jpeg(JPEG_QUALITY))
        .map_err(|e| FetchError::Encode(e.to_string()))?;

    Ok(format!(
        "data:image/jpeg;base64,{}",
        BASE64.encode(buffer.into_inner())
    ))
}
