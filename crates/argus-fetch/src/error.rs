//! Snapshot fetch error types.

use thiserror::Error;

pub type FetchResult<T> = Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("snapshot fetch returned status {status}")]
    UpstreamStatus { status: u16 },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("image decode failed: {0}")]
    Decode(String),

    #[error("jpeg encode failed: {0}")]
    Encode(String),
}

impl FetchError {
    /// True when the failure came from the upstream camera rather than
    /// this service (maps to 502 at the API boundary).
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            FetchError::UpstreamStatus { .. } | FetchError::Network(_) | FetchError::Decode(_)
        )
    }
}
