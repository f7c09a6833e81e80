use serde::{Deserialize, Serialize};

/// Basic-auth credentials passed through to the camera.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// A caller-supplied camera reference.
///
/// Only the snapshot URI and optional credentials are modeled; camera
/// identity and lifecycle live with the caller. Unknown fields in the
/// request body are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CameraRef {
    #[serde(
        rename = "lastSnapshotUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_snapshot_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl CameraRef {
    /// Snapshot URI, if the camera carries a non-empty one.
    pub fn snapshot_url(&self) -> Option<&str> {
        self.last_snapshot_url
            .as_deref()
            .filter(|url| !url.is_empty())
    }

    /// Credentials for the snapshot fetch.
    ///
    /// Auth is applied only when both username and password are present
    /// and non-empty.
    pub fn credentials(&self) -> Option<Credentials> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
                Some(Credentials {
                    username: user.to_string(),
                    password: Some(pass.to_string()),
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_camera_has_no_snapshot() {
        let camera = CameraRef::default();
        assert!(camera.snapshot_url().is_none());
        assert!(camera.credentials().is_none());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let camera: CameraRef = serde_json::from_str(
            r#"{"lastSnapshotUrl": "http://cam/1.jpg", "vendor": "acme", "ptzCapable": true}"#,
        )
        .unwrap();
        assert_eq!(camera.snapshot_url(), Some("http://cam/1.jpg"));
    }

    #[test]
    fn test_credentials_require_both_fields() {
        let camera: CameraRef =
            serde_json::from_str(r#"{"lastSnapshotUrl": "http://cam/1.jpg", "username": "admin"}"#)
                .unwrap();
        assert!(camera.credentials().is_none());

        let camera: CameraRef = serde_json::from_str(
            r#"{"lastSnapshotUrl": "http://cam/1.jpg", "username": "admin", "password": "secret"}"#,
        )
        .unwrap();
        let creds = camera.credentials().unwrap();
        assert_eq!(creds.username, "admin");
        assert_eq!(creds.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_empty_snapshot_url_treated_as_absent() {
        let camera: CameraRef = serde_json::from_str(r#"{"lastSnapshotUrl": ""}"#).unwrap();
        assert!(camera.snapshot_url().is_none());
    }
}
