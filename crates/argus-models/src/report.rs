use serde::{Deserialize, Serialize};

use crate::detection::{DetectedObject, DetectedPerson};

/// Result of a full snapshot analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Objects found by the object detector, in detection order
    pub objects: Vec<DetectedObject>,
    /// Faces found by the face locator/encoder
    pub people: Vec<DetectedPerson>,
    /// Advisory alarm strings, per-object alarms first
    pub alarms: Vec<String>,
    /// The fetched snapshot re-encoded as a JPEG data URI
    pub snapshot_data_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_keys() {
        let report = AnalysisReport {
            objects: vec![],
            people: vec![],
            alarms: vec!["Detected fire".to_string()],
            snapshot_data_url: "data:image/jpeg;base64,AAAA".to_string(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("snapshotDataUrl").is_some());
        assert!(json.get("snapshot_data_url").is_none());
    }
}
