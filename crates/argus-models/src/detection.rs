use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;

/// Length of the face embedding vector produced by the face encoder.
pub const FACE_EMBEDDING_LEN: usize = 128;

/// A labeled object found by the object detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedObject {
    /// Human-readable class label (COCO vocabulary)
    pub label: String,
    /// Detection confidence in [0, 1]
    pub confidence: f32,
    /// Box in source-image pixel coordinates
    pub bbox: BoundingBox,
}

/// A located face with its identity embedding.
///
/// The face locator does not report a confidence score, so `confidence`
/// is always 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedPerson {
    /// Box in source-image pixel coordinates
    pub bbox: BoundingBox,
    /// Always 1.0
    pub confidence: f32,
    /// Fixed-length identity embedding ([`FACE_EMBEDDING_LEN`] floats)
    pub embedding: Vec<f32>,
}
