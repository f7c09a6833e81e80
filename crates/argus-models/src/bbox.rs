use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in source-image pixel coordinates.
///
/// Serialized on the wire as a 4-element array `[left, top, right, bottom]`.
/// Detections are expected to satisfy `left <= right` and `top <= bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    /// X coordinate of the left edge
    pub left: f32,
    /// Y coordinate of the top edge
    pub top: f32,
    /// X coordinate of the right edge
    pub right: f32,
    /// Y coordinate of the bottom edge
    pub bottom: f32,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Width of the box in pixels.
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Height of the box in pixels.
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Check that the corner ordering invariant holds.
    pub fn is_canonical(&self) -> bool {
        self.left <= self.right && self.top <= self.bottom
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from([left, top, right, bottom]: [f32; 4]) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(bbox: BoundingBox) -> Self {
        [bbox.left, bbox.top, bbox.right, bbox.bottom]
    }
}
