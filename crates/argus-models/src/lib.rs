//! Shared data models for the Argus vision service.
//!
//! This crate provides Serde-serializable types for:
//! - Bounding boxes in pixel coordinates
//! - Object and face detections
//! - Analysis reports returned to API clients
//! - Camera references and snapshot credentials

pub mod bbox;
pub mod camera;
pub mod detection;
pub mod report;

// Re-export common types
pub use bbox::BoundingBox;
pub use camera::{CameraRef, Credentials};
pub use detection::{DetectedObject, DetectedPerson, FACE_EMBEDDING_LEN};
pub use report::AnalysisReport;
