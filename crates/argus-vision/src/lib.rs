//! In-process model inference for the Argus vision service.
//!
//! This crate wraps two pre-trained ONNX models behind ONNX Runtime:
//! - a YOLOv8-family object detector (COCO vocabulary, 640px input)
//! - a face locator plus 128-d face encoder
//!
//! and derives advisory alarm strings from their combined output. The
//! object detector is required and lazily initialized once per process;
//! the face runtime is an optional capability decided at startup — when
//! its model files are absent the `people` list is empty and analysis
//! still succeeds.

pub mod alarm;
pub mod analyzer;
pub mod error;
pub mod face;
pub mod object;
mod session;

pub use analyzer::{Analysis, Analyzer};
pub use error::{VisionError, VisionResult};
pub use face::{FaceDetector, FaceDetectorConfig};
pub use object::{ObjectDetector, ObjectDetectorConfig, COCO_CLASSES};
