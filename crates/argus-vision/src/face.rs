//! Face location and encoding using ONNX models.
//!
//! Two sessions: an UltraFace-style locator (320x240 input, score/box
//! output heads) and a 128-d face encoder (112x112 input). The face
//! runtime is optional — when either model file is missing at startup,
//! [`FaceDetector::try_load`] returns `None` and analysis proceeds with
//! an empty people list.

use std::path::Path;
use std::sync::Mutex;

use image::{imageops::FilterType, RgbImage};
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::{debug, info, warn};

use argus_models::{BoundingBox, DetectedPerson, FACE_EMBEDDING_LEN};

use crate::error::{VisionError, VisionResult};
use crate::object::iou;
use crate::session::create_session;

/// Locator canvas width.
const LOCATOR_WIDTH: u32 = 320;
/// Locator canvas height.
const LOCATOR_HEIGHT: u32 = 240;
/// Encoder input edge (square).
const ENCODER_SIZE: u32 = 112;

/// Raw face region as emitted by the locator, in (top, right, bottom, left)
/// order. Converted to the canonical corner box at the module boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceRegion {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl FaceRegion {
    /// Convert to the canonical (left, top, right, bottom) representation.
    ///
    /// Guarantees `left <= right` and `top <= bottom` on the result.
    pub fn to_bbox(self) -> BoundingBox {
        BoundingBox::new(
            self.left.min(self.right),
            self.top.min(self.bottom),
            self.left.max(self.right),
            self.top.max(self.bottom),
        )
    }
}

/// Configuration for the face detector.
#[derive(Debug, Clone)]
pub struct FaceDetectorConfig {
    /// Path to the face locator ONNX model
    pub locator_model_path: String,
    /// Path to the face encoder ONNX model
    pub encoder_model_path: String,
    /// Score threshold for face candidates
    pub score_threshold: f32,
    /// IoU threshold for NMS
    pub nms_threshold: f32,
}

impl Default for FaceDetectorConfig {
    fn default() -> Self {
        Self {
            locator_model_path: "models/ultraface-rfb-320.onnx".to_string(),
            encoder_model_path: "models/mobilefacenet.onnx".to_string(),
            score_threshold: 0.7,
            nms_threshold: 0.3,
        }
    }
}

impl FaceDetectorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            locator_model_path: std::env::var("FACE_LOCATOR_MODEL_PATH")
                .unwrap_or(defaults.locator_model_path),
            encoder_model_path: std::env::var("FACE_ENCODER_MODEL_PATH")
                .unwrap_or(defaults.encoder_model_path),
            score_threshold: std::env::var("FACE_SCORE_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.score_threshold),
            nms_threshold: defaults.nms_threshold,
        }
    }
}

/// Face locator/encoder pair.
pub struct FaceDetector {
    locator: Mutex<Session>,
    /// Output tensor names of the locator, in model order (scores, boxes)
    locator_outputs: Vec<String>,
    encoder: Mutex<Session>,
    /// First output tensor name of the encoder
    encoder_output: String,
    config: FaceDetectorConfig,
}

impl FaceDetector {
    /// Load the face runtime if its model files are present.
    ///
    /// Returns `None` when the runtime is unavailable; this is the
    /// documented fallback path, not an error.
    pub fn try_load(config: FaceDetectorConfig) -> Option<Self> {
        let locator_path = Path::new(&config.locator_model_path);
        let encoder_path = Path::new(&config.encoder_model_path);

        if !locator_path.exists() || !encoder_path.exists() {
            info!(
                locator = %config.locator_model_path,
                encoder = %config.encoder_model_path,
                "Face models not found, face detection disabled"
            );
            return None;
        }

        let locator = match create_session(locator_path) {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Face locator failed to load, face detection disabled");
                return None;
            }
        };
        let encoder = match create_session(encoder_path) {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Face encoder failed to load, face detection disabled");
                return None;
            }
        };

        let locator_outputs: Vec<String> =
            locator.outputs.iter().map(|o| o.name.clone()).collect();
        let encoder_output = match encoder.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                warn!("Face encoder has no outputs, face detection disabled");
                return None;
            }
        };
        if locator_outputs.len() < 2 {
            warn!("Face locator missing score/box outputs, face detection disabled");
            return None;
        }

        info!(
            locator = %config.locator_model_path,
            encoder = %config.encoder_model_path,
            "Face runtime initialized"
        );

        Some(Self {
            locator: Mutex::new(locator),
            locator_outputs,
            encoder: Mutex::new(encoder),
            encoder_output,
            config,
        })
    }

    /// Locate faces and compute one embedding per located region.
    ///
    /// Regions and embeddings are positionally paired; the reported
    /// confidence is fixed at 1.0 since the locator score is not a
    /// calibrated detection confidence.
    pub fn detect(&self, image: &RgbImage) -> VisionResult<Vec<DetectedPerson>> {
        let regions = self.locate(image)?;
        debug!(count = regions.len(), "Face location completed");

        let mut people = Vec::with_capacity(regions.len());
        for region in regions {
            let embedding = self.encode(image, &region)?;
            people.push(DetectedPerson {
                bbox: region.to_bbox(),
                confidence: 1.0,
                embedding,
            });
        }
        Ok(people)
    }

    /// Locate face regions in the bitmap.
    fn locate(&self, image: &RgbImage) -> VisionResult<Vec<FaceRegion>> {
        let (width, height) = image.dimensions();
        let resized =
            image::imageops::resize(image, LOCATOR_WIDTH, LOCATOR_HEIGHT, FilterType::Triangle);

        // NCHW, mean 127, scale 1/128
        let (w, h) = (LOCATOR_WIDTH as usize, LOCATOR_HEIGHT as usize);
        let mut chw_data: Vec<f32> = Vec::with_capacity(3 * h * w);
        for c in 0..3 {
            for y in 0..h {
                for x in 0..w {
                    let pixel = resized.get_pixel(x as u32, y as u32);
                    chw_data.push((pixel[c] as f32 - 127.0) / 128.0);
                }
            }
        }

        let shape = vec![1usize, 3, h, w];
        let input = Tensor::from_array((shape, chw_data.into_boxed_slice()))
            .map::<Value, _>(Value::from)
            .map_err(|e| VisionError::internal(format!("failed to create tensor: {}", e)))?;

        let (scores, boxes) = {
            let mut session = self
                .locator
                .lock()
                .map_err(|_| VisionError::internal("locator lock poisoned"))?;
            let outputs = session
                .run(ort::inputs![input])
                .map_err(|e| VisionError::inference(format!("face location failed: {}", e)))?;

            let scores = outputs
                .get(self.locator_outputs[0].as_str())
                .ok_or_else(|| VisionError::inference("missing locator score tensor"))?
                .try_extract_tensor::<f32>()
                .map_err(|e| VisionError::inference(format!("failed to extract scores: {}", e)))?
                .1
                .to_vec();
            let boxes = outputs
                .get(self.locator_outputs[1].as_str())
                .ok_or_else(|| VisionError::inference("missing locator box tensor"))?
                .try_extract_tensor::<f32>()
                .map_err(|e| VisionError::inference(format!("failed to extract boxes: {}", e)))?
                .1
                .to_vec();
            (scores, boxes)
        };

        regions_from_output(
            &scores,
            &boxes,
            width,
            height,
            self.config.score_threshold,
            self.config.nms_threshold,
        )
    }

    /// Compute the identity embedding for one face region.
    fn encode(&self, image: &RgbImage, region: &FaceRegion) -> VisionResult<Vec<f32>> {
        let bbox = region.to_bbox();
        let (width, height) = image.dimensions();

        // Clamp the crop rectangle inside the bitmap; degenerate
        // regions collapse to a 1px crop rather than failing.
        let x = (bbox.left.max(0.0) as u32).min(width.saturating_sub(1));
        let y = (bbox.top.max(0.0) as u32).min(height.saturating_sub(1));
        let w = (bbox.right.min(width as f32) as u32).saturating_sub(x).max(1);
        let h = (bbox.bottom.min(height as f32) as u32).saturating_sub(y).max(1);

        let face = image::imageops::crop_imm(image, x, y, w, h).to_image();
        let resized =
            image::imageops::resize(&face, ENCODER_SIZE, ENCODER_SIZE, FilterType::Triangle);

        // NCHW, [-1, 1] normalization
        let edge = ENCODER_SIZE as usize;
        let mut chw_data: Vec<f32> = Vec::with_capacity(3 * edge * edge);
        for c in 0..3 {
            for py in 0..edge {
                for px in 0..edge {
                    let pixel = resized.get_pixel(px as u32, py as u32);
                    chw_data.push((pixel[c] as f32 - 127.5) / 127.5);
                }
            }
        }

        let shape = vec![1usize, 3, edge, edge];
        let input = Tensor::from_array((shape, chw_data.into_boxed_slice()))
            .map::<Value, _>(Value::from)
            .map_err(|e| VisionError::internal(format!("failed to create tensor: {}", e)))?;

        let mut embedding = {
            let mut session = self
                .encoder
                .lock()
                .map_err(|_| VisionError::internal("encoder lock poisoned"))?;
            let outputs = session
                .run(ort::inputs![input])
                .map_err(|e| VisionError::inference(format!("face encoding failed: {}", e)))?;

            outputs
                .get(self.encoder_output.as_str())
                .ok_or_else(|| VisionError::inference("missing encoder output tensor"))?
                .try_extract_tensor::<f32>()
                .map_err(|e| {
                    VisionError::inference(format!("failed to extract embedding: {}", e))
                })?
                .1
                .to_vec()
        };

        if embedding.len() != FACE_EMBEDDING_LEN {
            return Err(VisionError::inference(format!(
                "unexpected embedding length: expected {}, got {}",
                FACE_EMBEDDING_LEN,
                embedding.len()
            )));
        }

        l2_normalize(&mut embedding);
        Ok(embedding)
    }
}

/// Parse the locator's raw score/box tensors into face regions.
///
/// Scores are [N, 2] (background, face); boxes are [N, 4] corner
/// coordinates normalized to [0, 1]. Regions come back in the locator's
/// (top, right, bottom, left) order, scaled to source pixels.
fn regions_from_output(
    scores: &[f32],
    boxes: &[f32],
    width: u32,
    height: u32,
    score_threshold: f32,
    nms_threshold: f32,
) -> VisionResult<Vec<FaceRegion>> {
    if scores.len() % 2 != 0 || boxes.len() != scores.len() * 2 {
        return Err(VisionError::inference(format!(
            "mismatched locator outputs: {} scores, {} boxes",
            scores.len(),
            boxes.len()
        )));
    }

    let num_candidates = scores.len() / 2;
    let mut candidates: Vec<(f32, FaceRegion)> = Vec::new();

    for i in 0..num_candidates {
        let score = scores[2 * i + 1];
        if score <= score_threshold {
            continue;
        }

        let left = (boxes[4 * i] * width as f32).clamp(0.0, width as f32);
        let top = (boxes[4 * i + 1] * height as f32).clamp(0.0, height as f32);
        let right = (boxes[4 * i + 2] * width as f32).clamp(0.0, width as f32);
        let bottom = (boxes[4 * i + 3] * height as f32).clamp(0.0, height as f32);

        candidates.push((
            score,
            FaceRegion {
                top,
                right,
                bottom,
                left,
            },
        ));
    }

    candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut keep: Vec<FaceRegion> = Vec::new();
    for (_, region) in candidates {
        let bbox = region.to_bbox();
        if keep.iter().all(|kept| iou(&kept.to_bbox(), &bbox) <= nms_threshold) {
            keep.push(region);
        }
    }

    Ok(keep)
}

/// Scale a vector to unit L2 norm in place.
fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_conversion_is_canonical() {
        let region = FaceRegion {
            top: 20.0,
            right: 110.0,
            bottom: 220.0,
            left: 10.0,
        };
        let bbox = region.to_bbox();
        assert_eq!(bbox.left, 10.0);
        assert_eq!(bbox.top, 20.0);
        assert_eq!(bbox.right, 110.0);
        assert_eq!(bbox.bottom, 220.0);
        assert!(bbox.is_canonical());
    }

    #[test]
    fn test_degenerate_region_still_canonical() {
        let region = FaceRegion {
            top: 50.0,
            right: 10.0,
            bottom: 20.0,
            left: 40.0,
        };
        assert!(region.to_bbox().is_canonical());
    }

    #[test]
    fn test_try_load_without_models_is_none() {
        let config = FaceDetectorConfig {
            locator_model_path: "/nonexistent/locator.onnx".to_string(),
            encoder_model_path: "/nonexistent/encoder.onnx".to_string(),
            ..Default::default()
        };
        assert!(FaceDetector::try_load(config).is_none());
    }

    #[test]
    fn test_regions_from_output_thresholds() {
        // Two candidates: one confident face, one background-dominated
        let scores = [0.1, 0.9, 0.8, 0.2];
        let boxes = [0.1, 0.1, 0.5, 0.5, 0.6, 0.6, 0.9, 0.9];
        let regions = regions_from_output(&scores, &boxes, 100, 100, 0.7, 0.3).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].left, 10.0);
        assert_eq!(regions[0].top, 10.0);
        assert_eq!(regions[0].right, 50.0);
        assert_eq!(regions[0].bottom, 50.0);
    }

    #[test]
    fn test_regions_from_output_nms() {
        // Two nearly identical confident candidates collapse to one
        let scores = [0.05, 0.95, 0.05, 0.9];
        let boxes = [0.1, 0.1, 0.5, 0.5, 0.11, 0.11, 0.51, 0.51];
        let regions = regions_from_output(&scores, &boxes, 100, 100, 0.7, 0.3).unwrap();
        assert_eq!(regions.len(), 1);
    }

    #[test]
    fn test_regions_from_output_rejects_mismatch() {
        let scores = [0.1, 0.9];
        let boxes = [0.1, 0.1, 0.5];
        assert!(regions_from_output(&scores, &boxes, 100, 100, 0.7, 0.3).is_err());
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 0.001);
        assert!((v[1] - 0.8).abs() < 0.001);

        let mut zeros = vec![0.0, 0.0];
        l2_normalize(&mut zeros);
        assert_eq!(zeros, vec![0.0, 0.0]);
    }
}
