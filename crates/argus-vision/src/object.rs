//! Object detection using a YOLOv8-family ONNX model.

use std::path::Path;
use std::sync::Mutex;

use image::{imageops::FilterType, RgbImage};
use ndarray::Array;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::{debug, info};

use argus_models::{BoundingBox, DetectedObject};

use crate::error::{VisionError, VisionResult};
use crate::session::create_session;

/// COCO class names (80 classes). Index is the model's integer class id.
pub const COCO_CLASSES: &[&str] = &[
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck",
    "boat", "traffic light", "fire hydrant", "stop sign", "parking meter", "bench",
    "bird", "cat", "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra",
    "giraffe", "backpack", "umbrella", "handbag", "tie", "suitcase", "frisbee",
    "skis", "snowboard", "sports ball", "kite", "baseball bat", "baseball glove",
    "skateboard", "surfboard", "tennis racket", "bottle", "wine glass", "cup",
    "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse",
    "remote", "keyboard", "cell phone", "microwave", "oven", "toaster", "sink",
    "refrigerator", "book", "clock", "vase", "scissors", "teddy bear", "hair drier",
    "toothbrush",
];

/// Configuration for object detection.
#[derive(Debug, Clone)]
pub struct ObjectDetectorConfig {
    /// Path to ONNX model file
    pub model_path: String,
    /// Confidence threshold for detections
    pub confidence_threshold: f32,
    /// IoU threshold for NMS
    pub nms_threshold: f32,
    /// Input image size (model expects square input)
    pub input_size: u32,
}

impl Default for ObjectDetectorConfig {
    fn default() -> Self {
        Self {
            model_path: "models/yolov8n.onnx".to_string(),
            confidence_threshold: 0.25,
            nms_threshold: 0.45,
            input_size: 640,
        }
    }
}

impl ObjectDetectorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            model_path: std::env::var("OBJECT_MODEL_PATH")
                .unwrap_or(defaults.model_path),
            confidence_threshold: std::env::var("OBJECT_CONFIDENCE_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.confidence_threshold),
            nms_threshold: std::env::var("OBJECT_NMS_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.nms_threshold),
            input_size: defaults.input_size,
        }
    }
}

/// Internal detection candidate before label resolution.
#[derive(Debug, Clone)]
struct Candidate {
    bbox: BoundingBox,
    class_id: usize,
    confidence: f32,
}

/// Object detector backed by a YOLOv8-family ONNX model.
///
/// The session is guarded by a mutex; once constructed the detector is
/// safe to share behind an `Arc` across request handlers.
pub struct ObjectDetector {
    session: Mutex<Session>,
    config: ObjectDetectorConfig,
}

impl ObjectDetector {
    /// Create a new object detector from config.
    ///
    /// Fails with [`VisionError::ModelUnavailable`] if the model file is
    /// missing or cannot be loaded.
    pub fn new(config: ObjectDetectorConfig) -> VisionResult<Self> {
        let model_path = Path::new(&config.model_path);
        if !model_path.exists() {
            return Err(VisionError::model_unavailable(format!(
                "model file not found: {}",
                config.model_path
            )));
        }

        let session = Mutex::new(create_session(model_path)?);
        info!(
            model_path = %config.model_path,
            input_size = config.input_size,
            "Object detector initialized"
        );

        Ok(Self { session, config })
    }

    /// Detect objects in an RGB bitmap.
    ///
    /// Returns labeled detections with boxes in source-image pixel
    /// coordinates, corner format, in model output order.
    pub fn detect(&self, image: &RgbImage) -> VisionResult<Vec<DetectedObject>> {
        let (width, height) = image.dimensions();

        let input = self.preprocess(image)?;
        let outputs = self.run_inference(input)?;
        let candidates = self.postprocess(&outputs, width, height)?;

        debug!(count = candidates.len(), "Object detection completed");

        Ok(candidates
            .into_iter()
            .map(|c| DetectedObject {
                label: COCO_CLASSES
                    .get(c.class_id)
                    .copied()
                    .unwrap_or("unknown")
                    .to_string(),
                confidence: c.confidence,
                bbox: c.bbox,
            })
            .collect())
    }

    /// Get the configuration.
    pub fn config(&self) -> &ObjectDetectorConfig {
        &self.config
    }

    /// Preprocess the bitmap for inference.
    ///
    /// - Resize to model input size (square)
    /// - Normalize pixel values to [0, 1]
    /// - Convert to NCHW format (batch, channels, height, width)
    fn preprocess(&self, image: &RgbImage) -> VisionResult<Value> {
        let input_size = self.config.input_size;
        let resized =
            image::imageops::resize(image, input_size, input_size, FilterType::Triangle);

        let (w, h) = (input_size as usize, input_size as usize);
        let mut chw_data: Vec<f32> = Vec::with_capacity(3 * h * w);
        for c in 0..3 {
            for y in 0..h {
                for x in 0..w {
                    let pixel = resized.get_pixel(x as u32, y as u32);
                    chw_data.push(pixel[c] as f32 / 255.0);
                }
            }
        }

        let shape = vec![1usize, 3, h, w];
        Tensor::from_array((shape, chw_data.into_boxed_slice()))
            .map(Value::from)
            .map_err(|e| VisionError::internal(format!("failed to create tensor: {}", e)))
    }

    /// Run ONNX inference.
    fn run_inference(&self, input: Value) -> VisionResult<Vec<f32>> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| VisionError::internal("session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| VisionError::inference(format!("ONNX inference failed: {}", e)))?;

        // YOLOv8 output is [1, 84, 8400]
        let output = outputs
            .get("output0")
            .ok_or_else(|| VisionError::inference("missing output0 tensor"))?;

        let tensor = output
            .try_extract_tensor::<f32>()
            .map_err(|e| VisionError::inference(format!("failed to extract tensor: {}", e)))?;

        Ok(tensor.1.iter().copied().collect())
    }

    /// Postprocess the YOLOv8 output.
    ///
    /// Output format: [1, 84, 8400], where 84 = 4 (bbox: cx, cy, w, h) +
    /// 80 class scores and 8400 is the number of candidates. Boxes are
    /// converted to corner format and scaled to source-image pixels.
    fn postprocess(
        &self,
        outputs: &[f32],
        orig_width: u32,
        orig_height: u32,
    ) -> VisionResult<Vec<Candidate>> {
        let num_classes = COCO_CLASSES.len();
        let num_features = num_classes + 4;
        let num_boxes = 8400;

        if outputs.len() != num_features * num_boxes {
            return Err(VisionError::inference(format!(
                "unexpected output size: expected {}, got {}",
                num_features * num_boxes,
                outputs.len()
            )));
        }

        // Output is [84, 8400]; transpose to iterate per candidate.
        let output_array = Array::from_shape_vec((num_features, num_boxes), outputs.to_vec())
            .map_err(|e| VisionError::inference(format!("failed to reshape output: {}", e)))?;
        let transposed = output_array.t();

        let input_size = self.config.input_size as f32;
        let scale_w = orig_width as f32 / input_size;
        let scale_h = orig_height as f32 / input_size;

        let mut candidates: Vec<Candidate> = Vec::new();

        for i in 0..num_boxes {
            // Bbox in center format at model resolution
            let cx = transposed[[i, 0]];
            let cy = transposed[[i, 1]];
            let w = transposed[[i, 2]];
            let h = transposed[[i, 3]];

            let mut best_class = 0;
            let mut best_score = 0.0f32;
            for c in 0..num_classes {
                let score = transposed[[i, 4 + c]];
                if score > best_score {
                    best_score = score;
                    best_class = c;
                }
            }

            if best_score < self.config.confidence_threshold {
                continue;
            }

            // Center format to corner format, scaled to source pixels
            let left = ((cx - w / 2.0) * scale_w).clamp(0.0, orig_width as f32);
            let top = ((cy - h / 2.0) * scale_h).clamp(0.0, orig_height as f32);
            let right = ((cx + w / 2.0) * scale_w).clamp(left, orig_width as f32);
            let bottom = ((cy + h / 2.0) * scale_h).clamp(top, orig_height as f32);

            candidates.push(Candidate {
                bbox: BoundingBox::new(left, top, right, bottom),
                class_id: best_class,
                confidence: best_score,
            });
        }

        Ok(non_maximum_suppression(
            candidates,
            self.config.nms_threshold,
        ))
    }
}

/// Apply Non-Maximum Suppression to remove overlapping same-class detections.
fn non_maximum_suppression(mut detections: Vec<Candidate>, nms_threshold: f32) -> Vec<Candidate> {
    if detections.is_empty() {
        return detections;
    }

    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; detections.len()];

    for i in 0..detections.len() {
        if suppressed[i] {
            continue;
        }

        keep.push(detections[i].clone());

        for j in (i + 1)..detections.len() {
            if suppressed[j] || detections[i].class_id != detections[j].class_id {
                continue;
            }

            if iou(&detections[i].bbox, &detections[j].bbox) > nms_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}

/// Intersection over Union of two pixel-coordinate boxes.
pub(crate) fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let x1 = a.left.max(b.left);
    let y1 = a.top.max(b.top);
    let x2 = a.right.min(b.right);
    let y2 = a.bottom.min(b.bottom);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.width() * a.height() + b.width() * b.height() - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(bbox: BoundingBox, class_id: usize, confidence: f32) -> Candidate {
        Candidate {
            bbox,
            class_id,
            confidence,
        }
    }

    #[test]
    fn test_coco_classes() {
        assert_eq!(COCO_CLASSES[0], "person");
        assert_eq!(COCO_CLASSES[43], "knife");
        assert_eq!(COCO_CLASSES.len(), 80);
    }

    #[test]
    fn test_config_default() {
        let config = ObjectDetectorConfig::default();
        assert_eq!(config.input_size, 640);
        assert!((config.confidence_threshold - 0.25).abs() < 0.001);
        assert!((config.nms_threshold - 0.45).abs() < 0.001);
    }

    #[test]
    fn test_missing_model_is_unavailable() {
        let config = ObjectDetectorConfig {
            model_path: "/nonexistent/yolo.onnx".to_string(),
            ..Default::default()
        };
        let err = ObjectDetector::new(config).err().unwrap();
        assert!(matches!(err, VisionError::ModelUnavailable(_)));
    }

    #[test]
    fn test_iou_identical_boxes() {
        let a = BoundingBox::new(10.0, 10.0, 50.0, 50.0);
        assert!((iou(&a, &a) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_iou_disjoint_boxes() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
        assert!(iou(&a, &b) < f32::EPSILON);
    }

    #[test]
    fn test_nms_suppresses_same_class_overlap() {
        let boxes = vec![
            candidate(BoundingBox::new(0.0, 0.0, 100.0, 100.0), 0, 0.9),
            candidate(BoundingBox::new(5.0, 5.0, 105.0, 105.0), 0, 0.8),
            candidate(BoundingBox::new(200.0, 200.0, 300.0, 300.0), 0, 0.7),
        ];
        let kept = non_maximum_suppression(boxes, 0.45);
        assert_eq!(kept.len(), 2);
        assert!((kept[0].confidence - 0.9).abs() < 0.001);
    }

    #[test]
    fn test_nms_keeps_different_classes() {
        let boxes = vec![
            candidate(BoundingBox::new(0.0, 0.0, 100.0, 100.0), 0, 0.9),
            candidate(BoundingBox::new(0.0, 0.0, 100.0, 100.0), 43, 0.8),
        ];
        let kept = non_maximum_suppression(boxes, 0.45);
        assert_eq!(kept.len(), 2);
    }
}
