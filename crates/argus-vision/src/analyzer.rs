//! Detection pipeline orchestration.

use std::sync::Arc;

use image::RgbImage;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use argus_models::{DetectedObject, DetectedPerson};

use crate::alarm;
use crate::error::{VisionError, VisionResult};
use crate::face::{FaceDetector, FaceDetectorConfig};
use crate::object::{ObjectDetector, ObjectDetectorConfig};

/// Detector output for one snapshot.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub objects: Vec<DetectedObject>,
    pub people: Vec<DetectedPerson>,
    pub alarms: Vec<String>,
}

/// Runs both detectors in strict sequence and merges their output into
/// the alarm list.
///
/// The object detector is initialized lazily, once per process; a second
/// request arriving during initialization waits on the same cell rather
/// than loading the model again. The face runtime is probed once at
/// construction.
pub struct Analyzer {
    object_config: ObjectDetectorConfig,
    object_detector: OnceCell<Arc<ObjectDetector>>,
    face_detector: Option<Arc<FaceDetector>>,
}

impl Analyzer {
    /// Create an analyzer, probing face-runtime availability.
    pub fn new(object_config: ObjectDetectorConfig, face_config: FaceDetectorConfig) -> Self {
        let face_detector = FaceDetector::try_load(face_config).map(Arc::new);
        info!(
            face_runtime = face_detector.is_some(),
            object_model = %object_config.model_path,
            "Analyzer created"
        );

        Self {
            object_config,
            object_detector: OnceCell::new(),
            face_detector,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self::new(
            ObjectDetectorConfig::from_env(),
            FaceDetectorConfig::from_env(),
        )
    }

    /// Whether the face runtime loaded at startup.
    pub fn face_runtime_available(&self) -> bool {
        self.face_detector.is_some()
    }

    /// Analyze one snapshot: objects, then faces, then alarm rules.
    ///
    /// Object detection failures abort the analysis; face detection
    /// failures degrade to an empty people list.
    pub async fn analyze(&self, image: &RgbImage) -> VisionResult<Analysis> {
        let detector = self.object_detector().await?;

        let frame = image.clone();
        let objects = tokio::task::spawn_blocking(move || detector.detect(&frame))
            .await
            .map_err(|e| VisionError::internal(format!("detection task failed: {}", e)))??;

        let mut alarms = alarm::object_alarms(&objects);

        let people = match &self.face_detector {
            None => Vec::new(),
            Some(faces) => {
                let faces = Arc::clone(faces);
                let frame = image.clone();
                match tokio::task::spawn_blocking(move || faces.detect(&frame)).await {
                    Ok(Ok(people)) => people,
                    Ok(Err(e)) => {
                        warn!(error = %e, "Face detection failed, continuing without faces");
                        Vec::new()
                    }
                    Err(e) => {
                        warn!(error = %e, "Face detection task panicked, continuing without faces");
                        Vec::new()
                    }
                }
            }
        };

        alarm::apply_face_visibility_rule(&objects, &people, &mut alarms);

        Ok(Analysis {
            objects,
            people,
            alarms,
        })
    }

    /// Get or lazily initialize the shared object detector.
    async fn object_detector(&self) -> VisionResult<Arc<ObjectDetector>> {
        self.object_detector
            .get_or_try_init(|| async {
                let config = self.object_config.clone();
                tokio::task::spawn_blocking(move || ObjectDetector::new(config).map(Arc::new))
                    .await
                    .map_err(|e| VisionError::internal(format!("model load task failed: {}", e)))?
            })
            .await
            .cloned()
    }
}
