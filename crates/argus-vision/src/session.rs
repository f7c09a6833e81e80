//! ONNX Runtime session construction shared by both detectors.

use std::path::Path;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use tracing::info;

use crate::error::{VisionError, VisionResult};

/// Create an ONNX Runtime session with automatic execution provider selection.
pub(crate) fn create_session(model_path: &Path) -> VisionResult<Session> {
    let model_bytes = std::fs::read(model_path).map_err(|e| {
        VisionError::model_unavailable(format!(
            "failed to read model file {}: {}",
            model_path.display(),
            e
        ))
    })?;

    let builder = Session::builder()
        .map_err(|e| VisionError::internal(format!("failed to create session builder: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| VisionError::internal(format!("failed to set optimization level: {}", e)))?;

    // Try CUDA on Linux with cuda feature
    #[cfg(all(target_os = "linux", feature = "cuda"))]
    {
        use ort::execution_providers::CUDAExecutionProvider;
        if let Ok(cuda_builder) = builder
            .clone()
            .with_execution_providers([CUDAExecutionProvider::default().build()])
        {
            if let Ok(session) = cuda_builder.commit_from_memory(&model_bytes) {
                info!(model = %model_path.display(), "Using CUDA execution provider");
                return Ok(session);
            }
        }
    }

    // Try CoreML on macOS
    #[cfg(target_os = "macos")]
    {
        use ort::execution_providers::CoreMLExecutionProvider;
        if let Ok(coreml_builder) = builder
            .clone()
            .with_execution_providers([CoreMLExecutionProvider::default().build()])
        {
            if let Ok(session) = coreml_builder.commit_from_memory(&model_bytes) {
                info!(model = %model_path.display(), "Using CoreML execution provider");
                return Ok(session);
            }
        }
    }

    // CPU fallback
    info!(model = %model_path.display(), "Using CPU execution provider");
    builder
        .commit_from_memory(&model_bytes)
        .map_err(|e| VisionError::model_unavailable(format!("failed to load ONNX model: {}", e)))
}
