//! Per-worker state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::detection::{FaceDetector, YuNetDetector};
use crate::error::ConfigError;

/// Builds the context for worker `n`. Called once per worker at startup.
pub type ContextFactory = Arc<dyn Fn(usize) -> Result<WorkerContext, ConfigError> + Send + Sync>;

/// State a worker builds once at startup and reuses for every image.
///
/// Holds the face detector (when detection is enabled) and the directory
/// annotated copies go to (when visualization is enabled). A context is
/// owned by a single worker and never shared.
#[derive(Default)]
pub struct WorkerContext {
    detector: Option<Box<dyn FaceDetector>>,
    visualization_dir: Option<PathBuf>,
}

impl WorkerContext {
    /// A context without face detection.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that counts faces with `detector`.
    pub fn with_detector(detector: Box<dyn FaceDetector>) -> Self {
        Self {
            detector: Some(detector),
            visualization_dir: None,
        }
    }

    /// Enable visualization output into `dir`, creating it if needed.
    ///
    /// Several workers may race to create the same directory; an existing
    /// directory is not an error.
    pub fn with_visualization(mut self, dir: &Path) -> Result<Self, ConfigError> {
        std::fs::create_dir_all(dir).map_err(|e| {
            ConfigError::WorkerStartup(format!(
                "cannot create visualization directory {}: {e}",
                dir.display()
            ))
        })?;
        self.visualization_dir = Some(dir.to_path_buf());
        Ok(self)
    }

    /// Build the context described by `config`: load the YuNet model if face
    /// detection is enabled and prepare the visualization directory.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let Some(model_path) = config.model_path() else {
            return Ok(Self::new());
        };

        tracing::info!("Initializing worker with model: {:?}", model_path);
        let detector = YuNetDetector::load(
            &model_path,
            config.analyzer.score_threshold,
            config.analyzer.nms_threshold,
        )?;
        let context = Self::with_detector(Box::new(detector));

        match config.visualization_dir() {
            Some(dir) => context.with_visualization(&dir),
            None => Ok(context),
        }
    }

    /// A factory that builds [`from_config`](Self::from_config) contexts
    /// from its own copy of `config`.
    pub fn factory(config: &Config) -> ContextFactory {
        let shared = config.clone();
        Arc::new(move |_: usize| Self::from_config(&shared))
    }

    /// Whether records produced with this context carry a face count.
    pub fn detects_faces(&self) -> bool {
        self.detector.is_some()
    }

    pub(crate) fn detector_mut(&mut self) -> Option<&mut (dyn FaceDetector + 'static)> {
        self.detector.as_deref_mut()
    }

    pub(crate) fn visualization_dir(&self) -> Option<&Path> {
        self.visualization_dir.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::FaceBox;
    use crate::error::DetectionError;
    use image::RgbImage;

    struct NoFaces;

    impl FaceDetector for NoFaces {
        fn detect(&mut self, _image: &RgbImage) -> Result<Vec<FaceBox>, DetectionError> {
            Ok(vec![])
        }
    }

    #[test]
    fn test_default_context_has_no_detector() {
        let ctx = WorkerContext::new();
        assert!(!ctx.detects_faces());
        assert!(ctx.visualization_dir().is_none());
    }

    #[test]
    fn test_from_config_without_model() {
        let ctx = WorkerContext::from_config(&Config::default()).unwrap();
        assert!(!ctx.detects_faces());
    }

    #[test]
    fn test_from_config_missing_model_is_fatal() {
        let mut config = Config::default();
        config.analyzer.face_detection_model_path = Some(PathBuf::from("/nonexistent/yunet.onnx"));
        let result = WorkerContext::from_config(&config);
        assert!(matches!(result, Err(ConfigError::ModelNotFound(_))));
    }

    #[test]
    fn test_with_visualization_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let vis = dir.path().join("faces");

        let first = WorkerContext::with_detector(Box::new(NoFaces))
            .with_visualization(&vis)
            .unwrap();
        let second = WorkerContext::with_detector(Box::new(NoFaces))
            .with_visualization(&vis)
            .unwrap();

        assert!(vis.is_dir());
        assert_eq!(first.visualization_dir(), Some(vis.as_path()));
        assert_eq!(second.visualization_dir(), Some(vis.as_path()));
    }

    #[test]
    fn test_with_visualization_fails_on_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("faces");
        std::fs::write(&blocker, b"not a dir").unwrap();

        let result = WorkerContext::new().with_visualization(&blocker);
        assert!(matches!(result, Err(ConfigError::WorkerStartup(_))));
    }
}
