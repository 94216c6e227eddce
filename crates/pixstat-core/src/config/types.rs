//! Per-section configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `FileExtractor` section: where to look and what to accept.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExtractorConfig {
    /// Root directory scanned recursively
    pub input_location: PathBuf,

    /// Accepted extensions, with or without a leading dot
    pub extensions: Vec<String>,
}

impl Default for FileExtractorConfig {
    fn default() -> Self {
        Self {
            input_location: PathBuf::from("data/"),
            extensions: vec![".png".to_string(), ".jpg".to_string()],
        }
    }
}

/// How analysis is scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStrategy {
    /// One image at a time on the calling thread
    Sequential,
    /// A fixed pool of worker threads
    #[default]
    Parallel,
}

/// `AnalyzerSettings` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// YuNet ONNX model; face detection is off when unset
    pub face_detection_model_path: Option<PathBuf>,

    /// Run face detection when a model is configured
    pub detect_faces: bool,

    /// Save a copy of each image with detected faces outlined
    pub visualize_faces: bool,

    /// Directory for annotated copies
    pub visualization_output_path: PathBuf,

    /// Sequential or parallel execution
    pub strategy: ExecutionStrategy,

    /// Worker threads for the parallel strategy
    pub workers: usize,

    /// Minimum detection confidence
    pub score_threshold: f32,

    /// IoU above which overlapping detections are merged
    pub nms_threshold: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            face_detection_model_path: None,
            detect_faces: true,
            visualize_faces: false,
            visualization_output_path: PathBuf::from("output/faces"),
            strategy: ExecutionStrategy::Parallel,
            workers: 4,
            score_threshold: 0.9,
            nms_threshold: 0.3,
        }
    }
}

/// `CSVWriter` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvWriterConfig {
    /// Destination CSV file
    pub output_location: PathBuf,
}

impl Default for CsvWriterConfig {
    fn default() -> Self {
        Self {
            output_location: PathBuf::from("output.csv"),
        }
    }
}

/// `Logging` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
