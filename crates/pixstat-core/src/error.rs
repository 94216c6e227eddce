//! Error types for the pixstat pipeline.
//!
//! Errors are split by blast radius: configuration and sink errors abort the
//! run, while [`AnalysisError`] is contained per file and only ever surfaces
//! inside an [`AnalysisOutcome::Skipped`](crate::types::AnalysisOutcome).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for pixstat operations.
#[derive(Error, Debug)]
pub enum PixstatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Output sink errors
    #[error("Output error: {0}")]
    Sink(#[from] SinkError),
}

/// Configuration errors. All of these are raised before any image is processed.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse JSON configuration
    #[error("{path} is not a valid JSON config: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to parse TOML configuration
    #[error("{path} is not a valid TOML config: {source}")]
    TomlError {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// Input location is missing or not a directory
    #[error("Input directory not found at: {0}")]
    InputNotFound(PathBuf),

    /// Face detection model file does not exist
    #[error("Face detection model not found at: {0}")]
    ModelNotFound(PathBuf),

    /// Face detection model exists but could not be loaded
    #[error("Failed to load face detection model {path}: {message}")]
    ModelLoad { path: PathBuf, message: String },

    /// A worker could not be started
    #[error("Worker startup failed: {0}")]
    WorkerStartup(String),
}

/// Per-file analysis failures.
///
/// This is a closed set: anything that is not an unreadable or missing file
/// or a degenerate geometry is reported as `Unknown`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// The file exists but could not be decoded as an image
    #[error("{path} could not be read as an image: {message}")]
    UnreadableFile { path: PathBuf, message: String },

    /// The file disappeared between discovery and analysis
    #[error("File '{path}' not found. It may have been moved or deleted")]
    MissingFile { path: PathBuf },

    /// Dimensions that make a derived value undefined (zero height)
    #[error("Degenerate image geometry {width}x{height}")]
    DegenerateGeometry { width: u32, height: u32 },

    /// Anything else: detector failures, decoder panics
    #[error("An unexpected error occurred with '{path}': {message}")]
    Unknown { path: PathBuf, message: String },
}

impl AnalysisError {
    /// Short machine-friendly label for summaries and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnreadableFile { .. } => "unreadable",
            Self::MissingFile { .. } => "missing",
            Self::DegenerateGeometry { .. } => "degenerate",
            Self::Unknown { .. } => "unknown",
        }
    }
}

/// Face detector runtime failures. The analyzer turns these into
/// [`AnalysisError::Unknown`] for the image being processed.
#[derive(Error, Debug)]
pub enum DetectionError {
    /// Building the input tensor failed
    #[error("Failed to create input tensor: {0}")]
    Input(String),

    /// The runtime rejected the inference call
    #[error("ONNX inference failed: {0}")]
    Inference(String),

    /// An expected output was missing or had the wrong size
    #[error("Model output {name} is malformed: {message}")]
    Output { name: String, message: String },
}

/// Output sink errors. Any of these compromises the whole run.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Could not create the destination directory
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Could not open the destination file for writing
    #[error("Failed to open {path} for writing: {source}")]
    Open { path: PathBuf, source: csv::Error },

    /// Writing or flushing failed mid-run
    #[error("Fatal I/O error writing to {path}: {source}")]
    Write { path: PathBuf, source: csv::Error },
}

/// Convenience type alias for pixstat results.
pub type Result<T> = std::result::Result<T, PixstatError>;

/// Convenience type alias for per-file analysis results.
pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_error_kinds() {
        let path = PathBuf::from("a.jpg");
        assert_eq!(
            AnalysisError::MissingFile { path: path.clone() }.kind(),
            "missing"
        );
        assert_eq!(
            AnalysisError::UnreadableFile {
                path: path.clone(),
                message: "bad".into()
            }
            .kind(),
            "unreadable"
        );
        assert_eq!(
            AnalysisError::DegenerateGeometry {
                width: 10,
                height: 0
            }
            .kind(),
            "degenerate"
        );
        assert_eq!(
            AnalysisError::Unknown {
                path,
                message: "boom".into()
            }
            .kind(),
            "unknown"
        );
    }

    #[test]
    fn test_config_error_wraps_into_top_level() {
        let err: PixstatError = ConfigError::InputNotFound(PathBuf::from("data/")).into();
        assert!(err.to_string().contains("Input directory not found"));
    }
}
