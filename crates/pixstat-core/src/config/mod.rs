//! Configuration management for pixstat.
//!
//! Configuration is a JSON document (TOML is accepted for files ending in
//! `.toml`) with one section per pipeline component. Every key is optional
//! and falls back to the defaults in [`types`].

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File discovery settings
    #[serde(rename = "FileExtractor")]
    pub file_extractor: FileExtractorConfig,

    /// Analyzer and worker settings
    #[serde(rename = "AnalyzerSettings")]
    pub analyzer: AnalyzerConfig,

    /// CSV output settings
    #[serde(rename = "CSVWriter")]
    pub csv_writer: CsvWriterConfig,

    /// Logging settings
    #[serde(rename = "Logging")]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file.
    ///
    /// A missing or unparseable file is an error; there is no silent fallback
    /// to defaults once a path has been given.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config = if is_toml_path(path) {
            toml::from_str(&content).map_err(|source| ConfigError::TomlError {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            serde_json::from_str(&content).map_err(|source| ConfigError::ParseError {
                path: path.to_path_buf(),
                source,
            })?
        };

        config.validate()?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Resolved input directory (with ~ expansion).
    pub fn input_location(&self) -> PathBuf {
        expand(&self.file_extractor.input_location)
    }

    /// Resolved CSV destination (with ~ expansion).
    pub fn output_location(&self) -> PathBuf {
        expand(&self.csv_writer.output_location)
    }

    /// Resolved model path, if face detection is configured and enabled.
    pub fn model_path(&self) -> Option<PathBuf> {
        if !self.analyzer.detect_faces {
            return None;
        }
        self.analyzer.face_detection_model_path.as_deref().map(expand)
    }

    /// Whether records will carry a face count.
    pub fn face_detection_enabled(&self) -> bool {
        self.model_path().is_some()
    }

    /// Resolved visualization directory, if annotated copies are requested.
    pub fn visualization_dir(&self) -> Option<PathBuf> {
        (self.face_detection_enabled() && self.analyzer.visualize_faces)
            .then(|| expand(&self.analyzer.visualization_output_path))
    }

    /// Serialize the config to a pretty JSON string.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Serialize the config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Serialize in the format [`load_from`](Self::load_from) expects for `path`.
    pub fn render_for(&self, path: &Path) -> Result<String, ConfigError> {
        if is_toml_path(path) {
            self.to_toml()
        } else {
            self.to_json()
        }
    }
}

fn is_toml_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"))
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&path_str).into_owned())
}
