//! Core data types for the pixstat pipeline.
//!
//! These types represent the output of analyzing an image and the
//! bookkeeping of a batch run.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::AnalysisError;
use crate::output::CsvRow;

/// Full output schema, used when face detection is enabled.
pub const DATA_HEADERS: [&str; 7] = [
    "filename",
    "filesize",
    "width",
    "height",
    "aspect_ratio",
    "average_color",
    "num_of_faces",
];

/// Output schema without the face count column.
pub const BASIC_HEADERS: [&str; 6] = [
    "filename",
    "filesize",
    "width",
    "height",
    "aspect_ratio",
    "average_color",
];

/// Metadata extracted from a single image. One of these becomes one CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// File name without directories
    pub filename: String,

    /// File size in bytes at the time of analysis
    pub filesize: u64,

    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Reduced `W:H` ratio, or `N/A` for zero height
    pub aspect_ratio: String,

    /// Mean color as `#rrggbb`
    pub average_color: String,

    /// Detected faces; absent when face detection is disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_of_faces: Option<usize>,
}

impl CsvRow for ImageRecord {
    fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("filename", self.filename.clone()),
            ("filesize", self.filesize.to_string()),
            ("width", self.width.to_string()),
            ("height", self.height.to_string()),
            ("aspect_ratio", self.aspect_ratio.clone()),
            ("average_color", self.average_color.clone()),
        ];
        if let Some(faces) = self.num_of_faces {
            fields.push(("num_of_faces", faces.to_string()));
        }
        fields
    }
}

/// Result of analyzing one file. Analysis never fails past this type.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Success(ImageRecord),
    Skipped(AnalysisError),
}

impl AnalysisOutcome {
    /// Consume the outcome, keeping only a successful record.
    pub fn into_record(self) -> Option<ImageRecord> {
        match self {
            Self::Success(record) => Some(record),
            Self::Skipped(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Statistics for a completed batch run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Files matched by discovery
    pub discovered: usize,

    /// Rows written to the sink
    pub written: usize,

    /// Files the analyzer skipped
    pub skipped: usize,

    /// Records the sink refused (schema mismatch)
    pub rejected: usize,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl RunSummary {
    /// Images analyzed per second, or 0 for an instant run.
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.written + self.skipped) as f64 / secs
        } else {
            0.0
        }
    }
}
