//! Pixstat Core - batch image metadata extraction.
//!
//! Pixstat walks a directory of images and writes one CSV row per image with
//! its file size, dimensions, reduced aspect ratio, average color and,
//! optionally, the number of faces found by a YuNet detector.
//!
//! # Architecture
//!
//! ```text
//! Discover → Analyze (sequential or worker pool) → Filter skips → CSV
//! ```
//!
//! Per-file failures never abort a run: they become
//! [`AnalysisOutcome::Skipped`] and are logged. Configuration and output
//! failures are fatal and surface as [`PixstatError`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use pixstat_core::{BatchRunner, Config};
//!
//! let config = Config::load_from(Path::new("config.json"))?;
//! let runner = BatchRunner::new(config)?;
//! let summary = runner.run(|_| {})?;
//! println!("{} rows, {} skipped", summary.written, summary.skipped);
//! ```

// Module declarations
pub mod config;
pub mod detection;
pub mod error;
pub mod math;
pub mod output;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use config::{Config, ExecutionStrategy};
pub use detection::{FaceBox, FaceDetector, YuNetDetector};
pub use error::{
    AnalysisError, AnalysisResult, ConfigError, DetectionError, PixstatError, Result, SinkError,
};
pub use output::{CsvRow, CsvSink, SinkSummary};
pub use pipeline::{BatchRunner, ContextFactory, FileDiscovery, FileSet, WorkerContext};
pub use types::{AnalysisOutcome, ImageRecord, RunSummary, BASIC_HEADERS, DATA_HEADERS};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
