//! Image analysis pipeline components.
//!
//! - **discovery**: Find candidate files under the input directory
//! - **decode**: Load and decode images, recording file size
//! - **analyzer**: Derive one record (or one skip) per file
//! - **annotate**: Draw detected faces onto a copy of the image
//! - **context**: Per-worker state (detector, visualization directory)
//! - **executor**: Sequential and worker-pool strategies
//! - **runner**: Ties everything to the CSV sink

pub mod analyzer;
pub mod annotate;
pub mod context;
pub mod decode;
pub mod discovery;
pub mod executor;
pub mod runner;

pub use analyzer::analyze_image;
pub use context::{ContextFactory, WorkerContext};
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{FileDiscovery, FileSet};
pub use executor::{Executor, OrderedOutcomes, SequentialOutcomes, WorkerPool};
pub use runner::{headers_for, BatchRunner};
