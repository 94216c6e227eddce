//! The `pixstat analyze` command.

mod batch;

use clap::Args;
use pixstat_core::{BatchRunner, Config, ExecutionStrategy};
use std::path::PathBuf;

use batch::run_batch;

/// Arguments for the `analyze` command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Configuration file (JSON, or TOML with a .toml extension)
    #[arg(short, long, env = "PIXSTAT_CONFIG")]
    pub config: PathBuf,

    /// Input directory (overrides FileExtractor.input_location)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output CSV file (overrides CSVWriter.output_location)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of worker threads
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Analyze on the main thread, one image at a time
    #[arg(long)]
    pub sequential: bool,

    /// Skip face detection even if a model is configured
    #[arg(long)]
    pub no_faces: bool,

    /// Save copies of each image with detected faces outlined
    #[arg(long, conflicts_with = "no_faces")]
    pub visualize: bool,
}

impl AnalyzeArgs {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.file_extractor.input_location = input.clone();
        }
        if let Some(output) = &self.output {
            config.csv_writer.output_location = output.clone();
        }
        if let Some(workers) = self.workers {
            config.analyzer.workers = workers;
        }
        if self.sequential {
            config.analyzer.strategy = ExecutionStrategy::Sequential;
        }
        if self.no_faces {
            config.analyzer.detect_faces = false;
        }
        if self.visualize {
            config.analyzer.visualize_faces = true;
        }
    }
}

/// Execute the analyze command.
pub fn execute(args: AnalyzeArgs) -> anyhow::Result<()> {
    let mut config = Config::load_from(&args.config)?;
    args.apply_overrides(&mut config);

    if args.visualize && !config.face_detection_enabled() {
        tracing::warn!("--visualize has no effect without a face detection model");
    }

    let runner = BatchRunner::new(config)?;
    let files = runner.discover()?;
    if files.is_empty() {
        tracing::warn!(
            "No matching files found in {:?}; writing header only",
            runner.config().input_location()
        );
    } else {
        tracing::info!("Found {} file(s) to analyze", files.len());
    }

    run_batch(&runner, files)
}
