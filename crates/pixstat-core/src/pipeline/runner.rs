//! End-to-end batch run: discovery, analysis, CSV output.

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::output::CsvSink;
use crate::types::{AnalysisOutcome, RunSummary, BASIC_HEADERS, DATA_HEADERS};

use super::context::{ContextFactory, WorkerContext};
use super::discovery::{FileDiscovery, FileSet};
use super::executor::Executor;

/// Runs one configured batch.
///
/// ```no_run
/// use pixstat_core::{BatchRunner, Config};
///
/// let runner = BatchRunner::new(Config::default())?;
/// let summary = runner.run(|_| {})?;
/// println!("{} rows written", summary.written);
/// # Ok::<(), pixstat_core::PixstatError>(())
/// ```
pub struct BatchRunner {
    config: Config,
    factory: ContextFactory,
}

impl BatchRunner {
    /// Validate `config` and check that the model file exists when face
    /// detection is enabled. Workers build their contexts with
    /// [`WorkerContext::from_config`].
    pub fn new(config: Config) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        if let Some(model) = config.model_path() {
            if !model.is_file() {
                return Err(ConfigError::ModelNotFound(model));
            }
        }
        let factory = WorkerContext::factory(&config);
        Ok(Self { config, factory })
    }

    /// Like [`new`](Self::new), but every worker context comes from
    /// `factory`. The model settings in `config` are not consulted.
    pub fn with_context_factory(
        config: Config,
        factory: ContextFactory,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, factory })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Find the files this run would analyze.
    pub fn discover(&self) -> std::result::Result<FileSet, ConfigError> {
        let discovery = FileDiscovery::new(&self.config.file_extractor.extensions);
        discovery.discover(&self.config.input_location())
    }

    /// Discover and process everything. See [`run_files`](Self::run_files).
    pub fn run<F>(&self, on_outcome: F) -> Result<RunSummary>
    where
        F: FnMut(&AnalysisOutcome),
    {
        let files = self.discover()?;
        self.run_files(files, on_outcome)
    }

    /// Analyze `files` and write one row per success to the configured CSV.
    ///
    /// Workers start (and load their models) before the output file is
    /// opened. `on_outcome` sees every outcome in input order, skips
    /// included.
    pub fn run_files<F>(&self, files: FileSet, mut on_outcome: F) -> Result<RunSummary>
    where
        F: FnMut(&AnalysisOutcome),
    {
        let start = Instant::now();
        let discovered = files.len();
        tracing::info!("Analyzing {} file(s)", discovered);

        let mut executor = Executor::new(
            self.config.analyzer.strategy,
            self.config.analyzer.workers,
            Arc::clone(&self.factory),
        )?;
        let headers = headers_for(executor.detects_faces());

        let output = self.config.output_location();
        let mut sink = CsvSink::create(&output, headers)?;

        let mut skipped = 0;
        let records = executor.outcomes(files).filter_map(|outcome| {
            on_outcome(&outcome);
            match outcome {
                AnalysisOutcome::Success(record) => Some(record),
                AnalysisOutcome::Skipped(_) => {
                    skipped += 1;
                    None
                }
            }
        });
        let written = sink.write_all(records)?;

        let summary = RunSummary {
            discovered,
            written: written.written,
            skipped,
            rejected: written.rejected,
            elapsed: start.elapsed(),
        };
        tracing::info!(
            "Wrote {} row(s) to {:?} ({} skipped) in {:.2}s",
            summary.written,
            output,
            summary.skipped,
            summary.elapsed.as_secs_f64()
        );
        Ok(summary)
    }
}

/// CSV schema for records with or without a face count.
pub fn headers_for(detects_faces: bool) -> &'static [&'static str] {
    if detects_faces {
        &DATA_HEADERS
    } else {
        &BASIC_HEADERS
    }
}
