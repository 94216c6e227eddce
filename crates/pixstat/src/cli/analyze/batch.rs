//! Batch execution with progress reporting.

use indicatif::{ProgressBar, ProgressStyle};
use pixstat_core::{AnalysisOutcome, BatchRunner, FileSet, RunSummary};

/// Run `files` through `runner`, driving a progress bar and printing a
/// summary to stderr.
pub fn run_batch(runner: &BatchRunner, files: FileSet) -> anyhow::Result<()> {
    let progress = create_progress_bar(files.len() as u64)?;

    let result = runner.run_files(files, |outcome| {
        match outcome {
            AnalysisOutcome::Success(record) => progress.set_message(record.filename.clone()),
            AnalysisOutcome::Skipped(err) => {
                progress.set_message(format!("skipped ({})", err.kind()))
            }
        }
        progress.inc(1);
    });
    progress.finish_and_clear();

    let summary = result?;
    print_summary(&summary);
    println!("{}", runner.config().output_location().display());
    Ok(())
}

fn create_progress_bar(total: u64) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )?
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    Ok(pb)
}

fn print_summary(summary: &RunSummary) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Written:      {:>8}", summary.written);
    if summary.skipped > 0 {
        eprintln!("    Skipped:      {:>8}", summary.skipped);
    }
    if summary.rejected > 0 {
        eprintln!("    Rejected:     {:>8}", summary.rejected);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Discovered:   {:>8}", summary.discovered);
    eprintln!("    Duration:     {:>7.1}s", summary.elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.1} img/sec", summary.rate());
    eprintln!("  ====================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_template_is_valid() {
        let pb = create_progress_bar(10).unwrap();
        assert_eq!(pb.length(), Some(10));
    }
}
