//! Pixstat CLI - batch image metadata extraction to CSV.
//!
//! Pixstat scans a directory for images and writes one CSV row per image:
//! file size, dimensions, reduced aspect ratio, average color and, with a
//! YuNet model configured, the number of detected faces.
//!
//! # Usage
//!
//! ```bash
//! # Analyze everything the config points at
//! pixstat analyze --config config.json
//!
//! # Override input and output, single-threaded
//! pixstat analyze --config config.json -i ./photos -o report.csv --sequential
//!
//! # List the files a run would pick up
//! pixstat discover ./photos --extensions jpg png
//!
//! # Write a default config
//! pixstat config init config.json
//! ```

use clap::{Parser, Subcommand};
use std::path::Path;

mod cli;
mod logging;

/// Pixstat - batch image metadata extraction to CSV.
#[derive(Parser, Debug)]
#[command(name = "pixstat")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze images and write the results to CSV
    Analyze(cli::analyze::AnalyzeArgs),

    /// List the image files found under a directory
    Discover(cli::discover::DiscoverArgs),

    /// View and create configuration files
    Config(cli::config::ConfigArgs),
}

impl Commands {
    /// Config file named on the command line, if the command takes one.
    fn config_path(&self) -> Option<&Path> {
        match self {
            Self::Analyze(args) => Some(args.config.as_path()),
            Self::Config(args) => args.config_path(),
            Self::Discover(_) => None,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging settings come from the config when there is one. Commands load
    // it again themselves and report errors properly, so failure here only
    // falls back to defaults.
    let config = cli
        .command
        .config_path()
        .and_then(|path| pixstat_core::Config::load_from(path).ok())
        .unwrap_or_default();
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Pixstat v{}", pixstat_core::VERSION);

    match cli.command {
        Commands::Analyze(args) => cli::analyze::execute(args),
        Commands::Discover(args) => cli::discover::execute(args),
        Commands::Config(args) => cli::config::execute(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["pixstat", "analyze", "--config", "c.json", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.command.config_path(), Some(Path::new("c.json")));
    }

    #[test]
    fn test_discover_has_no_config() {
        let cli = Cli::try_parse_from(["pixstat", "discover", "photos"]).unwrap();
        assert!(cli.command.config_path().is_none());
    }
}
