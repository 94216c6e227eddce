//! The `pixstat discover` command: list what an analyze run would pick up.

use clap::Args;
use pixstat_core::config::FileExtractorConfig;
use pixstat_core::FileDiscovery;
use std::path::PathBuf;

/// Arguments for the `discover` command.
#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Directory to scan recursively
    pub dir: PathBuf,

    /// Accepted extensions, comma-separated or repeated (defaults to .png and .jpg)
    #[arg(short, long, value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Print a JSON array instead of one path per line
    #[arg(long)]
    pub json: bool,
}

impl DiscoverArgs {
    fn extensions(&self) -> Vec<String> {
        if self.extensions.is_empty() {
            FileExtractorConfig::default().extensions
        } else {
            self.extensions.clone()
        }
    }
}

/// Execute the discover command.
pub fn execute(args: DiscoverArgs) -> anyhow::Result<()> {
    let files = FileDiscovery::new(&args.extensions()).discover(&args.dir)?;
    if files.is_empty() {
        tracing::warn!("No files matching {:?} in {:?}", args.extensions(), args.dir);
    } else {
        tracing::info!("Found {} matching file(s) in {:?}", files.len(), args.dir);
    }

    if args.json {
        let paths: Vec<_> = files.iter().collect();
        println!("{}", serde_json::to_string_pretty(&paths)?);
    } else {
        for path in files.iter() {
            println!("{}", path.display());
        }
    }
    Ok(())
}
