//! The `pixstat config` command for configuration management.

use clap::{Args, Subcommand};
use pixstat_core::Config;
use std::path::{Path, PathBuf};

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration, defaults filled in
    Show {
        /// Configuration file to read
        #[arg(short, long, env = "PIXSTAT_CONFIG")]
        config: PathBuf,
    },

    /// Write a config file with every default spelled out
    Init {
        /// Destination (.toml for TOML, anything else for JSON)
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigArgs {
    /// Config file this command reads, if any.
    pub fn config_path(&self) -> Option<&Path> {
        match &self.command {
            ConfigCommand::Show { config } => Some(config.as_path()),
            ConfigCommand::Init { .. } => None,
        }
    }
}

/// Execute the config command.
pub fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show { config } => {
            let loaded = Config::load_from(&config)?;
            println!("{}", loaded.to_json()?);
        }

        ConfigCommand::Init { path, force } => {
            init(&path, force)?;
            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let content = Config::default().render_for(path)?;
    std::fs::write(path, content)?;
    Ok(())
}
