//! Configuration CLI commands.

use crate::cli::common::{load_config, print_json, CliError, CliResult};
use crate::config::{Config, MIN_KEY_WIDTH};
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Configuration management commands
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
enum ConfigCommand {
    /// Display the effective configuration
    Show(ConfigShowArgs),
    /// Set configuration values
    Set(ConfigSetArgs),
    /// Print the config file location
    Path,
}

/// Display the effective configuration
#[derive(Args, Debug, Clone)]
pub struct ConfigShowArgs {
    /// Output as JSON instead of TOML
    #[arg(long)]
    json: bool,
}

/// Set configuration values
#[derive(Args, Debug, Clone)]
pub struct ConfigSetArgs {
    /// Directory searched for relative layout and table paths
    #[arg(long, value_name = "DIR")]
    layouts_dir: Option<PathBuf>,

    /// Key cell width in characters
    #[arg(long, value_name = "N")]
    key_width: Option<usize>,

    /// Draw the secondary label line (true or false)
    #[arg(long, value_name = "BOOL")]
    show_alt_labels: Option<bool>,

    /// Mark disabled and highlighted keys (true or false)
    #[arg(long, value_name = "BOOL")]
    state_markers: Option<bool>,
}

impl ConfigArgs {
    /// Execute config subcommand
    pub fn execute(&self) -> CliResult<()> {
        match &self.command {
            ConfigCommand::Show(args) => args.execute(),
            ConfigCommand::Set(args) => args.execute(),
            ConfigCommand::Path => {
                let path = Config::config_file_path()
                    .map_err(|e| CliError::io(format!("Failed to locate config file: {e}")))?;
                println!("{}", path.display());
                Ok(())
            }
        }
    }
}

impl ConfigShowArgs {
    /// Execute show command
    pub fn execute(&self) -> CliResult<()> {
        let config = load_config()?;

        if self.json {
            return print_json(&config);
        }

        let toml = config
            .to_toml()
            .map_err(|e| CliError::io(format!("Failed to serialize configuration: {e}")))?;
        print!("{toml}");
        Ok(())
    }
}

impl ConfigSetArgs {
    /// Execute set command
    pub fn execute(&self) -> CliResult<()> {
        if self.layouts_dir.is_none()
            && self.key_width.is_none()
            && self.show_alt_labels.is_none()
            && self.state_markers.is_none()
        {
            return Err(CliError::validation(
                "At least one configuration option must be specified: --layouts-dir, --key-width, --show-alt-labels or --state-markers",
            ));
        }

        let mut config = Config::load().unwrap_or_default();

        if let Some(dir) = &self.layouts_dir {
            if !dir.is_dir() {
                return Err(CliError::validation(format!(
                    "Layouts directory does not exist: {}",
                    dir.display()
                )));
            }
            config.paths.layouts_dir = Some(dir.clone());
        }
        if let Some(width) = self.key_width {
            if width < MIN_KEY_WIDTH {
                return Err(CliError::validation(format!(
                    "Key width must be at least {MIN_KEY_WIDTH}, got {width}"
                )));
            }
            config.ui.key_width = width;
        }
        if let Some(show) = self.show_alt_labels {
            config.ui.show_alt_labels = show;
        }
        if let Some(markers) = self.state_markers {
            config.ui.state_markers = markers;
        }

        config
            .save()
            .map_err(|e| CliError::io(format!("Failed to save configuration: {e:#}")))?;

        println!("Configuration updated successfully.");
        Ok(())
    }
}
