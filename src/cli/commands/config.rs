use crate::config::ShellConfig;
use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use colored::*;
use log::info;
use std::path::PathBuf;

#[derive(Args)]
pub struct ConfigCommands {
    #[command(subcommand)]
    pub command: ConfigSubcommands,
}

#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Show the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Write a config file with defaults or a preset
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
        /// Starting values
        #[arg(long, value_enum, default_value_t = Preset::Default)]
        preset: Preset,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Preset {
    Default,
    Responsive,
    Relaxed,
}

impl Preset {
    fn config(self) -> ShellConfig {
        match self {
            Preset::Default => ShellConfig::default(),
            Preset::Responsive => ShellConfig::responsive(),
            Preset::Relaxed => ShellConfig::relaxed(),
        }
    }
}

fn resolve_path(path: Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => ShellConfig::get_config_path(),
    }
}

pub async fn config_command(args: ConfigCommands, path: Option<PathBuf>) -> Result<()> {
    let path = resolve_path(path)?;

    match args.command {
        ConfigSubcommands::Show => {
            let config = ShellConfig::load_from(&path)?;
            println!(
                "  {} {}",
                "Config file:".bright_white().bold(),
                path.display().to_string().cyan()
            );
            if !path.exists() {
                println!("  {}", "(not present, showing defaults)".dimmed());
            }
            println!();
            print!("{}", config.to_toml()?);
        }
        ConfigSubcommands::Path => {
            println!("{}", path.display());
        }
        ConfigSubcommands::Init { force, preset } => {
            if path.exists() && !force {
                anyhow::bail!("Config file {:?} already exists. Use --force to overwrite", path);
            }
            info!("Writing {:?} config to {:?}", preset, path);
            preset.config().save_to(&path)?;
            println!(
                "{} Config written to {}",
                "✓".bright_green().bold(),
                path.display().to_string().bright_green()
            );
        }
    }

    Ok(())
}

/// Config from `path` or the default location
pub fn load_config(path: Option<PathBuf>) -> Result<ShellConfig> {
    ShellConfig::load_from(&resolve_path(path)?)
}
