use super::commands::config::ConfigCommands;
use super::commands::demo::DemoCommands;
use super::commands::tui::TuiCommands;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "phone-shell")]
#[command(about = "Phone-style shell hosting lazily loaded sub-applications")]
pub struct Cli {
    /// Write logs to stderr instead of phone-shell.log
    #[arg(long, global = true)]
    pub log_stderr: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run scripted navigation scenarios and print what the shell does
    Demo(DemoCommands),
    /// List the bundled sub-applications and their resources
    Apps,
    /// Launch the interactive shell
    Tui(TuiCommands),
    /// Shell configuration management
    Config(ConfigCommands),
}
