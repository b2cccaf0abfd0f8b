use anyhow::Result;
use clap::Parser;
use log::{debug, info};

use phone_shell::cli::commands::{
    apps_command, config::load_config, config_command, demo_command, tui_command,
};
use phone_shell::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.log_stderr {
        env_logger::Builder::from_default_env()
            .target(env_logger::Target::Stderr)
            .init();
    } else {
        // Initialize logger to file (truncate on each run)
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open("phone-shell.log")?;
        env_logger::Builder::from_default_env()
            .target(env_logger::Target::Pipe(Box::new(log_file)))
            .init();
    }

    info!("Starting phone-shell");

    match cli.command {
        Commands::Demo(args) => {
            let config = load_config(cli.config)?;
            debug!("Effective config: {:?}", config);
            demo_command(args, config).await
        }
        Commands::Apps => apps_command().await,
        Commands::Tui(args) => {
            let config = load_config(cli.config)?;
            tui_command(args, config).await
        }
        Commands::Config(args) => config_command(args, cli.config).await,
    }
}
