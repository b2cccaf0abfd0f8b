use crate::apps::{self, DemoHost};
use crate::config::ShellConfig;
use crate::shell::{BackOutcome, OpenOutcome, PhoneShell, Screen, ShellError};
use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::*;
use crossterm::event::KeyCode;
use log::info;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args)]
pub struct DemoCommands {
    /// Scenario to run
    #[arg(value_enum, default_value_t = Scenario::All)]
    pub scenario: Scenario,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Open a thread inside the forum, then back out twice
    Forum,
    /// Leave a slow load for another app before it finishes
    Race,
    /// A module that never initializes, then a retry
    Failure,
    All,
}

pub async fn demo_command(args: DemoCommands, config: ShellConfig) -> Result<()> {
    info!("Running demo scenario {:?}", args.scenario);

    if matches!(args.scenario, Scenario::Forum | Scenario::All) {
        forum_scenario(config.clone()).await?;
    }
    if matches!(args.scenario, Scenario::Race | Scenario::All) {
        race_scenario(config.clone()).await?;
    }
    if matches!(args.scenario, Scenario::Failure | Scenario::All) {
        failure_scenario(config).await?;
    }
    Ok(())
}

fn build_shell(config: ShellConfig, host: impl FnOnce(DemoHost) -> DemoHost) -> PhoneShell {
    let registry = apps::bundled_registry();
    let fetcher = host(DemoHost::new(registry.clone()));
    let shell = PhoneShell::new(config, registry, Arc::new(fetcher));
    shell.show();
    shell
}

fn heading(title: &str) {
    println!();
    println!("  {}", title.bright_white().bold());
    println!("  {}", "=".repeat(title.len()).dimmed());
}

fn step(text: &str) {
    println!("  {} {}", "→".bright_blue(), text);
}

fn print_state(shell: &PhoneShell) {
    let screen = match shell.screen() {
        Screen::Home => "home".bright_green().to_string(),
        Screen::Loading { app } => format!("loading {}", app).bright_yellow().to_string(),
        Screen::App { app, .. } => format!("app {}", app).cyan().to_string(),
        Screen::Error { app, message, .. } => {
            format!("error in {}: {}", app, message).red().to_string()
        }
    };
    println!("      screen: {}", screen);

    let stack = shell.stack();
    if stack.is_empty() {
        println!("      stack:  {}", "(empty)".dimmed());
    }
    for frame in stack.frames() {
        let target = frame
            .target_id
            .as_deref()
            .map(|t| format!(" #{}", t))
            .unwrap_or_default();
        println!("      stack:  {}:{}{}", frame.app.cyan(), frame.view, target.bright_yellow());
    }
    if let Some(header) = shell.header() {
        println!("      header: {}", header.title.bold());
    }
}

fn print_open(app: &str, outcome: &Result<OpenOutcome, ShellError>) {
    match outcome {
        Ok(outcome) => println!(
            "      open {}: {}",
            app.cyan(),
            format!("{:?}", outcome).bright_green()
        ),
        Err(e) => println!("      open {}: {}", app.cyan(), e.to_string().red()),
    }
}

/// Settle past the debounce window and give the reconciler a tick
async fn pause(config: &ShellConfig) {
    let wait = config.debounce.window().max(config.reconciler.fast_interval())
        + Duration::from_millis(50);
    tokio::time::sleep(wait).await;
}

async fn forum_scenario(config: ShellConfig) -> Result<()> {
    heading("Forum: internal navigation and back");
    let shell = build_shell(config.clone(), |host| host);

    step("open forum");
    let outcome = shell.open_app("forum").await;
    print_open("forum", &outcome);
    print_state(&shell);

    step("tap the first thread inside the forum");
    shell.press_key(KeyCode::Char('1'))?;
    pause(&config).await;
    print_state(&shell);

    step("back");
    let back = shell.back();
    println!("      {:?}", back);
    print_state(&shell);

    pause(&config).await;
    step("back again");
    let back = shell.back();
    println!("      {:?}", back);
    print_state(&shell);

    if back != BackOutcome::WentHome {
        anyhow::bail!("expected to end on the home screen, got {:?}", back);
    }
    Ok(())
}

async fn race_scenario(config: ShellConfig) -> Result<()> {
    heading("Race: slow load abandoned for another app");
    let shell = build_shell(config, |host| {
        host.with_latency(Duration::from_millis(1500), Duration::from_millis(2000))
    });

    step("open feed (slow)");
    let slow = shell.clone();
    let feed = tokio::spawn(async move { slow.open_app("feed").await });
    tokio::time::sleep(Duration::from_millis(200)).await;
    print_state(&shell);

    step("open settings while feed is still loading");
    let outcome = shell.open_app("settings").await;
    print_open("settings", &outcome);

    let outcome = feed.await?;
    step("feed load finished");
    print_open("feed", &outcome);
    print_state(&shell);

    let stats = shell.loader().stats();
    println!(
        "      loads: {} started, {} succeeded, {} stale",
        stats.started, stats.succeeded, stats.stale_discarded
    );
    Ok(())
}

async fn failure_scenario(config: ShellConfig) -> Result<()> {
    heading("Failure: module never initializes");
    let quick = ShellConfig {
        loader: crate::config::LoaderConfig {
            poll_interval_ms: 100,
            max_poll_attempts: 5,
            hard_timeout_secs: config.loader.hard_timeout_secs,
        },
        ..config
    };
    let shell = build_shell(quick, |host| {
        host.with_latency(Duration::from_millis(50), Duration::from_millis(100))
            .stuck("live")
    });

    step("open live");
    let outcome = shell.open_app("live").await;
    print_open("live", &outcome);
    print_state(&shell);

    step("retry");
    let retried = shell.retry().await;
    match retried {
        Ok(Some(outcome)) => println!("      retry: {:?}", outcome),
        Ok(None) => println!("      retry: {}", "nothing to retry".dimmed()),
        Err(e) => println!("      retry: {}", e.to_string().red()),
    }
    print_state(&shell);
    Ok(())
}
