use anyhow::Result;
use clap::Args;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::warn;
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use crate::apps::{self, DemoHost};
use crate::config::ShellConfig;
use crate::shell::{PhoneShell, Screen};

#[derive(Args)]
pub struct TuiCommands {
    /// Slowest simulated resource fetch, in milliseconds
    #[arg(long, default_value_t = 1200)]
    pub max_latency_ms: u64,
}

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub async fn tui_command(args: TuiCommands, config: ShellConfig) -> Result<()> {
    let registry = apps::bundled_registry();
    let host = DemoHost::new(registry.clone())
        .with_latency(Duration::from_millis(100), Duration::from_millis(args.max_latency_ms));
    let shell = PhoneShell::new(config, registry, Arc::new(host));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    shell.show();
    let result = run_tui(&mut terminal, &shell).await;
    shell.hide();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_tui<B: Backend>(terminal: &mut Terminal<B>, shell: &PhoneShell) -> Result<()> {
    let mut tick: usize = 0;

    loop {
        let frame_start = std::time::Instant::now();

        while event::poll(Duration::from_millis(0))? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
                return Ok(());
            }
            if !handle_key(shell, key.code) {
                return Ok(());
            }
        }

        tick = tick.wrapping_add(1);
        terminal.draw(|frame| render(frame, shell, tick))?;

        // Sleep for remainder of 16ms frame (60 FPS)
        let elapsed = frame_start.elapsed();
        if let Some(remaining) = Duration::from_millis(16).checked_sub(elapsed) {
            tokio::time::sleep(remaining).await;
        }
    }
}

/// Returns false to quit
fn handle_key(shell: &PhoneShell, code: KeyCode) -> bool {
    match shell.screen() {
        Screen::Home => match code {
            KeyCode::Char('q') => return false,
            KeyCode::Char(c) => {
                let names = shell.registry().names();
                let picked = c
                    .to_digit(10)
                    .and_then(|d| names.get((d as usize).checked_sub(1)?));
                if let Some(name) = picked {
                    spawn_open(shell, name.clone());
                }
            }
            _ => {}
        },
        Screen::Error { .. } if code == KeyCode::Char('r') => {
            let shell = shell.clone();
            tokio::spawn(async move {
                if let Err(e) = shell.retry().await {
                    warn!("Retry failed: {}", e);
                }
            });
        }
        Screen::Loading { .. } | Screen::Error { .. } => match code {
            KeyCode::Esc => {
                shell.back();
            }
            KeyCode::Home => {
                shell.go_home();
            }
            _ => {}
        },
        Screen::App { .. } => {
            if let Err(e) = shell.press_key(code) {
                warn!("Header control failed: {}", e);
            }
        }
    }
    true
}

fn spawn_open(shell: &PhoneShell, name: String) {
    let shell = shell.clone();
    tokio::spawn(async move {
        if let Err(e) = shell.open_app(&name).await {
            warn!("Opening '{}' failed: {}", name, e);
        }
    });
}

fn render(frame: &mut Frame, shell: &PhoneShell, tick: usize) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let header = match shell.header() {
        Some(header) => header.to_line(),
        None => Line::from(Span::styled(
            "Home",
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        )),
    };
    frame.render_widget(
        Paragraph::new(header).block(Block::default().borders(Borders::ALL)),
        chunks[0],
    );

    match shell.screen() {
        Screen::Home => render_home(frame, shell, chunks[1]),
        Screen::Loading { app } => render_loading(frame, shell, &app, tick, chunks[1]),
        Screen::App { app, content } => {
            // Prefer the app's current page over the content captured at open
            let content = shell
                .registry()
                .get(&app)
                .map(|a| a.root_content())
                .unwrap_or(content);
            frame.render_widget(
                Paragraph::new(content)
                    .wrap(Wrap { trim: false })
                    .block(Block::default().borders(Borders::ALL)),
                chunks[1],
            );
        }
        Screen::Error {
            app,
            message,
            retryable,
        } => {
            let mut lines = vec![
                Line::from(Span::styled(
                    format!("Could not open {}", shell.registry().title_of(&app)),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
                Line::from(message),
                Line::from(""),
            ];
            if retryable {
                lines.push(Line::from("[r] Retry   [Esc] Back"));
            }
            frame.render_widget(
                Paragraph::new(Text::from(lines))
                    .wrap(Wrap { trim: false })
                    .block(Block::default().borders(Borders::ALL)),
                chunks[1],
            );
        }
    }

    let snapshot = shell.snapshot();
    let footer = format!(
        " {} | recent: {} | Ctrl+Q quit",
        snapshot.phase,
        snapshot.recent_apps.join(", ")
    );
    frame.render_widget(
        Paragraph::new(Span::styled(footer, Style::default().fg(Color::DarkGray))),
        chunks[2],
    );
}

fn render_home(frame: &mut Frame, shell: &PhoneShell, area: Rect) {
    let registry = shell.registry();
    let mut lines = vec![Line::from("")];
    for (i, name) in registry.names().iter().enumerate() {
        let state = if registry.is_registered(name) { "" } else { "  (not loaded)" };
        lines.push(Line::from(vec![
            Span::styled(format!("  [{}] ", i + 1), Style::default().fg(Color::Yellow)),
            Span::raw(registry.title_of(name)),
            Span::styled(state, Style::default().fg(Color::DarkGray)),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("  [q] Quit", Style::default().fg(Color::DarkGray))));

    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .block(Block::default().borders(Borders::ALL).title(" Apps ")),
        area,
    );
}

fn render_loading(frame: &mut Frame, shell: &PhoneShell, app: &str, tick: usize, area: Rect) {
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let spinner = SPINNER_FRAMES[(tick / 5) % SPINNER_FRAMES.len()];
    let title = format!("{} Loading {}…", spinner, shell.registry().title_of(app));
    frame.render_widget(Paragraph::new(title), rows[0]);

    // Fetched but not yet registered shows as full while readiness is polled
    let progress = shell.loader().progress(app).unwrap_or_default();
    let label = format!("{}/{} resources", progress.completed, progress.total);
    frame.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(progress.fraction().clamp(0.0, 1.0))
            .label(label),
        rows[1],
    );
}
