//! Live-stream rooms with a running viewer count
//!
//! Its top-level page is the lobby rather than the default root view, and it
//! publishes every change so the header count stays current without polling.

use crate::apps::forum::open_controls;
use crate::apps::view_cell::{ViewCell, parse_action};
use crate::shell::error::ShellError;
use crate::shell::events::ViewNotifier;
use crate::shell::frame::{LiveView, ViewFrame};
use crate::shell::header::HeaderControl;
use crate::shell::registry::{RootReset, SubApp};
use crossterm::event::KeyCode;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

pub const NAME: &str = "live";
pub const LOBBY_VIEW: &str = "lobby";
const ROOM_VIEW: &str = "room";

const ROOMS: &[(&str, &str, i64)] = &[
    ("r1", "Speedrun marathon", 1280),
    ("r2", "Late night jazz", 342),
    ("r3", "Street food tour", 77),
];

pub struct LiveApp {
    view: ViewCell,
}

impl LiveApp {
    pub fn new() -> Self {
        Self {
            view: ViewCell::new(LOBBY_VIEW, true),
        }
    }

    fn room_error(reason: String) -> ShellError {
        ShellError::SubApp {
            app: NAME.to_string(),
            reason,
        }
    }
}

impl Default for LiveApp {
    fn default() -> Self {
        Self::new()
    }
}

impl SubApp for LiveApp {
    fn name(&self) -> &str {
        NAME
    }

    fn title(&self) -> &str {
        "Live"
    }

    fn root_view(&self) -> &str {
        LOBBY_VIEW
    }

    fn root_content(&self) -> Text<'static> {
        let live = self.view.get();
        if live.view == ROOM_VIEW {
            let title = live.title.clone().unwrap_or_default();
            let viewers = live.counter_value.unwrap_or(0);
            return Text::from(vec![
                Line::from(Span::styled(
                    format!("● {}", title),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
                Line::from(format!("{} watching", viewers)),
            ]);
        }

        let mut lines = vec![Line::from(Span::styled(
            "Live now",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))];
        lines.extend(
            ROOMS
                .iter()
                .enumerate()
                .map(|(i, (_, title, viewers))| {
                    Line::from(format!("  {}. {} ({})", i + 1, title, viewers))
                }),
        );
        Text::from(lines)
    }

    fn bind_events(&self) -> Result<(), ShellError> {
        Ok(())
    }

    fn live_view(&self) -> Option<LiveView> {
        Some(self.view.get())
    }

    fn return_to_root(&self) -> RootReset {
        self.view.set(LiveView::new(LOBBY_VIEW));
        RootReset::Handled
    }

    fn header_controls(&self, frame: &ViewFrame) -> Vec<HeaderControl> {
        if frame.view == ROOM_VIEW {
            return vec![HeaderControl::app_action("join", "Join", KeyCode::Char('j'), "join")];
        }
        open_controls(ROOMS.iter().map(|(id, title, _)| (*id, *title)))
    }

    fn handle_action(&self, action: &str) -> Result<(), ShellError> {
        match parse_action(action) {
            ("open", Some(id)) => {
                let (id, title, viewers) = ROOMS
                    .iter()
                    .find(|(room, _, _)| *room == id)
                    .ok_or_else(|| Self::room_error(format!("no room '{}'", id)))?;
                self.view.set(
                    LiveView::new(ROOM_VIEW)
                        .with_title(*title)
                        .with_target(*id)
                        .with_counter(*viewers),
                );
                Ok(())
            }
            ("join", None) => {
                let live = self.view.get();
                if live.view != ROOM_VIEW {
                    return Err(Self::room_error("not in a room".to_string()));
                }
                let viewers = live.counter_value.unwrap_or(0) + 1;
                self.view.set(live.with_counter(viewers));
                Ok(())
            }
            _ => Err(Self::room_error(format!("unsupported action '{}'", action))),
        }
    }

    fn attach_notifier(&self, notifier: ViewNotifier) -> bool {
        self.view.attach(notifier)
    }
}
