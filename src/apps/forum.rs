//! Discussion forum: a thread list and paged thread views

use crate::apps::view_cell::{ViewCell, parse_action};
use crate::shell::error::ShellError;
use crate::shell::events::ViewNotifier;
use crate::shell::frame::{DEFAULT_ROOT_VIEW, LiveView, ViewFrame};
use crate::shell::header::HeaderControl;
use crate::shell::registry::{RootReset, SubApp};
use crossterm::event::KeyCode;
use log::debug;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

pub const NAME: &str = "forum";
const THREAD_VIEW: &str = "thread";

struct Thread {
    id: &'static str,
    title: &'static str,
    author: &'static str,
    pages: i64,
}

const THREADS: &[Thread] = &[
    Thread {
        id: "101",
        title: "Battery drain after update",
        author: "mira",
        pages: 3,
    },
    Thread {
        id: "102",
        title: "Share your home screen setups",
        author: "oskar",
        pages: 5,
    },
    Thread {
        id: "103",
        title: "Dark mode schedule ideas",
        author: "lena",
        pages: 1,
    },
];

/// Polled by the shell: the forum does not publish its page changes
pub struct ForumApp {
    view: ViewCell,
}

impl ForumApp {
    pub fn new() -> Self {
        Self {
            view: ViewCell::new(DEFAULT_ROOT_VIEW, false),
        }
    }

    fn thread(id: &str) -> Option<&'static Thread> {
        THREADS.iter().find(|t| t.id == id)
    }

    fn open_thread(&self, id: &str) -> Result<(), ShellError> {
        let thread = Self::thread(id).ok_or_else(|| ShellError::SubApp {
            app: NAME.to_string(),
            reason: format!("no thread '{}'", id),
        })?;
        self.view.set(
            LiveView::new(THREAD_VIEW)
                .with_title(thread.title)
                .with_target(thread.id)
                .with_counter(1),
        );
        Ok(())
    }

    fn turn_page(&self, delta: i64) -> Result<(), ShellError> {
        let live = self.view.get();
        let thread = live
            .target_id
            .as_deref()
            .and_then(Self::thread)
            .ok_or_else(|| ShellError::SubApp {
                app: NAME.to_string(),
                reason: "not inside a thread".to_string(),
            })?;

        let page = (live.counter_value.unwrap_or(1) + delta).clamp(1, thread.pages);
        self.view.set(live.with_counter(page));
        Ok(())
    }
}

impl Default for ForumApp {
    fn default() -> Self {
        Self::new()
    }
}

impl SubApp for ForumApp {
    fn name(&self) -> &str {
        NAME
    }

    fn title(&self) -> &str {
        "Forum"
    }

    fn root_content(&self) -> Text<'static> {
        let live = self.view.get();
        if live.view == THREAD_VIEW {
            if let Some(thread) = live.target_id.as_deref().and_then(Self::thread) {
                let page = live.counter_value.unwrap_or(1);
                return Text::from(vec![
                    Line::from(Span::styled(
                        thread.title,
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(format!("started by {}", thread.author)),
                    Line::from(""),
                    Line::from(format!("Page {} of {}", page, thread.pages)),
                ]);
            }
        }

        let mut lines = vec![Line::from(Span::styled(
            "Latest threads",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))];
        for (i, thread) in THREADS.iter().enumerate() {
            lines.push(Line::from(format!(
                "  {}. {} ({} pages, {})",
                i + 1,
                thread.title,
                thread.pages,
                thread.author
            )));
        }
        Text::from(lines)
    }

    fn bind_events(&self) -> Result<(), ShellError> {
        Ok(())
    }

    fn live_view(&self) -> Option<LiveView> {
        Some(self.view.get())
    }

    fn return_to_root(&self) -> RootReset {
        debug!("Forum back to thread list");
        self.view.set(LiveView::new(DEFAULT_ROOT_VIEW));
        RootReset::Handled
    }

    fn header_controls(&self, frame: &ViewFrame) -> Vec<HeaderControl> {
        if frame.view == THREAD_VIEW {
            return vec![
                HeaderControl::app_action("prev-page", "Prev", KeyCode::Char('p'), "page:-1"),
                HeaderControl::app_action("next-page", "Next", KeyCode::Char('n'), "page:1"),
            ];
        }
        open_controls(THREADS.iter().map(|t| (t.id, t.title)))
    }

    fn handle_action(&self, action: &str) -> Result<(), ShellError> {
        match parse_action(action) {
            ("open", Some(id)) => self.open_thread(id),
            ("page", Some(delta)) => {
                let delta = delta.parse::<i64>().map_err(|e| ShellError::SubApp {
                    app: NAME.to_string(),
                    reason: format!("bad page step '{}': {}", delta, e),
                })?;
                self.turn_page(delta)
            }
            _ => Err(ShellError::SubApp {
                app: NAME.to_string(),
                reason: format!("unsupported action '{}'", action),
            }),
        }
    }

    fn attach_notifier(&self, notifier: ViewNotifier) -> bool {
        self.view.attach(notifier)
    }
}

/// Number keys opening the first few items of a list
pub(crate) fn open_controls<'a>(
    items: impl Iterator<Item = (&'a str, &'a str)>,
) -> Vec<HeaderControl> {
    items
        .take(9)
        .enumerate()
        .filter_map(|(i, (id, title))| {
            let digit = char::from_digit(i as u32 + 1, 10)?;
            Some(HeaderControl::app_action(
                format!("open-{}", id),
                title,
                KeyCode::Char(digit),
                format!("open:{}", id),
            ))
        })
        .collect()
}
