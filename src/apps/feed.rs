//! Photo feed with post detail pages

use crate::apps::forum::open_controls;
use crate::apps::view_cell::{ViewCell, parse_action};
use crate::shell::error::ShellError;
use crate::shell::events::ViewNotifier;
use crate::shell::frame::{DEFAULT_ROOT_VIEW, LiveView, ViewFrame};
use crate::shell::header::HeaderControl;
use crate::shell::registry::{RootReset, SubApp};
use crossterm::event::KeyCode;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use std::collections::HashSet;
use std::sync::Mutex;

pub const NAME: &str = "feed";
const POST_VIEW: &str = "post";

const POSTS: &[(&str, &str)] = &[
    ("p1", "Sunrise over the harbour"),
    ("p2", "First snow in the park"),
    ("p3", "Market day"),
    ("p4", "Night trams"),
];

pub struct FeedApp {
    view: ViewCell,
    liked: Mutex<HashSet<String>>,
}

impl FeedApp {
    pub fn new() -> Self {
        Self {
            view: ViewCell::new(DEFAULT_ROOT_VIEW, false),
            liked: Mutex::new(HashSet::new()),
        }
    }

    fn post_view(&self, id: &str, caption: &str) -> LiveView {
        let liked = self.liked.lock().unwrap_or_else(|p| p.into_inner()).contains(id);
        LiveView::new(POST_VIEW)
            .with_title(caption)
            .with_target(id)
            .with_extra("liked", liked.to_string())
    }

    fn unknown(id: &str) -> ShellError {
        ShellError::SubApp {
            app: NAME.to_string(),
            reason: format!("no post '{}'", id),
        }
    }
}

impl Default for FeedApp {
    fn default() -> Self {
        Self::new()
    }
}

impl SubApp for FeedApp {
    fn name(&self) -> &str {
        NAME
    }

    fn title(&self) -> &str {
        "Feed"
    }

    fn root_content(&self) -> Text<'static> {
        let live = self.view.get();
        let liked = self.liked.lock().unwrap_or_else(|p| p.into_inner());

        if let Some((id, caption)) = live
            .target_id
            .as_deref()
            .and_then(|id| POSTS.iter().find(|(post, _)| *post == id))
        {
            let heart = if liked.contains(*id) { "♥ liked" } else { "♡" };
            return Text::from(vec![
                Line::from(Span::styled(*caption, Style::default().add_modifier(Modifier::BOLD))),
                Line::from(""),
                Line::from(heart),
            ]);
        }

        let mut lines = vec![Line::from(Span::styled(
            "Your feed",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ))];
        lines.extend(POSTS.iter().enumerate().map(|(i, (id, caption))| {
            let mark = if liked.contains(*id) { " ♥" } else { "" };
            Line::from(format!("  {}. {}{}", i + 1, caption, mark))
        }));
        Text::from(lines)
    }

    fn bind_events(&self) -> Result<(), ShellError> {
        Ok(())
    }

    fn live_view(&self) -> Option<LiveView> {
        Some(self.view.get())
    }

    fn return_to_root(&self) -> RootReset {
        self.view.set(LiveView::new(DEFAULT_ROOT_VIEW));
        RootReset::Handled
    }

    fn header_controls(&self, frame: &ViewFrame) -> Vec<HeaderControl> {
        match frame.view.as_str() {
            POST_VIEW => vec![HeaderControl::app_action(
                "like",
                "Like",
                KeyCode::Char('l'),
                "like",
            )],
            _ => open_controls(POSTS.iter().copied()),
        }
    }

    fn handle_action(&self, action: &str) -> Result<(), ShellError> {
        match parse_action(action) {
            ("open", Some(id)) => {
                let (id, caption) = POSTS
                    .iter()
                    .find(|(post, _)| *post == id)
                    .ok_or_else(|| Self::unknown(id))?;
                self.view.set(self.post_view(id, caption));
                Ok(())
            }
            ("like", None) => {
                let live = self.view.get();
                let id = live.target_id.clone().ok_or_else(|| ShellError::SubApp {
                    app: NAME.to_string(),
                    reason: "no post open".to_string(),
                })?;
                {
                    let mut liked = self.liked.lock().unwrap_or_else(|p| p.into_inner());
                    if !liked.remove(&id) {
                        liked.insert(id.clone());
                    }
                }
                let caption = live.title.clone().unwrap_or_default();
                self.view.set(self.post_view(&id, &caption));
                Ok(())
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
