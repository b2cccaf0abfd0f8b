//! Direct messages. Publishes its page changes to the shell.

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
use std::collections::BTreeMap;
use std::sync::Mutex;

pub const NAME: &str = "messages";
const CONVERSATION_VIEW: &str = "conversation";

pub struct MessagesApp {
    view: ViewCell,
    /// Conversation id -> (peer, messages)
    conversations: Mutex<BTreeMap<String, (String, Vec<String>)>>,
}

impl MessagesApp {
    pub fn new() -> Self {
        let mut conversations = BTreeMap::new();
        conversations.insert(
            "c1".to_string(),
            ("Aino".to_string(), vec!["Lunch at noon?".to_string()]),
        );
        conversations.insert(
            "c2".to_string(),
            (
                "Jonas".to_string(),
                vec!["Did the build pass?".to_string(), "Ping me when it does".to_string()],
            ),
        );
        Self {
            view: ViewCell::new(DEFAULT_ROOT_VIEW, true),
            conversations: Mutex::new(conversations),
        }
    }

    fn error(reason: impl Into<String>) -> ShellError {
        ShellError::SubApp {
            app: NAME.to_string(),
            reason: reason.into(),
        }
    }

    fn open(&self, id: &str) -> Result<(), ShellError> {
        let (peer, count) = {
            let conversations = self.conversations.lock().unwrap_or_else(|p| p.into_inner());
            let (peer, messages) = conversations
                .get(id)
                .ok_or_else(|| Self::error(format!("no conversation '{}'", id)))?;
            (peer.clone(), messages.len() as i64)
        };
        self.view.set(
            LiveView::new(CONVERSATION_VIEW)
                .with_title(peer)
                .with_target(id)
                .with_counter(count),
        );
        Ok(())
    }

    fn send(&self, text: &str) -> Result<(), ShellError> {
        let live = self.view.get();
        let id = live
            .target_id
            .clone()
            .ok_or_else(|| Self::error("no conversation open"))?;

        let count = {
            let mut conversations = self.conversations.lock().unwrap_or_else(|p| p.into_inner());
            let (_, messages) = conversations
                .get_mut(&id)
                .ok_or_else(|| Self::error(format!("no conversation '{}'", id)))?;
            messages.push(text.to_string());
            messages.len() as i64
        };
        self.view.set(live.with_counter(count));
        Ok(())
    }
}

impl Default for MessagesApp {
    fn default() -> Self {
        Self::new()
    }
}

impl SubApp for MessagesApp {
    fn name(&self) -> &str {
        NAME
    }

    fn title(&self) -> &str {
        "Messages"
    }

    fn root_content(&self) -> Text<'static> {
        let live = self.view.get();
        let conversations = self.conversations.lock().unwrap_or_else(|p| p.into_inner());

        let open = live.target_id.as_ref().and_then(|id| conversations.get(id));
        if let Some((peer, messages)) = open {
            let mut lines = vec![Line::from(Span::styled(
                peer.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ))];
            lines.extend(messages.iter().map(|m| Line::from(format!("  > {}", m))));
            return Text::from(lines);
        }

        let mut lines = vec![Line::from(Span::styled(
            "Conversations",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))];
        for (i, (_, (peer, messages))) in conversations.iter().enumerate() {
            let last = messages.last().map(String::as_str).unwrap_or("");
            lines.push(Line::from(format!("  {}. {}: {}", i + 1, peer, last)));
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
        self.view.set(LiveView::new(DEFAULT_ROOT_VIEW));
        RootReset::Handled
    }

    fn header_controls(&self, frame: &ViewFrame) -> Vec<HeaderControl> {
        if frame.view == CONVERSATION_VIEW {
            return vec![HeaderControl::app_action(
                "reply",
                "Reply",
                KeyCode::Char('r'),
                "send:On my way",
            )];
        }
        let conversations = self.conversations.lock().unwrap_or_else(|p| p.into_inner());
        let items: Vec<(String, String)> = conversations
            .iter()
            .map(|(id, (peer, _))| (id.clone(), peer.clone()))
            .collect();
        open_controls(items.iter().map(|(id, peer)| (id.as_str(), peer.as_str())))
    }

    fn handle_action(&self, action: &str) -> Result<(), ShellError> {
        match parse_action(action) {
            ("open", Some(id)) => self.open(id),
            ("send", Some(text)) => self.send(text),
            _ => Err(Self::error(format!("unsupported action '{}'", action))),
        }
    }

    fn attach_notifier(&self, notifier: ViewNotifier) -> bool {
        self.view.attach(notifier)
    }
}
