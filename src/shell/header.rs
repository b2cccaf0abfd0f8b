//! Header rendering for the active frame
//!
//! The header is a pure function of the frame plus the application's extra
//! controls. Re-rendering replaces the whole control set, so a key or id
//! from a previous frame can no longer fire.

use crate::shell::frame::ViewFrame;
use crate::shell::registry::{SubApp, SubAppRegistry};
use crate::shell::state::ShellState;
use crossterm::event::KeyCode;
use log::debug;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderAction {
    Back,
    Home,
    /// Forwarded to the active application's `handle_action`
    App(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderControl {
    pub id: String,
    pub label: String,
    pub key: KeyCode,
    pub action: HeaderAction,
}

impl HeaderControl {
    pub fn back() -> Self {
        Self {
            id: "back".to_string(),
            label: "Back".to_string(),
            key: KeyCode::Esc,
            action: HeaderAction::Back,
        }
    }

    pub fn home() -> Self {
        Self {
            id: "home".to_string(),
            label: "Home".to_string(),
            key: KeyCode::Home,
            action: HeaderAction::Home,
        }
    }

    /// Control that forwards `action` to the application
    pub fn app_action(
        id: impl Into<String>,
        label: impl Into<String>,
        key: KeyCode,
        action: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            key,
            action: HeaderAction::App(action.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderView {
    pub app: String,
    pub view: String,
    pub title: String,
    pub controls: Vec<HeaderControl>,
}

impl HeaderView {
    /// Build the header for `frame`. Back and Home are always present; the
    /// application contributes the rest.
    pub fn for_frame(frame: &ViewFrame, app: Option<&dyn SubApp>) -> Self {
        let mut controls = vec![HeaderControl::back()];
        if let Some(app) = app {
            controls.extend(app.header_controls(frame));
        }
        controls.push(HeaderControl::home());

        let title = match frame.counter_value {
            Some(count) => format!("{} ({})", frame.title, count),
            None => frame.title.clone(),
        };

        Self {
            app: frame.app.clone(),
            view: frame.view.clone(),
            title,
            controls,
        }
    }

    pub fn to_line(&self) -> Line<'static> {
        let mut spans = vec![
            Span::styled(
                self.title.clone(),
                Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
        ];

        for control in &self.controls {
            spans.push(Span::styled(
                format!("[{}] {}", key_label(control.key), control.label),
                Style::default().fg(Color::DarkGray),
            ));
            spans.push(Span::raw(" "));
        }

        Line::from(spans)
    }
}

pub fn key_label(key: KeyCode) -> String {
    match key {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        other => format!("{:?}", other),
    }
}

/// The currently attached header handlers
#[derive(Debug, Default)]
pub struct ControlBindings {
    generation: u64,
    by_id: HashMap<String, HeaderAction>,
    by_key: HashMap<KeyCode, HeaderAction>,
}

impl ControlBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the previous control set and attach the header's
    pub fn attach(&mut self, header: &HeaderView) {
        self.clear();
        for control in &header.controls {
            self.by_id.insert(control.id.clone(), control.action.clone());
            self.by_key.entry(control.key).or_insert_with(|| control.action.clone());
        }
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
        self.by_key.clear();
        self.generation += 1;
    }

    pub fn resolve_id(&self, id: &str) -> Option<HeaderAction> {
        self.by_id.get(id).cloned()
    }

    pub fn resolve_key(&self, key: KeyCode) -> Option<HeaderAction> {
        self.by_key.get(&key).cloned()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Number of times the control set was replaced
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Re-render the header for the current frame, or clear it when home
pub(crate) fn refresh_header(state: &mut ShellState, registry: &SubAppRegistry) {
    let Some(frame) = state.stack.current().cloned() else {
        state.header = None;
        state.bindings.clear();
        return;
    };

    let app = registry.get(&frame.app);
    let header = HeaderView::for_frame(&frame, app.as_deref());
    state.bindings.attach(&header);
    state.header_renders += 1;
    debug!("Header rendered for {}:{} ({} controls)", frame.app, frame.view, header.controls.len());
    state.header = Some(header);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_is_pure_function_of_frame() {
        let frame = ViewFrame::new("forum", "Thread", "detail").with_target("42");
        let a = HeaderView::for_frame(&frame, None);
        let b = HeaderView::for_frame(&frame, None);
        assert_eq!(a, b);
        assert_eq!(a.title, "Thread");
        assert_eq!(a.controls.first().map(|c| c.action.clone()), Some(HeaderAction::Back));
        assert_eq!(a.controls.last().map(|c| c.action.clone()), Some(HeaderAction::Home));
    }

    #[test]
    fn test_counter_shows_in_title() {
        let frame = ViewFrame::new("live", "Live", "room").with_counter(128);
        assert_eq!(HeaderView::for_frame(&frame, None).title, "Live (128)");
    }

    #[test]
    fn test_attach_discards_previous_controls() {
        let mut bindings = ControlBindings::new();

        let mut first = HeaderView::for_frame(&ViewFrame::root("forum", "Forum", "root"), None);
        first.controls.push(HeaderControl::app_action(
            "new-thread",
            "New",
            KeyCode::Char('n'),
            "compose",
        ));
        bindings.attach(&first);
        assert_eq!(
            bindings.resolve_id("new-thread"),
            Some(HeaderAction::App("compose".to_string()))
        );

        let second = HeaderView::for_frame(&ViewFrame::root("feed", "Feed", "root"), None);
        bindings.attach(&second);
        assert_eq!(bindings.resolve_id("new-thread"), None);
        assert_eq!(bindings.resolve_key(KeyCode::Char('n')), None);
        assert_eq!(bindings.resolve_key(KeyCode::Esc), Some(HeaderAction::Back));
        assert_eq!(bindings.len(), 2);
    }

    #[test]
    fn test_line_contains_title_and_controls() {
        let header = HeaderView::for_frame(&ViewFrame::root("feed", "Feed", "root"), None);
        let text: String = header.to_line().spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.starts_with("Feed"));
        assert!(text.contains("[Esc] Back"));
        assert!(text.contains("[Home] Home"));
    }
}
