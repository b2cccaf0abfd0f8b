//! Shared navigation state written by the controller and the reconciler

use crate::shell::error::ShellError;
use crate::shell::frame::{NavigationStack, ViewFrame};
use crate::shell::header::{ControlBindings, HeaderView};
use crate::shell::phase::ShellPhase;
use log::warn;
use ratatui::text::Text;
use std::collections::HashMap;
use tokio::time::Instant;

/// What the shell's content area currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Home,
    /// Placeholder while a module loads
    Loading { app: String },
    App { app: String, content: Text<'static> },
    /// Recoverable failure with an optional retry action
    Error {
        app: String,
        message: String,
        retryable: bool,
    },
}

impl Screen {
    pub fn app(&self) -> Option<&str> {
        match self {
            Screen::Home => None,
            Screen::Loading { app } | Screen::App { app, .. } | Screen::Error { app, .. } => {
                Some(app)
            }
        }
    }

    pub fn is_home(&self) -> bool {
        matches!(self, Screen::Home)
    }

    pub fn error(err: &ShellError, app: &str) -> Self {
        Screen::Error {
            app: app.to_string(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

#[derive(Debug)]
pub struct ShellState {
    pub stack: NavigationStack,
    pub active_app: Option<String>,
    pub phase: ShellPhase,
    pub screen: Screen,
    pub header: Option<HeaderView>,
    pub bindings: ControlBindings,
    /// Bumped on every header render
    pub header_renders: u64,
    pub visible: bool,
    pub last_active: HashMap<String, Instant>,
}

impl ShellState {
    pub fn new() -> Self {
        Self {
            stack: NavigationStack::new(),
            active_app: None,
            phase: ShellPhase::Idle,
            screen: Screen::Home,
            header: None,
            bindings: ControlBindings::new(),
            header_renders: 0,
            visible: false,
            last_active: HashMap::new(),
        }
    }

    pub fn current_frame(&self) -> Option<&ViewFrame> {
        self.stack.current()
    }

    /// Make the active-application pointer agree with the current frame.
    ///
    /// The frame wins. Returns the inconsistency that was repaired, if any.
    pub fn repair_consistency(&mut self) -> Option<ShellError> {
        let frame_app = self.stack.current().map(|f| f.app.clone());
        if frame_app == self.active_app {
            return None;
        }

        let err = ShellError::StateInconsistency {
            pointer: self.active_app.clone().unwrap_or_else(|| "<none>".to_string()),
            frame: frame_app.clone().unwrap_or_else(|| "<none>".to_string()),
        };
        warn!("{}; resynchronizing pointer to the frame", err);
        self.active_app = frame_app;
        Some(err)
    }

    pub fn mark_active(&mut self, app: &str) {
        self.last_active.insert(app.to_string(), Instant::now());
    }

    /// Applications by most recent activation
    pub fn recent_apps(&self) -> Vec<String> {
        let mut apps: Vec<(&String, &Instant)> = self.last_active.iter().collect();
        apps.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        apps.into_iter().map(|(app, _)| app.clone()).collect()
    }
}

impl Default for ShellState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consistent_state_needs_no_repair() {
        let mut state = ShellState::new();
        assert!(state.repair_consistency().is_none());

        state.stack.reset_to(ViewFrame::root("forum", "Forum", "root"));
        state.active_app = Some("forum".to_string());
        assert!(state.repair_consistency().is_none());
    }

    #[test]
    fn test_pointer_follows_frame() {
        let mut state = ShellState::new();
        state.stack.reset_to(ViewFrame::root("forum", "Forum", "root"));
        state.active_app = Some("feed".to_string());

        let repaired = state.repair_consistency();
        assert!(matches!(repaired, Some(ShellError::StateInconsistency { .. })));
        assert_eq!(state.active_app.as_deref(), Some("forum"));

        state.stack.clear();
        assert!(state.repair_consistency().is_some());
        assert!(state.active_app.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_recent_apps_most_recent_first() {
        let mut state = ShellState::new();
        state.mark_active("forum");
        tokio::time::advance(std::time::Duration::from_secs(1)).await;
        state.mark_active("feed");
        tokio::time::advance(std::time::Duration::from_secs(1)).await;
        state.mark_active("forum");

        assert_eq!(state.recent_apps(), vec!["forum".to_string(), "feed".to_string()]);
    }
}
