//! Built-in settings page
//!
//! Ships with the shell, so it is registered up front and never loaded. It
//! has a single page and reports no live view; the shell falls back to the
//! stored frame for its root checks.

use crate::apps::view_cell::parse_action;
use crate::shell::error::ShellError;
use crate::shell::frame::ViewFrame;
use crate::shell::header::HeaderControl;
use crate::shell::registry::SubApp;
use crossterm::event::KeyCode;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use std::collections::BTreeMap;
use std::sync::Mutex;

pub const NAME: &str = "settings";

const TOGGLES: &[(&str, &str, char)] = &[
    ("dark-mode", "Dark mode", 'd'),
    ("notifications", "Notifications", 'n'),
    ("airplane", "Airplane mode", 'a'),
];

pub struct SettingsApp {
    values: Mutex<BTreeMap<&'static str, bool>>,
}

impl SettingsApp {
    pub fn new() -> Self {
        let values = TOGGLES.iter().map(|(key, _, _)| (*key, *key == "notifications")).collect();
        Self {
            values: Mutex::new(values),
        }
    }

    pub fn value(&self, key: &str) -> Option<bool> {
        self.values.lock().unwrap_or_else(|p| p.into_inner()).get(key).copied()
    }
}

impl Default for SettingsApp {
    fn default() -> Self {
        Self::new()
    }
}

impl SubApp for SettingsApp {
    fn name(&self) -> &str {
        NAME
    }

    fn title(&self) -> &str {
        "Settings"
    }

    fn root_content(&self) -> Text<'static> {
        let values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        let mut lines = vec![Line::from(Span::styled(
            "Settings",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))];
        for (key, label, shortcut) in TOGGLES {
            let on = values.get(key).copied().unwrap_or(false);
            let state = if on {
                Span::styled("on", Style::default().fg(Color::Green))
            } else {
                Span::styled("off", Style::default().fg(Color::DarkGray))
            };
            lines.push(Line::from(vec![
                Span::raw(format!("  [{}] {:<16}", shortcut, label)),
                state,
            ]));
        }
        Text::from(lines)
    }

    fn bind_events(&self) -> Result<(), ShellError> {
        Ok(())
    }

    fn header_controls(&self, _frame: &ViewFrame) -> Vec<HeaderControl> {
        TOGGLES
            .iter()
            .map(|(key, label, shortcut)| {
                HeaderControl::app_action(
                    *key,
                    *label,
                    KeyCode::Char(*shortcut),
                    format!("toggle:{}", key),
                )
            })
            .collect()
    }

    fn handle_action(&self, action: &str) -> Result<(), ShellError> {
        let ("toggle", Some(key)) = parse_action(action) else {
            return Err(ShellError::SubApp {
                app: NAME.to_string(),
                reason: format!("unsupported action '{}'", action),
            });
        };

        let mut values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        let value = values.get_mut(key).ok_or_else(|| ShellError::SubApp {
            app: NAME.to_string(),
            reason: format!("no setting '{}'", key),
        })?;
        *value = !*value;
        Ok(())
    }
}
