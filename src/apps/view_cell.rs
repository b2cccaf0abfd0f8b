use crate::shell::events::ViewNotifier;
use crate::shell::frame::LiveView;
use std::sync::Mutex;

/// An application's current page, optionally published to the shell on
/// every change
pub(crate) struct ViewCell {
    live: Mutex<LiveView>,
    notifier: Mutex<Option<ViewNotifier>>,
    publishes: bool,
}

impl ViewCell {
    pub(crate) fn new(root_view: &str, publishes: bool) -> Self {
        Self {
            live: Mutex::new(LiveView::new(root_view)),
            notifier: Mutex::new(None),
            publishes,
        }
    }

    pub(crate) fn get(&self) -> LiveView {
        self.live.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub(crate) fn set(&self, live: LiveView) {
        *self.live.lock().unwrap_or_else(|p| p.into_inner()) = live.clone();
        if let Some(notifier) = self.notifier.lock().unwrap_or_else(|p| p.into_inner()).as_ref() {
            notifier.publish(live);
        }
    }

    pub(crate) fn attach(&self, notifier: ViewNotifier) -> bool {
        if self.publishes {
            *self.notifier.lock().unwrap_or_else(|p| p.into_inner()) = Some(notifier);
        }
        self.publishes
    }
}

/// Split `verb:arg` actions
pub(crate) fn parse_action(action: &str) -> (&str, Option<&str>) {
    match action.split_once(':') {
        Some((verb, arg)) => (verb, Some(arg)),
        None => (action, None),
    }
}
