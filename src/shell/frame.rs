//! View frames and the navigation back-stack

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// View name every sub-application uses for its top-level page unless it
/// declares another one.
pub const DEFAULT_ROOT_VIEW: &str = "root";

/// One entry in the navigation history: an application and its page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewFrame {
    pub app: String,
    pub title: String,
    pub view: String,

    /// Selected item for detail-style views (thread id, conversation id, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,

    /// Numeric context for views that page or count (floor, unread, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_value: Option<i64>,

    /// Any other `(app, view)`-scoped context
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl ViewFrame {
    pub fn new(app: impl Into<String>, title: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            title: title.into(),
            view: view.into(),
            target_id: None,
            counter_value: None,
            extra: BTreeMap::new(),
        }
    }

    /// Root frame for an application
    pub fn root(
        app: impl Into<String>,
        title: impl Into<String>,
        root_view: impl Into<String>,
    ) -> Self {
        Self::new(app, title, root_view)
    }

    pub fn with_target(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    pub fn with_counter(mut self, value: i64) -> Self {
        self.counter_value = Some(value);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Build the frame that results from folding a live view into this one.
    ///
    /// Returns a new frame; `self` is left untouched since other holders
    /// (header bindings, screens) may still reference it.
    pub fn with_live(&self, live: &LiveView) -> ViewFrame {
        ViewFrame {
            app: self.app.clone(),
            title: live.title.clone().unwrap_or_else(|| self.title.clone()),
            view: live.view.clone(),
            target_id: live.target_id.clone(),
            counter_value: live.counter_value,
            extra: live.extra.clone(),
        }
    }
}

/// Fields a sub-application reports about its own current page.
///
/// Read-only from the shell's point of view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveView {
    pub view: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_value: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl LiveView {
    pub fn new(view: impl Into<String>) -> Self {
        Self {
            view: view.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_target(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    pub fn with_counter(mut self, value: i64) -> Self {
        self.counter_value = Some(value);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Compact signature used to detect changes between reconciler ticks.
    ///
    /// Field order is fixed by the struct and `BTreeMap`, so equal views
    /// always produce equal signatures.
    pub fn signature(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }

    /// Whether the view reports the application's top-level page
    pub fn is_root(&self, root_view: &str) -> bool {
        self.view == root_view && self.target_id.is_none()
    }
}

/// Ordered history of frames; push and pop only at the tail.
///
/// Empty exactly when the shell shows its home screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NavigationStack {
    frames: Vec<ViewFrame>,
}

impl NavigationStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&ViewFrame> {
        self.frames.last()
    }

    pub fn previous(&self) -> Option<&ViewFrame> {
        if self.frames.len() < 2 {
            return None;
        }
        self.frames.get(self.frames.len() - 2)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[ViewFrame] {
        &self.frames
    }

    /// Append a frame unless it equals the tail or the frame before it.
    ///
    /// Returns whether the stack changed.
    pub fn push(&mut self, frame: ViewFrame) -> bool {
        if self.current() == Some(&frame) || self.previous() == Some(&frame) {
            return false;
        }
        self.frames.push(frame);
        true
    }

    pub fn pop(&mut self) -> Option<ViewFrame> {
        self.frames.pop()
    }

    /// Replace the whole history with a single frame
    pub fn reset_to(&mut self, frame: ViewFrame) {
        self.frames.clear();
        self.frames.push(frame);
    }

    /// Swap the tail for a new frame. Returns false if the stack is empty or
    /// the frame is identical to the tail.
    pub fn replace_current(&mut self, frame: ViewFrame) -> bool {
        match self.frames.last_mut() {
            Some(tail) if *tail != frame => {
                *tail = frame;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forum_root() -> ViewFrame {
        ViewFrame::root("forum", "Forum", "root")
    }

    #[test]
    fn test_push_skips_tail_duplicate() {
        let mut stack = NavigationStack::new();
        assert!(stack.push(forum_root()));
        assert!(!stack.push(forum_root()));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_push_skips_prior_to_tail_duplicate() {
        let mut stack = NavigationStack::new();
        let detail = ViewFrame::new("forum", "Thread", "detail").with_target("42");

        stack.push(forum_root());
        stack.push(detail.clone());

        // Overlapping triggers re-pushing the frame underneath
        assert!(!stack.push(forum_root()));
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.current(), Some(&detail));
    }

    #[test]
    fn test_reset_and_replace() {
        let mut stack = NavigationStack::new();
        stack.push(forum_root());
        stack.push(ViewFrame::new("forum", "Thread", "detail"));

        stack.reset_to(ViewFrame::root("feed", "Feed", "root"));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.current().map(|f| f.app.as_str()), Some("feed"));

        assert!(!stack.replace_current(ViewFrame::root("feed", "Feed", "root")));
        assert!(stack.replace_current(ViewFrame::new("feed", "Post", "post")));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_fold_live_view_into_frame() {
        let frame = forum_root();
        let live = LiveView::new("detail").with_target("42");

        let folded = frame.with_live(&live);
        assert_eq!(folded.app, "forum");
        assert_eq!(folded.title, "Forum");
        assert_eq!(folded.view, "detail");
        assert_eq!(folded.target_id.as_deref(), Some("42"));

        // Original frame untouched
        assert_eq!(frame.view, "root");
    }

    #[test]
    fn test_signature_tracks_fields() {
        let a = LiveView::new("detail").with_target("42");
        let b = LiveView::new("detail").with_target("42");
        let c = LiveView::new("detail").with_target("43");

        assert_eq!(a.signature(), b.signature());
        assert_ne!(a.signature(), c.signature());
        assert!(!a.is_root("root"));
        assert!(LiveView::new("root").is_root("root"));
    }
}
