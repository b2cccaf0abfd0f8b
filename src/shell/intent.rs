//! Tracks the most recent explicit navigation request
//!
//! Used as a gate right before a loader-driven render: a load that finishes
//! after the user went somewhere else must not replace what they are looking at.

use log::debug;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationIntent {
    pub target_app: String,
    pub from_app: Option<String>,
    pub requested_at: Instant,
}

impl NavigationIntent {
    pub fn age(&self) -> Duration {
        Instant::now().duration_since(self.requested_at)
    }
}

#[derive(Debug, Clone)]
pub struct IntentTracker {
    current: Arc<Mutex<Option<NavigationIntent>>>,
    window: Duration,
}

impl IntentTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            current: Arc::new(Mutex::new(None)),
            window,
        }
    }

    /// Store a new intent, replacing any prior one
    pub fn record(&self, target_app: &str, from_app: Option<&str>) {
        debug!("Intent: {:?} -> {}", from_app, target_app);
        *self.lock() = Some(NavigationIntent {
            target_app: target_app.to_string(),
            from_app: from_app.map(str::to_string),
            requested_at: Instant::now(),
        });
    }

    /// Whether a result for `app` may still be shown.
    ///
    /// `active_app` is the shell's active-application pointer at the time of
    /// the check. It counts as "changed away" when it is neither the app the
    /// intent was issued from nor `app` itself.
    pub fn is_valid(&self, app: &str, active_app: Option<&str>) -> bool {
        let guard = self.lock();
        let Some(intent) = guard.as_ref() else {
            return false;
        };

        if intent.age() > self.window {
            return false;
        }
        if intent.target_app != app {
            return false;
        }
        if let Some(active) = active_app {
            if active != app && Some(active) != intent.from_app.as_deref() {
                return false;
            }
        }
        true
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    pub fn current(&self) -> Option<NavigationIntent> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<NavigationIntent>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> IntentTracker {
        IntentTracker::new(Duration::from_secs(30))
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_intent_is_invalid() {
        assert!(!tracker().is_valid("feed", None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_intent_wins() {
        let intents = tracker();
        intents.record("feed", None);
        intents.record("messages", None);

        assert!(!intents.is_valid("feed", None));
        assert!(intents.is_valid("messages", None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_intent_expires() {
        let intents = tracker();
        intents.record("feed", None);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(intents.is_valid("feed", None));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!intents.is_valid("feed", None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_app_moved_away() {
        let intents = tracker();
        intents.record("feed", Some("forum"));

        // Still on the app we came from, or already on the target
        assert!(intents.is_valid("feed", Some("forum")));
        assert!(intents.is_valid("feed", Some("feed")));

        // Something else became active in the meantime
        assert!(!intents.is_valid("feed", Some("settings")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear() {
        let intents = tracker();
        intents.record("feed", None);
        intents.clear();
        assert!(intents.current().is_none());
        assert!(!intents.is_valid("feed", None));
    }
}
