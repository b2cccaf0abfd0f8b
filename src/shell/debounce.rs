//! Collapses rapid repeats of the same action into one
//!
//! Keys are free-form (`open:<app>`, `back`, `home`). A trigger for a key
//! that fired less than the window ago is dropped.

use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Debounce key for opening an application
pub fn open_key(app: &str) -> String {
    format!("open:{}", app)
}

pub const BACK_KEY: &str = "back";
pub const HOME_KEY: &str = "home";

/// Per-action timestamp cache
#[derive(Debug, Clone)]
pub struct DebounceGuard {
    inner: Arc<Mutex<DebounceInner>>,
    window: Duration,
}

#[derive(Debug, Default)]
struct DebounceInner {
    last_trigger: HashMap<String, Instant>,
    accepted: u64,
    dropped: u64,
}

/// Counters for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceStats {
    pub accepted: u64,
    pub dropped: u64,
}

impl DebounceGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DebounceInner::default())),
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Register a trigger for `key`. Returns false if it should be discarded.
    pub fn try_trigger(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut inner = self.lock();

        if let Some(last) = inner.last_trigger.get(key).copied() {
            let since = now.duration_since(last);
            if since < self.window {
                inner.dropped += 1;
                debug!("Debounce: dropped '{}' ({:?} since last)", key, since);
                return false;
            }
        }

        inner.last_trigger.insert(key.to_string(), now);
        inner.accepted += 1;
        true
    }

    /// Forget a key so the next trigger is accepted immediately
    pub fn reset(&self, key: &str) {
        self.lock().last_trigger.remove(key);
    }

    pub fn stats(&self) -> DebounceStats {
        let inner = self.lock();
        DebounceStats {
            accepted: inner.accepted,
            dropped: inner.dropped,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DebounceInner> {
        // Only plain map updates happen under the lock
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
