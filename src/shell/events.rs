//! Push channel for sub-applications that report their own view changes
//!
//! Applications that accept a notifier publish here and are reconciled as
//! soon as they change; the rest are polled.

use crate::shell::frame::LiveView;
use log::debug;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// A live view published by a sub-application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewUpdate {
    pub app: String,
    pub live: LiveView,
}

/// Handle given to one sub-application for publishing its view
#[derive(Debug, Clone)]
pub struct ViewNotifier {
    app: String,
    tx: mpsc::UnboundedSender<ViewUpdate>,
}

impl ViewNotifier {
    pub fn app(&self) -> &str {
        &self.app
    }

    /// Publish the current view. Silently ignored once the shell is gone.
    pub fn publish(&self, live: LiveView) {
        let update = ViewUpdate {
            app: self.app.clone(),
            live,
        };
        if self.tx.send(update).is_err() {
            debug!("View update from '{}' dropped: shell closed", self.app);
        }
    }
}

/// Shell side of the push channel
#[derive(Debug, Clone)]
pub struct ViewEvents {
    tx: mpsc::UnboundedSender<ViewUpdate>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<ViewUpdate>>>,
}

impl ViewEvents {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    pub fn notifier(&self, app: &str) -> ViewNotifier {
        ViewNotifier {
            app: app.to_string(),
            tx: self.tx.clone(),
        }
    }

    /// Receiver shared by successive reconciler loops; only one holds it at a time
    pub fn receiver(&self) -> Arc<Mutex<mpsc::UnboundedReceiver<ViewUpdate>>> {
        self.rx.clone()
    }
}

impl Default for ViewEvents {
    fn default() -> Self {
        Self::new()
    }
}
