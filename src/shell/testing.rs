//! Test doubles for exercising the shell without real modules
//!
//! `StubApp` is a sub-application whose internal view can be changed from
//! the outside, the way a user navigating inside it would. `StubFetcher`
//! fetches nothing, optionally slowly or failing, and can register a module
//! some time after its script was fetched.

use crate::shell::error::ShellError;
use crate::shell::events::ViewNotifier;
use crate::shell::fetch::ResourceFetcher;
use crate::shell::frame::{DEFAULT_ROOT_VIEW, LiveView};
use crate::shell::registry::{Resource, ResourceKind, RootReset, SubApp, SubAppRegistry};
use async_trait::async_trait;
use ratatui::text::Text;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct StubApp {
    name: String,
    title: String,
    exposes_live_view: bool,
    has_root_handler: bool,
    pushes_updates: bool,
    broken_view: AtomicBool,
    live: Mutex<LiveView>,
    notifier: Mutex<Option<ViewNotifier>>,
    bind_calls: AtomicUsize,
    root_resets: AtomicUsize,
    actions: Mutex<Vec<String>>,
}

impl StubApp {
    pub fn new(name: &str) -> Self {
        let mut title = name.to_string();
        if let Some(first) = title.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        Self {
            name: name.to_string(),
            title,
            exposes_live_view: false,
            has_root_handler: false,
            pushes_updates: false,
            broken_view: AtomicBool::new(false),
            live: Mutex::new(LiveView::new(DEFAULT_ROOT_VIEW)),
            notifier: Mutex::new(None),
            bind_calls: AtomicUsize::new(0),
            root_resets: AtomicUsize::new(0),
            actions: Mutex::new(Vec::new()),
        }
    }

    /// Report the internal view to the reconciler
    pub fn with_live_view(mut self) -> Self {
        self.exposes_live_view = true;
        self
    }

    /// Provide a dedicated return-to-root handler
    pub fn with_root_handler(mut self) -> Self {
        self.has_root_handler = true;
        self
    }

    /// Publish view changes instead of being polled
    pub fn pushing(mut self) -> Self {
        self.exposes_live_view = true;
        self.pushes_updates = true;
        self
    }

    /// Navigate inside the application, bypassing the shell
    pub fn navigate(&self, live: LiveView) {
        *self.live.lock().unwrap() = live.clone();
        if self.pushes_updates {
            if let Some(notifier) = self.notifier.lock().unwrap().as_ref() {
                notifier.publish(live);
            }
        }
    }

    /// Make reading the live view panic until switched back
    pub fn break_live_view(&self, broken: bool) {
        self.broken_view.store(broken, Ordering::SeqCst);
    }

    pub fn current_view(&self) -> LiveView {
        self.live.lock().unwrap().clone()
    }

    pub fn bind_calls(&self) -> usize {
        self.bind_calls.load(Ordering::SeqCst)
    }

    pub fn root_resets(&self) -> usize {
        self.root_resets.load(Ordering::SeqCst)
    }

    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }
}

impl SubApp for StubApp {
    fn name(&self) -> &str {
        &self.name
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn root_content(&self) -> Text<'static> {
        Text::raw(format!("{} content", self.name))
    }

    fn bind_events(&self) -> Result<(), ShellError> {
        self.bind_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn live_view(&self) -> Option<LiveView> {
        if !self.exposes_live_view {
            return None;
        }
        if self.broken_view.load(Ordering::SeqCst) {
            panic!("{} view state is corrupt", self.name);
        }
        Some(self.current_view())
    }

    fn return_to_root(&self) -> RootReset {
        if !self.has_root_handler {
            return RootReset::Unsupported;
        }
        self.root_resets.fetch_add(1, Ordering::SeqCst);
        self.navigate(LiveView::new(DEFAULT_ROOT_VIEW));
        RootReset::Handled
    }

    fn handle_action(&self, action: &str) -> Result<(), ShellError> {
        self.actions.lock().unwrap().push(action.to_string());
        Ok(())
    }

    fn attach_notifier(&self, notifier: ViewNotifier) -> bool {
        *self.notifier.lock().unwrap() = Some(notifier);
        self.pushes_updates
    }
}

struct PendingRegistration {
    registry: Arc<SubAppRegistry>,
    app: Arc<StubApp>,
    delay: Duration,
}

#[derive(Default)]
pub struct StubFetcher {
    latency: Duration,
    app_latency: HashMap<String, Duration>,
    failing: HashSet<String>,
    fetches: AtomicUsize,
    per_app: Mutex<HashMap<String, usize>>,
    on_script: Mutex<HashMap<String, PendingRegistration>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_app_latency(mut self, app: &str, latency: Duration) -> Self {
        self.app_latency.insert(app.to_string(), latency);
        self
    }

    /// Make every fetch of `path` fail
    pub fn failing(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    /// Register `app` `delay` after any of its scripts has been fetched
    pub fn register_on_script(
        &self,
        registry: Arc<SubAppRegistry>,
        app: Arc<StubApp>,
        delay: Duration,
    ) {
        let name = app.name().to_string();
        self.on_script
            .lock()
            .unwrap()
            .insert(name, PendingRegistration { registry, app, delay });
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn fetch_count_for(&self, app: &str) -> usize {
        self.per_app.lock().unwrap().get(app).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ResourceFetcher for StubFetcher {
    async fn fetch(&self, app: &str, resource: &Resource) -> Result<(), ShellError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        *self.per_app.lock().unwrap().entry(app.to_string()).or_insert(0) += 1;

        let latency = self.app_latency.get(app).copied().unwrap_or(self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if self.failing.contains(&resource.path) {
            return Err(ShellError::ResourceFetch {
                app: app.to_string(),
                resource: resource.path.clone(),
                reason: "not found".to_string(),
            });
        }

        if resource.kind == ResourceKind::Script {
            let pending = self
                .on_script
                .lock()
                .unwrap()
                .get(app)
                .map(|p| (p.registry.clone(), p.app.clone(), p.delay));
            if let Some((registry, app, delay)) = pending {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    registry.register(app);
                });
            }
        }
        Ok(())
    }
}
