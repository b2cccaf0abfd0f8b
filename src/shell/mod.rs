//! Navigation core of the phone shell
//!
//! `PhoneShell` wires the loader, the navigation controller and the state
//! reconciler around one shared `ShellState`. Hosts build a registry with
//! manifests (and any built-in sub-applications), hand over a resource
//! fetcher, and drive the shell through `open_app`, `back` and `go_home`.

pub mod debounce;
pub mod error;
pub mod events;
pub mod fetch;
pub mod frame;
pub mod header;
pub mod intent;
pub mod loader;
pub mod navigation;
pub mod phase;
pub mod reconciler;
pub mod registry;
pub mod state;
pub mod testing;

pub use error::ShellError;
pub use fetch::ResourceFetcher;
pub use frame::{DEFAULT_ROOT_VIEW, LiveView, NavigationStack, ViewFrame};
pub use header::{HeaderAction, HeaderControl, HeaderView};
pub use loader::{LoadProgress, LoaderStats, ModuleLoader};
pub use navigation::{BackOutcome, NavigationController, OpenOutcome};
pub use phase::ShellPhase;
pub use reconciler::StateReconciler;
pub use registry::{ModuleManifest, Resource, ResourceKind, RootReset, SubApp, SubAppRegistry};
pub use state::{Screen, ShellState};

use crate::config::ShellConfig;
use crossterm::event::KeyCode;
use debounce::DebounceGuard;
use intent::IntentTracker;
use log::info;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

/// Serializable view of the shell for status output
#[derive(Debug, Clone, Serialize)]
pub struct ShellSnapshot {
    pub visible: bool,
    pub phase: String,
    pub active_app: Option<String>,
    pub screen: String,
    pub stack: Vec<ViewFrame>,
    pub header_title: Option<String>,
    pub recent_apps: Vec<String>,
}

#[derive(Clone)]
pub struct PhoneShell {
    state: Arc<Mutex<ShellState>>,
    registry: Arc<SubAppRegistry>,
    loader: ModuleLoader,
    debounce: DebounceGuard,
    intents: IntentTracker,
    reconciler: StateReconciler,
    navigation: NavigationController,
}

impl PhoneShell {
    /// Build a hidden shell on the home screen
    pub fn new(
        config: ShellConfig,
        registry: Arc<SubAppRegistry>,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> Self {
        let state = Arc::new(Mutex::new(ShellState::new()));
        let loader = ModuleLoader::new(registry.clone(), fetcher, config.loader.clone());
        let debounce = DebounceGuard::new(config.debounce.window());
        let intents = IntentTracker::new(config.intent.window());
        let reconciler =
            StateReconciler::new(state.clone(), registry.clone(), config.reconciler.clone());
        let navigation = NavigationController::new(
            state.clone(),
            registry.clone(),
            loader.clone(),
            intents.clone(),
            debounce.clone(),
            reconciler.clone(),
            config.fallbacks.clone(),
        );

        Self {
            state,
            registry,
            loader,
            debounce,
            intents,
            reconciler,
            navigation,
        }
    }

    /// Make the shell visible and resume reconciling the active application
    pub fn show(&self) {
        self.lock().visible = true;
        info!("Shell shown");
        self.reconciler.restart();
    }

    pub fn hide(&self) {
        self.lock().visible = false;
        self.reconciler.stop();
        info!("Shell hidden");
    }

    pub fn is_visible(&self) -> bool {
        self.lock().visible
    }

    pub async fn open_app(&self, name: &str) -> Result<OpenOutcome, ShellError> {
        self.navigation.open_app(name).await
    }

    pub fn push_frame(&self, frame: ViewFrame) -> bool {
        self.navigation.push_frame(frame)
    }

    pub fn back(&self) -> BackOutcome {
        self.navigation.back()
    }

    pub fn go_home(&self) -> bool {
        self.navigation.go_home()
    }

    pub fn press_control(&self, id: &str) -> Result<Option<HeaderAction>, ShellError> {
        self.navigation.press_control(id)
    }

    pub fn press_key(&self, key: KeyCode) -> Result<Option<HeaderAction>, ShellError> {
        self.navigation.press_key(key)
    }

    /// Re-run the open that put the shell on a retryable error screen.
    ///
    /// Returns `Ok(None)` when there is nothing to retry.
    pub async fn retry(&self) -> Result<Option<OpenOutcome>, ShellError> {
        let app = match &self.lock().screen {
            Screen::Error {
                app, retryable: true, ..
            } => app.clone(),
            _ => return Ok(None),
        };

        info!("Retrying '{}'", app);
        self.debounce.reset(&debounce::open_key(&app));
        self.navigation.open_app(&app).await.map(Some)
    }

    pub fn screen(&self) -> Screen {
        self.lock().screen.clone()
    }

    pub fn stack(&self) -> NavigationStack {
        self.lock().stack.clone()
    }

    pub fn current_frame(&self) -> Option<ViewFrame> {
        self.lock().current_frame().cloned()
    }

    pub fn active_app(&self) -> Option<String> {
        self.lock().active_app.clone()
    }

    pub fn header(&self) -> Option<HeaderView> {
        self.lock().header.clone()
    }

    /// How many times the header has been rendered since start
    pub fn header_renders(&self) -> u64 {
        self.lock().header_renders
    }

    pub fn phase(&self) -> ShellPhase {
        self.lock().phase.clone()
    }

    pub fn recent_apps(&self) -> Vec<String> {
        self.lock().recent_apps()
    }

    /// Whether `app` is active and its content is on screen
    pub fn is_showing(&self, app: &str) -> bool {
        let state = self.lock();
        state.active_app.as_deref() == Some(app)
            && matches!(&state.screen, Screen::App { app: shown, .. } if shown == app)
    }

    pub fn has_pending_intent(&self) -> bool {
        self.intents.current().is_some()
    }

    pub fn snapshot(&self) -> ShellSnapshot {
        let state = self.lock();
        let screen = match &state.screen {
            Screen::Home => "home".to_string(),
            Screen::Loading { app } => format!("loading {}", app),
            Screen::App { app, .. } => format!("app {}", app),
            Screen::Error { app, message, .. } => format!("error {}: {}", app, message),
        };

        ShellSnapshot {
            visible: state.visible,
            phase: state.phase.to_string(),
            active_app: state.active_app.clone(),
            screen,
            stack: state.stack.frames().to_vec(),
            header_title: state.header.as_ref().map(|h| h.title.clone()),
            recent_apps: state.recent_apps(),
        }
    }

    pub fn loader(&self) -> &ModuleLoader {
        &self.loader
    }

    pub fn registry(&self) -> &Arc<SubAppRegistry> {
        &self.registry
    }

    pub fn reconciler(&self) -> &StateReconciler {
        &self.reconciler
    }

    fn lock(&self) -> MutexGuard<'_, ShellState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
