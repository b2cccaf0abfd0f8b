//! Navigation controller: open, push, back and home
//!
//! Owns the writes to the navigation stack and the active-application
//! pointer (the reconciler is the only other writer). Loads go through the
//! module loader and are checked against the intent tracker before they are
//! allowed to render.

use crate::config::FallbackConfig;
use crate::shell::debounce::{self, DebounceGuard};
use crate::shell::error::ShellError;
use crate::shell::frame::{DEFAULT_ROOT_VIEW, ViewFrame};
use crate::shell::header::{HeaderAction, refresh_header};
use crate::shell::intent::IntentTracker;
use crate::shell::loader::ModuleLoader;
use crate::shell::phase::ShellPhase;
use crate::shell::reconciler::StateReconciler;
use crate::shell::registry::{RootReset, SubApp, SubAppRegistry};
use crate::shell::state::{Screen, ShellState};
use crossterm::event::KeyCode;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The application is now active at its root view
    Opened,
    /// Already active and at its root; nothing changed
    AlreadyOpen,
    /// Dropped as a repeat of a very recent request
    Debounced,
    /// The load finished after the user moved on; result discarded
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    /// Home screen already; nothing to go back from
    NoFrame,
    Debounced,
    /// The pending load was abandoned
    CancelledLoad,
    /// The application was reset to its root view
    ReturnedToRoot,
    WentHome,
}

#[derive(Clone)]
pub struct NavigationController {
    state: Arc<Mutex<ShellState>>,
    registry: Arc<SubAppRegistry>,
    loader: ModuleLoader,
    intents: IntentTracker,
    debounce: DebounceGuard,
    reconciler: StateReconciler,
    fallbacks: FallbackConfig,
}

impl NavigationController {
    pub fn new(
        state: Arc<Mutex<ShellState>>,
        registry: Arc<SubAppRegistry>,
        loader: ModuleLoader,
        intents: IntentTracker,
        debounce: DebounceGuard,
        reconciler: StateReconciler,
        fallbacks: FallbackConfig,
    ) -> Self {
        Self {
            state,
            registry,
            loader,
            intents,
            debounce,
            reconciler,
            fallbacks,
        }
    }

    /// Open `name` at its root view, loading it first if needed.
    ///
    /// A failed load leaves the stack untouched and puts an error screen with
    /// a retry action in place of the content.
    pub async fn open_app(&self, name: &str) -> Result<OpenOutcome, ShellError> {
        if !self.registry.is_known(name) {
            return Err(ShellError::UnknownApp(name.to_string()));
        }
        if !self.debounce.try_trigger(&debounce::open_key(name)) {
            return Ok(OpenOutcome::Debounced);
        }

        let (active, current) = {
            let state = self.lock();
            (state.active_app.clone(), state.current_frame().cloned())
        };
        if active.as_deref() == Some(name) {
            if let Some(frame) = &current {
                if self.is_root_frame(frame) {
                    debug!("'{}' already open at its root", name);
                    return Ok(OpenOutcome::AlreadyOpen);
                }
            }
        }

        self.intents.record(name, active.as_deref());

        if self.registry.requires_loading(name) {
            let ticket = self.loader.begin(name);
            {
                let mut state = self.lock();
                state.phase = ShellPhase::Loading { app: name.to_string() };
                state.screen = Screen::Loading { app: name.to_string() };
            }

            let result = ticket.wait().await;
            let mut state = self.lock();
            let still_wanted = self.intents.is_valid(name, state.active_app.as_deref());
            let placeholder_ours = state.phase.is_loading(name);

            if let Err(e) = result {
                if placeholder_ours {
                    state.phase = ShellPhase::Idle;
                    if still_wanted {
                        state.screen = Screen::error(&e, name);
                    } else {
                        self.settle_screen(&mut state);
                    }
                }
                return Err(e);
            }

            if !still_wanted {
                self.loader.record_stale(name);
                if placeholder_ours {
                    state.phase = ShellPhase::Idle;
                    self.settle_screen(&mut state);
                }
                return Ok(OpenOutcome::Stale);
            }

            // Another waiter on the same load may have opened it already
            if state.active_app.as_deref() == Some(name) {
                if let Some(frame) = state.current_frame() {
                    if self.is_root_frame(frame) {
                        debug!("'{}' opened by an earlier waiter", name);
                        return Ok(OpenOutcome::AlreadyOpen);
                    }
                }
            }
        }

        self.transition_to(name)?;
        Ok(OpenOutcome::Opened)
    }

    /// Append a frame and make it active, unless it repeats the tail or the
    /// frame before it
    pub fn push_frame(&self, frame: ViewFrame) -> bool {
        let app_changed = {
            let mut state = self.lock();
            if !state.stack.push(frame.clone()) {
                debug!("Duplicate frame {}:{} not pushed", frame.app, frame.view);
                return false;
            }
            let changed = state.active_app.as_deref() != Some(frame.app.as_str());
            state.active_app = Some(frame.app.clone());
            state.mark_active(&frame.app);
            refresh_header(&mut state, &self.registry);
            changed
        };

        if app_changed {
            self.reconciler.restart();
        }
        true
    }

    /// Leave the current view: to the application's root, or home from the root
    pub fn back(&self) -> BackOutcome {
        if !self.debounce.try_trigger(debounce::BACK_KEY) {
            return BackOutcome::Debounced;
        }
        self.intents.clear();

        let (frame, at_home) = {
            let mut state = self.lock();
            if matches!(state.phase, ShellPhase::Loading { .. }) {
                info!("Back during {}; abandoning the load", state.phase);
                state.phase = ShellPhase::Idle;
                self.settle_screen(&mut state);
                return BackOutcome::CancelledLoad;
            }
            (state.current_frame().cloned(), state.screen.is_home())
        };

        let Some(frame) = frame else {
            if at_home {
                return BackOutcome::NoFrame;
            }
            // Error screen left by a failed open from home
            self.enter_home();
            return BackOutcome::WentHome;
        };

        if self.is_root_frame(&frame) {
            self.enter_home();
            return BackOutcome::WentHome;
        }
        self.return_to_root(&frame)
    }

    /// Clear everything and show the home screen. Returns false when already
    /// home or debounced.
    pub fn go_home(&self) -> bool {
        if !self.debounce.try_trigger(debounce::HOME_KEY) {
            return false;
        }
        {
            let state = self.lock();
            if state.stack.is_empty()
                && state.phase.is_idle()
                && state.active_app.is_none()
                && state.screen.is_home()
            {
                return false;
            }
        }
        self.enter_home();
        true
    }

    /// Dispatch a header control by id through the current control set
    pub fn press_control(&self, id: &str) -> Result<Option<HeaderAction>, ShellError> {
        let action = self.lock().bindings.resolve_id(id);
        self.dispatch(action)
    }

    /// Dispatch a header control by key through the current control set
    pub fn press_key(&self, key: KeyCode) -> Result<Option<HeaderAction>, ShellError> {
        let action = self.lock().bindings.resolve_key(key);
        self.dispatch(action)
    }

    /// Root check for a frame: the application's live view when it exposes
    /// one, else the stored `view` field
    pub fn is_root_frame(&self, frame: &ViewFrame) -> bool {
        let app = self.registry.get(&frame.app);
        let root_view = app
            .as_ref()
            .map(|a| a.root_view().to_string())
            .unwrap_or_else(|| DEFAULT_ROOT_VIEW.to_string());

        if let Some(live) = app.as_ref().and_then(|a| a.live_view()) {
            return live.is_root(&root_view);
        }
        if self.fallbacks.stored_view_root_check {
            return frame.view == root_view;
        }
        true
    }

    /// Reset the stack to the root frame of `name` and render it
    fn transition_to(&self, name: &str) -> Result<(), ShellError> {
        let app = self
            .registry
            .get(name)
            .ok_or_else(|| ShellError::UnknownApp(name.to_string()))?;

        self.lock().phase = ShellPhase::Transitioning {
            to: Some(name.to_string()),
        };
        let root = ViewFrame::root(name, app.title(), app.root_view());
        let screen = Self::render_app(app.as_ref());

        {
            let mut state = self.lock();
            state.stack.reset_to(root);
            state.active_app = Some(name.to_string());
            state.screen = screen;
            state.mark_active(name);
            refresh_header(&mut state, &self.registry);
            state.phase = ShellPhase::Idle;
        }

        info!("Opened '{}'", name);
        self.reconciler.restart();
        Ok(())
    }

    fn return_to_root(&self, frame: &ViewFrame) -> BackOutcome {
        let app = self.registry.get(&frame.app);
        self.lock().phase = ShellPhase::Transitioning {
            to: Some(frame.app.clone()),
        };

        let reset = app
            .as_ref()
            .map(|a| a.return_to_root())
            .unwrap_or(RootReset::Unsupported);

        let app = match (reset, app) {
            (RootReset::Handled, Some(app)) => app,
            // A generic reset cannot move an app that reports its own view
            (RootReset::Unsupported, Some(app))
                if self.fallbacks.generic_root_reset && app.live_view().is_none() =>
            {
                debug!("'{}' has no root handler; applying generic reset", frame.app);
                app
            }
            _ => {
                debug!("No way back to the root of '{}'; going home", frame.app);
                self.enter_home();
                return BackOutcome::WentHome;
            }
        };

        let root = ViewFrame::root(frame.app.clone(), app.title(), app.root_view());
        let screen = Self::render_app(app.as_ref());
        {
            let mut state = self.lock();
            state.stack.reset_to(root);
            state.active_app = Some(frame.app.clone());
            state.screen = screen;
            refresh_header(&mut state, &self.registry);
            state.phase = ShellPhase::Idle;
        }

        info!("'{}' returned to its root", frame.app);
        self.reconciler.restart();
        BackOutcome::ReturnedToRoot
    }

    fn enter_home(&self) {
        self.intents.clear();
        self.reconciler.stop();

        let mut state = self.lock();
        state.stack.clear();
        state.active_app = None;
        state.screen = Screen::Home;
        state.phase = ShellPhase::Idle;
        refresh_header(&mut state, &self.registry);
        info!("Home");
    }

    /// Content plus handlers; a failing binder turns into an error screen
    fn render_app(app: &dyn SubApp) -> Screen {
        let content = app.root_content();
        match app.bind_events() {
            Ok(()) => Screen::App {
                app: app.name().to_string(),
                content,
            },
            Err(e) => {
                warn!("Binding events for '{}' failed: {}", app.name(), e);
                Screen::error(&e, app.name())
            }
        }
    }

    /// Put the screen back in line with the stack after a load was dropped
    fn settle_screen(&self, state: &mut ShellState) {
        state.screen = match state.current_frame().and_then(|f| self.registry.get(&f.app)) {
            Some(app) => Screen::App {
                app: app.name().to_string(),
                content: app.root_content(),
            },
            None => Screen::Home,
        };
    }

    fn dispatch(&self, action: Option<HeaderAction>) -> Result<Option<HeaderAction>, ShellError> {
        let Some(action) = action else {
            return Ok(None);
        };

        match &action {
            HeaderAction::Back => {
                self.back();
            }
            HeaderAction::Home => {
                self.go_home();
            }
            HeaderAction::App(name) => {
                let active = self.lock().active_app.clone();
                let app = active
                    .as_deref()
                    .and_then(|a| self.registry.get(a))
                    .ok_or_else(|| ShellError::UnknownApp(active.clone().unwrap_or_default()))?;
                app.handle_action(name)?;
            }
        }
        Ok(Some(action))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ShellState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
