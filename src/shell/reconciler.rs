//! Folds sub-application view changes back into the navigation stack
//!
//! Sub-applications navigate internally without telling the shell. While the
//! shell is visible and an application is open, a loop reads the app's live
//! view and rewrites the current frame when it changed. Applications that
//! publish through a `ViewNotifier` are folded as soon as they publish and
//! are not polled.

use crate::config::ReconcilerConfig;
use crate::shell::error::ShellError;
use crate::shell::events::ViewUpdate;
use crate::shell::frame::LiveView;
use crate::shell::header::refresh_header;
use crate::shell::registry::SubAppRegistry;
use crate::shell::state::ShellState;
use log::{debug, info, warn};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Hidden,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to reconcile: home screen
    NoApp,
    /// The active application exposes no live view
    NoLiveView,
    /// Signature unchanged since the last tick
    Unchanged,
    /// Frame rewritten and header re-rendered
    Folded,
    Skipped(SkipReason),
}

/// Signature captured on the previous tick, reset whenever a loop starts
#[derive(Debug, Default, Clone)]
pub struct Baseline {
    signature: Option<String>,
}

impl Baseline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }
}

struct ReconcilerInner {
    state: Arc<Mutex<ShellState>>,
    registry: Arc<SubAppRegistry>,
    config: ReconcilerConfig,
    handle: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Clone)]
pub struct StateReconciler {
    inner: Arc<ReconcilerInner>,
}

impl StateReconciler {
    pub fn new(
        state: Arc<Mutex<ShellState>>,
        registry: Arc<SubAppRegistry>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(ReconcilerInner {
                state,
                registry,
                config,
                handle: Mutex::new(None),
            }),
        }
    }

    /// Stop any running loop and start a fresh one for the active application
    pub fn restart(&self) {
        self.stop();

        let app = {
            let state = self.lock_state();
            if !state.visible {
                return;
            }
            match state.active_app.clone() {
                Some(app) => app,
                None => return,
            }
        };

        if tokio::runtime::Handle::try_current().is_err() {
            debug!("No runtime; reconciler for '{}' not started", app);
            return;
        }

        info!("Reconciler started for '{}'", app);
        let this = self.clone();
        let handle = tokio::spawn(async move { this.run(app).await });
        *self.lock_handle() = Some(handle);
    }

    pub fn stop(&self) {
        if let Some(handle) = self.lock_handle().take() {
            handle.abort();
            debug!("Reconciler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_handle()
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// One polling pass over the active application
    pub fn tick(&self, baseline: &mut Baseline) -> Result<TickOutcome, ShellError> {
        let mut state = self.lock_state();
        if let Some(skip) = Self::skip_reason(&state) {
            return Ok(TickOutcome::Skipped(skip));
        }

        state.repair_consistency();
        let Some(frame) = state.current_frame().cloned() else {
            return Ok(TickOutcome::NoApp);
        };

        let app = self
            .inner
            .registry
            .get(&frame.app)
            .ok_or_else(|| ShellError::UnknownApp(frame.app.clone()))?;

        let live =
            catch_unwind(AssertUnwindSafe(|| app.live_view())).map_err(|_| ShellError::SubApp {
                app: frame.app.clone(),
                reason: "reading the live view panicked".to_string(),
            })?;

        match live {
            Some(live) => Ok(self.fold(&mut state, live, baseline)),
            None => Ok(TickOutcome::NoLiveView),
        }
    }

    /// Fold a view the application published itself
    pub fn apply_update(&self, update: ViewUpdate, baseline: &mut Baseline) -> TickOutcome {
        let mut state = self.lock_state();
        if let Some(skip) = Self::skip_reason(&state) {
            return TickOutcome::Skipped(skip);
        }

        state.repair_consistency();
        let current_app = state.current_frame().map(|f| f.app.clone());
        match current_app {
            Some(app) if app == update.app => self.fold(&mut state, update.live, baseline),
            Some(_) => {
                debug!("Ignoring view update from inactive '{}'", update.app);
                TickOutcome::Unchanged
            }
            None => TickOutcome::NoApp,
        }
    }

    fn skip_reason(state: &ShellState) -> Option<SkipReason> {
        if !state.visible {
            return Some(SkipReason::Hidden);
        }
        if !state.phase.is_idle() {
            return Some(SkipReason::Busy);
        }
        None
    }

    fn fold(&self, state: &mut ShellState, live: LiveView, baseline: &mut Baseline) -> TickOutcome {
        let signature = live.signature();
        if baseline.signature.as_deref() == Some(signature.as_str()) {
            return TickOutcome::Unchanged;
        }
        baseline.signature = Some(signature);

        let Some(frame) = state.current_frame() else {
            return TickOutcome::NoApp;
        };
        let folded = frame.with_live(&live);
        let app = folded.app.clone();
        if !state.stack.replace_current(folded) {
            return TickOutcome::Unchanged;
        }

        debug!("Reconciled '{}' to view '{}'", app, live.view);
        refresh_header(state, &self.inner.registry);
        TickOutcome::Folded
    }

    async fn run(self, app: String) {
        let rx = self.inner.registry.events().receiver();
        let mut rx = rx.lock().await;

        let pushes = self.inner.registry.pushes_updates(&app);
        let mut baseline = Baseline::new();
        let mut tick_no: u32 = 0;
        // The first tick always polls so publishers get a baseline too
        let mut deferred = true;
        let mut next_tick = Instant::now() + self.inner.config.interval_for_tick(0);

        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(next_tick) => {
                    tick_no = tick_no.saturating_add(1);
                    next_tick = Instant::now() + self.inner.config.interval_for_tick(tick_no);

                    // Publishers are only re-read when an update had to wait
                    if pushes && !deferred {
                        continue;
                    }
                    match self.tick(&mut baseline) {
                        Ok(TickOutcome::Skipped(reason)) => {
                            deferred = true;
                            debug!("Reconcile tick for '{}' skipped: {:?}", app, reason);
                        }
                        Ok(outcome) => {
                            deferred = false;
                            if outcome == TickOutcome::Folded {
                                info!("Reconciled '{}' from polling", app);
                            }
                        }
                        Err(e) => warn!("Reconcile tick for '{}' failed: {}", app, e),
                    }
                }
                Some(update) = rx.recv() => {
                    if update.app != app {
                        continue;
                    }
                    match self.apply_update(update, &mut baseline) {
                        TickOutcome::Skipped(_) => deferred = true,
                        TickOutcome::Folded => info!("Reconciled '{}' from pushed update", app),
                        _ => {}
                    }
                }
            }
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ShellState> {
        self.inner.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_handle(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner.handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
