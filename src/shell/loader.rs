//! On-demand module loader
//!
//! Loads a sub-application's resources exactly once, joins concurrent
//! requests for the same name onto one in-flight operation, then polls the
//! registry until the module has registered itself. The whole operation is
//! bounded by a hard timeout.
//!
//! Fetching and initialization are separate steps: a module's scripts may
//! register it some time after their own fetch completed.

use crate::config::LoaderConfig;
use crate::shell::error::ShellError;
use crate::shell::fetch::ResourceFetcher;
use crate::shell::registry::SubAppRegistry;
use futures::future::{self, BoxFuture, FutureExt, Shared};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use uuid::Uuid;

/// A load result shared by every caller waiting on the same module
pub type LoadFuture = Shared<BoxFuture<'static, Result<(), ShellError>>>;

/// Resource completion counts for one load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadProgress {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
}

impl LoadProgress {
    pub fn is_fetched(&self) -> bool {
        self.completed >= self.total
    }

    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed as f64 / self.total as f64
    }
}

/// Handle returned for each load request
pub struct LoadTicket {
    pub id: Uuid,
    pub app: String,
    /// True if this request joined a load that was already running
    pub deduplicated: bool,
    future: LoadFuture,
    progress: watch::Receiver<LoadProgress>,
}

impl LoadTicket {
    pub fn progress(&self) -> LoadProgress {
        *self.progress.borrow()
    }

    pub fn progress_receiver(&self) -> watch::Receiver<LoadProgress> {
        self.progress.clone()
    }

    pub async fn wait(self) -> Result<(), ShellError> {
        self.future.await
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoaderStats {
    pub started: u64,
    pub deduplicated: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub resource_failures: u64,
    pub stale_discarded: u64,
}

struct InFlight {
    id: Uuid,
    started_at: Instant,
    future: LoadFuture,
    progress: watch::Receiver<LoadProgress>,
}

#[derive(Default)]
struct LoaderState {
    in_flight: HashMap<String, InFlight>,
    loaded: HashSet<String>,
    stats: LoaderStats,
}

struct LoaderInner {
    registry: Arc<SubAppRegistry>,
    fetcher: Arc<dyn ResourceFetcher>,
    config: LoaderConfig,
    state: Mutex<LoaderState>,
}

#[derive(Clone)]
pub struct ModuleLoader {
    inner: Arc<LoaderInner>,
}

impl ModuleLoader {
    pub fn new(
        registry: Arc<SubAppRegistry>,
        fetcher: Arc<dyn ResourceFetcher>,
        config: LoaderConfig,
    ) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                registry,
                fetcher,
                config,
                state: Mutex::new(LoaderState::default()),
            }),
        }
    }

    /// Load `name` and wait for the result
    pub async fn load(&self, name: &str) -> Result<(), ShellError> {
        self.begin(name).wait().await
    }

    /// Start (or join) a load without waiting for it
    pub fn begin(&self, name: &str) -> LoadTicket {
        let mut state = self.inner.lock();

        if state.loaded.contains(name) || self.inner.registry.is_registered(name) {
            state.loaded.insert(name.to_string());
            let (_tx, rx) = watch::channel(LoadProgress::default());
            return LoadTicket {
                id: Uuid::new_v4(),
                app: name.to_string(),
                deduplicated: false,
                future: future::ready(Ok(())).boxed().shared(),
                progress: rx,
            };
        }

        if let Some(in_flight) = state.in_flight.get(name) {
            let ticket = LoadTicket {
                id: in_flight.id,
                app: name.to_string(),
                deduplicated: true,
                future: in_flight.future.clone(),
                progress: in_flight.progress.clone(),
            };
            state.stats.deduplicated += 1;
            debug!("Load {} for '{}' already in flight, joining", ticket.id, name);
            return ticket;
        }

        let id = Uuid::new_v4();
        let total = self
            .inner
            .registry
            .manifest(name)
            .map(|m| m.resources.len())
            .unwrap_or(0);
        let (tx, rx) = watch::channel(LoadProgress {
            total,
            ..LoadProgress::default()
        });

        info!("Load {} started for '{}' ({} resources)", id, name, total);
        state.stats.started += 1;

        // Spawned so the load keeps going even if every waiter goes away.
        // The state lock is held until the entry is inserted, so `finish`
        // cannot run before it.
        let inner = self.inner.clone();
        let app = name.to_string();
        let handle = tokio::spawn(async move {
            let started = Instant::now();
            let hard_timeout = inner.config.hard_timeout();
            let result = match tokio::time::timeout(hard_timeout, inner.run(&app, tx)).await {
                Ok(result) => result,
                Err(_) => Err(ShellError::LoadTimeout {
                    app: app.clone(),
                    elapsed: started.elapsed(),
                }),
            };
            inner.finish(&app, id, &result);
            result
        });

        let app = name.to_string();
        let future = async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => {
                    warn!("Load task for '{}' ended abnormally: {}", app, e);
                    Err(ShellError::LoadAborted(app))
                }
            }
        }
        .boxed()
        .shared();

        state.in_flight.insert(
            name.to_string(),
            InFlight {
                id,
                started_at: Instant::now(),
                future: future.clone(),
                progress: rx.clone(),
            },
        );

        LoadTicket {
            id,
            app: name.to_string(),
            deduplicated: false,
            future,
            progress: rx,
        }
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.inner.lock().loaded.contains(name)
    }

    pub fn is_loading(&self, name: &str) -> bool {
        self.inner.lock().in_flight.contains_key(name)
    }

    /// Progress of the in-flight load for `name`, if any
    pub fn progress(&self, name: &str) -> Option<LoadProgress> {
        self.inner
            .lock()
            .in_flight
            .get(name)
            .map(|f| *f.progress.borrow())
    }

    /// In-flight loads with how long each has been running
    pub fn in_flight(&self) -> Vec<(String, Duration)> {
        let now = Instant::now();
        let mut loads: Vec<(String, Duration)> = self
            .inner
            .lock()
            .in_flight
            .iter()
            .map(|(name, f)| (name.clone(), now.duration_since(f.started_at)))
            .collect();
        loads.sort();
        loads
    }

    pub fn stats(&self) -> LoaderStats {
        self.inner.lock().stats
    }

    /// Count a load result that arrived after the user moved on
    pub fn record_stale(&self, name: &str) {
        info!("Discarding stale load result for '{}'", name);
        self.inner.lock().stats.stale_discarded += 1;
    }
}

impl LoaderInner {
    fn lock(&self) -> std::sync::MutexGuard<'_, LoaderState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn run(
        &self,
        app: &str,
        progress: watch::Sender<LoadProgress>,
    ) -> Result<(), ShellError> {
        let manifest = self
            .registry
            .manifest(app)
            .ok_or_else(|| ShellError::UnknownApp(app.to_string()))?;

        // Every resource counts toward completion, failed or not
        let fetches = manifest.resources.iter().map(|resource| {
            let progress = &progress;
            async move {
                let outcome = self.fetcher.fetch(app, resource).await;
                if let Err(e) = &outcome {
                    warn!("{}", e);
                }
                progress.send_modify(|p| {
                    p.completed += 1;
                    if outcome.is_err() {
                        p.failed += 1;
                    }
                });
                outcome.is_ok()
            }
        });
        let failures = future::join_all(fetches)
            .await
            .into_iter()
            .filter(|ok| !ok)
            .count();

        if failures > 0 {
            warn!("{} of {} resources failed for '{}'", failures, manifest.resources.len(), app);
            self.lock().stats.resource_failures += failures as u64;
        }

        self.await_ready(app).await
    }

    async fn await_ready(&self, app: &str) -> Result<(), ShellError> {
        let attempts = self.config.max_poll_attempts;
        for attempt in 1..=attempts {
            if self.registry.is_registered(app) {
                debug!("'{}' ready after {} readiness checks", app, attempt);
                return Ok(());
            }
            tokio::time::sleep(self.config.poll_interval()).await;
        }

        if self.registry.is_registered(app) {
            return Ok(());
        }
        Err(ShellError::NotInitialized {
            app: app.to_string(),
            attempts,
        })
    }

    fn finish(&self, app: &str, id: Uuid, result: &Result<(), ShellError>) {
        let mut state = self.lock();
        if state.in_flight.get(app).map(|f| f.id) == Some(id) {
            state.in_flight.remove(app);
        }

        match result {
            Ok(()) => {
                state.loaded.insert(app.to_string());
                state.stats.succeeded += 1;
                info!("Load {} for '{}' succeeded", id, app);
            }
            Err(e @ ShellError::LoadTimeout { .. }) => {
                state.stats.failed += 1;
                state.stats.timed_out += 1;
                warn!("Load {} failed: {}", id, e);
            }
            Err(e) => {
                state.stats.failed += 1;
                warn!("Load {} failed: {}", id, e);
            }
        }
    }
}
