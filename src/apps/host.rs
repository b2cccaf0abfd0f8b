//! Simulated module host for the bundled applications
//!
//! Fetches take a random time in a configurable range. Once an
//! application's script has arrived the module "initializes" for a while
//! and then registers itself, the way a real module would after its code ran.

use crate::apps;
use crate::shell::error::ShellError;
use crate::shell::fetch::ResourceFetcher;
use crate::shell::registry::{Resource, ResourceKind, SubAppRegistry};
use async_trait::async_trait;
use log::{debug, info, warn};
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

pub struct DemoHost {
    registry: Arc<SubAppRegistry>,
    min_latency_ms: u64,
    max_latency_ms: u64,
    init_delay: Duration,
    failing: HashSet<String>,
    stuck: HashSet<String>,
}

impl DemoHost {
    pub fn new(registry: Arc<SubAppRegistry>) -> Self {
        Self {
            registry,
            min_latency_ms: 100,
            max_latency_ms: 600,
            init_delay: Duration::from_millis(300),
            failing: HashSet::new(),
            stuck: HashSet::new(),
        }
    }

    /// Per-resource latency range
    pub fn with_latency(mut self, min: Duration, max: Duration) -> Self {
        self.min_latency_ms = min.as_millis() as u64;
        self.max_latency_ms = (max.as_millis() as u64).max(self.min_latency_ms);
        self
    }

    /// Time between a script arriving and the module registering
    pub fn with_init_delay(mut self, delay: Duration) -> Self {
        self.init_delay = delay;
        self
    }

    /// Every fetch of `path` fails
    pub fn failing(mut self, path: impl Into<String>) -> Self {
        self.failing.insert(path.into());
        self
    }

    /// `app` loads its resources but never registers
    pub fn stuck(mut self, app: impl Into<String>) -> Self {
        self.stuck.insert(app.into());
        self
    }

    fn latency(&self) -> Duration {
        if self.max_latency_ms == 0 {
            return Duration::ZERO;
        }
        let ms = rand::thread_rng().gen_range(self.min_latency_ms..=self.max_latency_ms);
        Duration::from_millis(ms)
    }

    fn schedule_registration(&self, app: &str) {
        if self.stuck.contains(app) {
            warn!("'{}' will never finish initializing", app);
            return;
        }
        let Some(instance) = apps::instantiate(app) else {
            warn!("No bundled implementation for '{}'", app);
            return;
        };

        let registry = self.registry.clone();
        let delay = self.init_delay;
        let name = app.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if registry.is_registered(&name) {
                return;
            }
            info!("'{}' initialized after {:?}", name, delay);
            registry.register(instance);
        });
    }
}

#[async_trait]
impl ResourceFetcher for DemoHost {
    async fn fetch(&self, app: &str, resource: &Resource) -> Result<(), ShellError> {
        let latency = self.latency();
        debug!("Fetching {} for '{}' ({:?})", resource.path, app, latency);
        tokio::time::sleep(latency).await;

        if self.failing.contains(&resource.path) {
            return Err(ShellError::ResourceFetch {
                app: app.to_string(),
                resource: resource.path.clone(),
                reason: "404 Not Found".to_string(),
            });
        }

        if resource.kind == ResourceKind::Script {
            self.schedule_registration(app);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_script_registers_after_init_delay() {
        let registry = apps::bundled_registry();
        let host = DemoHost::new(registry.clone())
            .with_latency(Duration::from_millis(10), Duration::from_millis(20))
            .with_init_delay(Duration::from_millis(100));

        host.fetch("forum", &Resource::script("apps/forum/forum.js")).await.unwrap();
        assert!(!registry.is_registered("forum"));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(registry.is_registered("forum"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_and_stuck() {
        let registry = apps::bundled_registry();
        let host = DemoHost::new(registry.clone())
            .failing("apps/feed/feed.css")
            .stuck("live");

        let err = host.fetch("feed", &Resource::stylesheet("apps/feed/feed.css")).await;
        assert!(matches!(err, Err(ShellError::ResourceFetch { .. })));

        host.fetch("live", &Resource::script("apps/live/live.js")).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!registry.is_registered("live"));
    }
}
