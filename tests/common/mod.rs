//! Shared setup for the shell integration tests

#![allow(dead_code)]

use phone_shell::config::ShellConfig;
use phone_shell::shell::testing::{StubApp, StubFetcher};
use phone_shell::shell::{ModuleManifest, PhoneShell, Resource, SubAppRegistry};
use std::sync::Arc;
use std::time::Duration;

/// Module initialization tail after its script arrives
pub const INIT_DELAY: Duration = Duration::from_millis(200);

/// Past the default debounce window
pub const SETTLE: Duration = Duration::from_millis(350);

pub struct Harness {
    pub shell: PhoneShell,
    pub registry: Arc<SubAppRegistry>,
    pub fetcher: Arc<StubFetcher>,
}

pub fn manifest(name: &str) -> ModuleManifest {
    let mut title = name.to_string();
    if let Some(first) = title.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    ModuleManifest::new(name, title)
        .resource(Resource::stylesheet(format!("{}.css", name)))
        .resource(Resource::script(format!("{}.js", name)))
}

/// A visible shell whose apps are all lazily loaded through `fetcher`
pub fn harness(
    config: ShellConfig,
    fetcher: StubFetcher,
    apps: Vec<StubApp>,
) -> (Harness, Vec<Arc<StubApp>>) {
    let registry = Arc::new(SubAppRegistry::new());
    let apps: Vec<Arc<StubApp>> = apps.into_iter().map(Arc::new).collect();
    for app in &apps {
        registry.add_manifest(manifest(phone_shell::shell::SubApp::name(app.as_ref())));
        fetcher.register_on_script(registry.clone(), app.clone(), INIT_DELAY);
    }

    let fetcher = Arc::new(fetcher);
    let shell = PhoneShell::new(config, registry.clone(), fetcher.clone());
    shell.show();
    (Harness { shell, registry, fetcher }, apps)
}

pub async fn settle() {
    tokio::time::sleep(SETTLE).await;
}
