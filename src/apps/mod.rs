//! Bundled sub-applications and the simulated host that loads them

pub mod feed;
pub mod forum;
pub mod host;
pub mod live;
pub mod messages;
pub mod settings;
mod view_cell;

pub use host::DemoHost;

use crate::shell::registry::{ModuleManifest, Resource, SubApp, SubAppRegistry};
use std::sync::Arc;

/// Manifests of the lazily loaded applications. Settings ships with the
/// shell and has none.
pub fn manifests() -> Vec<ModuleManifest> {
    [
        (messages::NAME, "Messages"),
        (forum::NAME, "Forum"),
        (feed::NAME, "Feed"),
        (live::NAME, "Live"),
    ]
    .into_iter()
    .map(|(name, title)| {
        ModuleManifest::new(name, title)
            .resource(Resource::stylesheet(format!("apps/{}/{}.css", name, name)))
            .resource(Resource::script(format!("apps/{}/{}.js", name, name)))
    })
    .collect()
}

/// Fresh instance of a bundled application
pub fn instantiate(name: &str) -> Option<Arc<dyn SubApp>> {
    let app: Arc<dyn SubApp> = match name {
        messages::NAME => Arc::new(messages::MessagesApp::new()),
        forum::NAME => Arc::new(forum::ForumApp::new()),
        feed::NAME => Arc::new(feed::FeedApp::new()),
        live::NAME => Arc::new(live::LiveApp::new()),
        settings::NAME => Arc::new(settings::SettingsApp::new()),
        _ => return None,
    };
    Some(app)
}

/// Registry with every bundled manifest and the built-in settings app
pub fn bundled_registry() -> Arc<SubAppRegistry> {
    let registry = Arc::new(SubAppRegistry::new());
    for manifest in manifests() {
        registry.add_manifest(manifest);
    }
    registry.register(Arc::new(settings::SettingsApp::new()));
    registry
}
