//! Capability interface for hosted sub-applications and the registry that
//! owns them
//!
//! The registry is created by the shell and handed to the loader and the
//! controller; any component can look a sub-application up by name.

use crate::shell::error::ShellError;
use crate::shell::events::{ViewEvents, ViewNotifier};
use crate::shell::frame::{DEFAULT_ROOT_VIEW, LiveView, ViewFrame};
use crate::shell::header::HeaderControl;
use log::{debug, info};
use ratatui::text::Text;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Outcome of asking a sub-application to return to its own root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootReset {
    /// The application reset its internal state itself
    Handled,
    /// No dedicated handler; the shell applies its generic reset
    Unsupported,
}

/// What every hosted application exposes to the shell.
///
/// Only `name`, `title`, `root_content` and `bind_events` are required.
/// The rest are optional capabilities with generic fallbacks in the shell.
pub trait SubApp: Send + Sync {
    /// Registry key
    fn name(&self) -> &str;

    fn title(&self) -> &str;

    /// View name of the top-level page
    fn root_view(&self) -> &str {
        DEFAULT_ROOT_VIEW
    }

    /// Renderable content for the current internal state
    fn root_content(&self) -> Text<'static>;

    /// Attach interaction handlers to already-inserted content. Idempotent.
    fn bind_events(&self) -> Result<(), ShellError>;

    /// Current internal page, if the application exposes it
    fn live_view(&self) -> Option<LiveView> {
        None
    }

    /// Reset the application's own state to its root page
    fn return_to_root(&self) -> RootReset {
        RootReset::Unsupported
    }

    /// Extra header controls for a frame of this application
    fn header_controls(&self, _frame: &ViewFrame) -> Vec<HeaderControl> {
        Vec::new()
    }

    /// Handle an application-specific header action
    fn handle_action(&self, action: &str) -> Result<(), ShellError> {
        Err(ShellError::SubApp {
            app: self.name().to_string(),
            reason: format!("unsupported action '{}'", action),
        })
    }

    /// Offer a push channel. Return true if the application will publish its
    /// view changes through it instead of being polled.
    fn attach_notifier(&self, _notifier: ViewNotifier) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Stylesheet,
    Script,
}

/// One file a module needs before it can initialize
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub kind: ResourceKind,
    pub path: String,
}

impl Resource {
    pub fn stylesheet(path: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::Stylesheet,
            path: path.into(),
        }
    }

    pub fn script(path: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::Script,
            path: path.into(),
        }
    }
}

/// Static description of a sub-application: name, title and the resources
/// that must be fetched before it registers itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleManifest {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl ModuleManifest {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            resources: Vec::new(),
        }
    }

    pub fn resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }
}

struct Registration {
    app: Arc<dyn SubApp>,
    pushes_updates: bool,
}

/// Shared registry of manifests and registered sub-applications
pub struct SubAppRegistry {
    manifests: RwLock<HashMap<String, ModuleManifest>>,
    apps: RwLock<HashMap<String, Registration>>,
    events: ViewEvents,
}

impl SubAppRegistry {
    pub fn new() -> Self {
        Self {
            manifests: RwLock::new(HashMap::new()),
            apps: RwLock::new(HashMap::new()),
            events: ViewEvents::new(),
        }
    }

    pub fn events(&self) -> &ViewEvents {
        &self.events
    }

    pub fn add_manifest(&self, manifest: ModuleManifest) {
        debug!("Manifest added for '{}' ({} resources)", manifest.name, manifest.resources.len());
        self.manifests
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(manifest.name.clone(), manifest);
    }

    pub fn manifest(&self, name: &str) -> Option<ModuleManifest> {
        self.manifests
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(name)
            .cloned()
    }

    /// Called by a module once it has initialized; replaces any prior
    /// registration under the same name
    pub fn register(&self, app: Arc<dyn SubApp>) {
        let name = app.name().to_string();
        let pushes_updates = app.attach_notifier(self.events.notifier(&name));
        info!("Registered sub-application '{}' (push updates: {})", name, pushes_updates);

        self.apps
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(name, Registration { app, pushes_updates });
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SubApp>> {
        self.apps
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(name)
            .map(|r| r.app.clone())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.apps
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(name)
    }

    pub fn pushes_updates(&self, name: &str) -> bool {
        self.apps
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(name)
            .map(|r| r.pushes_updates)
            .unwrap_or(false)
    }

    /// Known to the shell, either by manifest or by registration
    pub fn is_known(&self, name: &str) -> bool {
        self.is_registered(name) || self.manifest(name).is_some()
    }

    /// Whether opening `name` must go through the loader first
    pub fn requires_loading(&self, name: &str) -> bool {
        !self.is_registered(name) && self.manifest(name).is_some()
    }

    /// Title from the registration, else the manifest, else the name
    pub fn title_of(&self, name: &str) -> String {
        if let Some(app) = self.get(name) {
            return app.title().to_string();
        }
        self.manifest(name)
            .map(|m| m.title)
            .unwrap_or_else(|| name.to_string())
    }

    pub fn root_view_of(&self, name: &str) -> String {
        self.get(name)
            .map(|app| app.root_view().to_string())
            .unwrap_or_else(|| DEFAULT_ROOT_VIEW.to_string())
    }

    /// Every known application name, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .manifests
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .keys()
            .cloned()
            .collect();
        for name in self.apps.read().unwrap_or_else(|p| p.into_inner()).keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names.sort();
        names
    }
}

impl Default for SubAppRegistry {
    fn default() -> Self {
        Self::new()
    }
}
