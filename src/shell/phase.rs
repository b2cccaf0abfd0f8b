use std::fmt;

/// What the navigation core is doing right now.
///
/// Checked synchronously by the reconciler before it writes to the stack:
/// only `Idle` allows reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShellPhase {
    #[default]
    Idle,
    /// A transition is being applied (open, back, return-to-root)
    Transitioning { to: Option<String> },
    /// Waiting on the loader; the loading placeholder is showing
    Loading { app: String },
}

impl ShellPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, ShellPhase::Idle)
    }

    pub fn is_loading(&self, app: &str) -> bool {
        matches!(self, ShellPhase::Loading { app: loading } if loading == app)
    }
}

impl fmt::Display for ShellPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellPhase::Idle => write!(f, "idle"),
            ShellPhase::Transitioning { to: Some(app) } => write!(f, "transitioning to {}", app),
            ShellPhase::Transitioning { to: None } => write!(f, "transitioning home"),
            ShellPhase::Loading { app } => write!(f, "loading {}", app),
        }
    }
}
