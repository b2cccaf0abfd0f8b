//! Error taxonomy for the navigation core
//!
//! Load and transition errors are recoverable: they end up on an error screen
//! with a retry action and never leave the navigation stack half-written.

use std::time::Duration;

/// Errors produced by the loader, the controller and the reconciler.
///
/// `Clone` because a single in-flight load result is handed to every caller
/// that joined the same load.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShellError {
    /// The whole load (fetch + readiness polling) exceeded the hard timeout
    #[error("Loading '{app}' timed out after {elapsed:?}")]
    LoadTimeout { app: String, elapsed: Duration },

    /// Resources finished but the module never registered its capabilities
    #[error("'{app}' did not finish initializing after {attempts} readiness checks")]
    NotInitialized { app: String, attempts: u32 },

    /// A single stylesheet or script failed to load
    #[error("Failed to fetch '{resource}' for '{app}': {reason}")]
    ResourceFetch {
        app: String,
        resource: String,
        reason: String,
    },

    /// No manifest or registration exists for the name
    #[error("Unknown sub-application '{0}'")]
    UnknownApp(String),

    /// Active-application pointer disagreed with the current frame
    #[error("Active application '{pointer}' does not match current frame '{frame}'")]
    StateInconsistency { pointer: String, frame: String },

    /// The background load task went away before producing a result
    #[error("Load of '{0}' was aborted")]
    LoadAborted(String),

    /// A sub-application capability reported a failure
    #[error("'{app}' failed: {reason}")]
    SubApp { app: String, reason: String },
}

impl ShellError {
    /// Whether the error is shown with a retry action
    pub fn is_retryable(&self) -> bool {
        match self {
            ShellError::LoadTimeout { .. } => true,
            ShellError::NotInitialized { .. } => true,
            ShellError::ResourceFetch { .. } => true,
            ShellError::LoadAborted(_) => true,
            ShellError::SubApp { .. } => true,
            ShellError::UnknownApp(_) => false,
            ShellError::StateInconsistency { .. } => false,
        }
    }

    /// Name of the sub-application the error concerns, when there is one
    pub fn app(&self) -> Option<&str> {
        match self {
            ShellError::LoadTimeout { app, .. }
            | ShellError::NotInitialized { app, .. }
            | ShellError::ResourceFetch { app, .. }
            | ShellError::SubApp { app, .. } => Some(app),
            ShellError::UnknownApp(app) | ShellError::LoadAborted(app) => Some(app),
            ShellError::StateInconsistency { frame, .. } => Some(frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        let timeout = ShellError::LoadTimeout {
            app: "feed".to_string(),
            elapsed: Duration::from_secs(15),
        };
        assert!(timeout.is_retryable());
        assert!(!ShellError::UnknownApp("nope".to_string()).is_retryable());
    }

    #[test]
    fn test_messages_name_the_app() {
        let err = ShellError::NotInitialized {
            app: "forum".to_string(),
            attempts: 10,
        };
        assert_eq!(err.app(), Some("forum"));
        assert!(err.to_string().contains("forum"));
        assert!(err.to_string().contains("10"));
    }
}
