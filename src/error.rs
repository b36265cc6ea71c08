use thiserror::Error;
use tracing::{error, warn};

/// How loudly a failure should be surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,     // inline hint
    Warning,  // recoverable, feature degraded
    Error,    // operation failed, notice shown
    Critical, // requires user action before anything works
}

/// Failure taxonomy for Grammary.
///
/// Every variant is caught at the boundary of the operation that can react to
/// it (the action dispatcher, the popup lifecycle, startup) and turned into
/// user-visible state. None of them is allowed to end a surface.
#[derive(Error, Debug)]
pub enum GrammaryError {
    /// A required credential is missing. Shown inline, never retried.
    #[error("{operation} requires an API key")]
    Configuration { operation: &'static str },

    /// The text-generation backend rejected or failed the call.
    #[error("Transform service failed: {message}")]
    Service {
        message: String,
        status: Option<u16>,
    },

    /// OS-level selection retrieval failed. Treated as "no selection".
    #[error("Selection capture failed: {0}")]
    Capture(String),

    /// An expected asset (tray icon etc.) is missing or unreadable.
    #[error("Resource '{path}' unavailable: {reason}")]
    Resource { path: String, reason: String },

    /// Writing a result back into a surface failed (detached range etc.).
    #[error("Could not apply result: {0}")]
    Application(String),

    #[error("Configuration file error: {0}")]
    Config(String),

    #[error("Failed to decode message: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("Window operation failed: {0}")]
    Window(String),
}

impl GrammaryError {
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
            status: None,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Configuration { .. } => ErrorSeverity::Critical,
            Self::Service { .. } => ErrorSeverity::Error,
            Self::Capture(_) => ErrorSeverity::Info,
            Self::Resource { .. } => ErrorSeverity::Warning,
            Self::Application(_) => ErrorSeverity::Error,
            Self::Config(_) => ErrorSeverity::Warning,
            Self::Protocol(_) => ErrorSeverity::Warning,
            Self::Window(_) => ErrorSeverity::Error,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration { operation } => format!(
                "{} requires an API key. Please add your OpenRouter API key in settings.",
                operation
            ),
            Self::Service { message, .. } => format!("Something went wrong: {}", message),
            Self::Capture(_) => "No text selected".to_string(),
            Self::Resource { path, .. } => format!("Missing resource: {}", path),
            // Generic on purpose; the detail goes to the log
            Self::Application(_) => "Could not apply the result to the selection".to_string(),
            Self::Config(msg) => format!("Configuration issue: {}", msg),
            Self::Protocol(e) => format!("Invalid message format: {}", e),
            Self::Window(msg) => msg.clone(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GrammaryError>;

/// Log-and-continue helpers with caller location tracking.
/// Use when the operation is recoverable and the user doesn't need to know.
///
/// ```ignore
/// use grammary::error::ResultExt;
///
/// // A tray that fails to build only degrades the app
/// let tray = TrayManager::new(&icon_path).warn_on_err();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_carries_instructive_message() {
        let err = GrammaryError::Configuration {
            operation: "Translation",
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(
            err.user_message(),
            "Translation requires an API key. Please add your OpenRouter API key in settings."
        );
    }

    #[test]
    fn application_error_message_is_generic() {
        let err = GrammaryError::Application("range detached".into());
        assert!(!err.user_message().contains("detached"));
        assert!(err.to_string().contains("detached"));
    }

    #[test]
    fn capture_errors_are_informational() {
        assert_eq!(
            GrammaryError::Capture("ax denied".into()).severity(),
            ErrorSeverity::Info
        );
    }

    #[test]
    fn result_ext_turns_errors_into_none() {
        let failed: std::result::Result<u8, &str> = Err("boom");
        assert_eq!(failed.log_err(), None);
        let ok: std::result::Result<u8, &str> = Ok(3);
        assert_eq!(ok.warn_on_err(), Some(3));
    }
}
