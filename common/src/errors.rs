//! Application error types.
//!
//! Every failure a command can report maps to one `AppError` variant with a
//! stable machine-readable code.

use std::time::Duration;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use thiserror::Error;

/// Result alias used across all areas.
pub type AppResult<T> = Result<T, AppError>;

/// Command and service failures.
#[derive(Debug, Error)]
pub enum AppError {
    /// One or more required options were not supplied.
    #[error("Missing Required options: {0}")]
    MissingOptions(String),

    /// An option was supplied with a malformed value.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// The requested database type is not in the supported set.
    #[error("Unsupported database type: {0}")]
    UnsupportedDatabaseType(String),

    /// Subscription, resource group or app does not exist.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// The caller is not signed in or lacks access.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Throttling or temporary unavailability; safe to retry.
    #[error("Transient failure: {0}")]
    Transient(String),

    /// Any other failure reported by the backing service.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// A single backend call exceeded its network timeout.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The surrounding caller cancelled the invocation.
    #[error("Operation was cancelled")]
    Cancelled,

    /// No command is registered under the requested tool name.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Returns the stable error code placed in response envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::MissingOptions(_) => "MISSING_REQUIRED_OPTIONS",
            AppError::InvalidOption(_) => "INVALID_OPTION",
            AppError::UnsupportedDatabaseType(_) => "UNSUPPORTED_DATABASE_TYPE",
            AppError::ResourceNotFound(_) => "RESOURCE_NOT_FOUND",
            AppError::Authentication(_) => "AUTHENTICATION_FAILED",
            AppError::Transient(_) => "TRANSIENT_FAILURE",
            AppError::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::Cancelled => "CANCELLED",
            AppError::UnknownTool(_) => "UNKNOWN_TOOL",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
        }
    }

    /// Whether the failure was detected before any I/O took place.
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::MissingOptions(_) | AppError::InvalidOption(_))
    }

    /// Whether a retry policy may re-attempt the failed call.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Transient(_) | AppError::Timeout(_))
    }
}

impl From<clap::Error> for AppError {
    fn from(error: clap::Error) -> Self {
        let offending = match error.get(ContextKind::InvalidArg) {
            Some(ContextValue::Strings(args)) => Some(
                args.iter()
                    .map(|arg| flag_only(arg))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Some(ContextValue::String(arg)) => Some(flag_only(arg).to_string()),
            _ => None,
        };

        match (error.kind(), offending) {
            (ErrorKind::MissingRequiredArgument, Some(args)) => AppError::MissingOptions(args),
            _ => AppError::InvalidOption(first_line(&error.to_string())),
        }
    }
}

/// `--app <app>` -> `--app`
fn flag_only(usage: &str) -> &str {
    usage.split_whitespace().next().unwrap_or(usage)
}

/// Strips clap's `error: ` prefix and usage trailer from a rendered message.
fn first_line(rendered: &str) -> String {
    let line = rendered.lines().next().unwrap_or_default().trim();
    line.strip_prefix("error: ").unwrap_or(line).to_string()
}
