//! Command response envelope.
//!
//! Every command returns its outcome in this format, whether it is printed by
//! the CLI or returned from a tool call over HTTP.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;

/// Status of a successful invocation.
pub const STATUS_OK: u16 = 200;

/// Status of a failed invocation, whether rejected during validation or
/// failed while executing.
pub const STATUS_BAD_REQUEST: u16 = 400;

/// Status of a tool call addressed to an unregistered command.
pub const STATUS_NOT_FOUND: u16 = 404;

/// Standard command response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommandResponse {
    /// 200 on success, non-200 otherwise.
    pub status: u16,

    /// Human-readable summary.
    pub message: String,

    /// Command-specific payload (present on success).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<serde_json::Value>,

    /// Error details (present on failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,

    /// Response metadata.
    pub meta: ResponseMeta,
}

/// Error details.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResponseError {
    /// Error code for client handling (e.g., "MISSING_REQUIRED_OPTIONS").
    pub code: String,

    /// Human-readable error message.
    pub message: String,

    /// Additional error details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Response metadata.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    /// Activity ID for tracing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,

    /// Response timestamp.
    pub timestamp: DateTime<Utc>,

    /// Command processing time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    /// Tool name of the command that produced the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self {
            activity_id: None,
            timestamp: Utc::now(),
            duration_ms: None,
            command: None,
        }
    }
}

impl Default for CommandResponse {
    fn default() -> Self {
        Self {
            status: STATUS_OK,
            message: "Success".to_string(),
            results: None,
            error: None,
            meta: ResponseMeta::default(),
        }
    }
}

impl CommandResponse {
    /// Creates an empty successful response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the response reports success.
    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Attaches a serializable payload.
    ///
    /// A payload that fails to serialize turns the response into an error.
    pub fn with_results<T: Serialize>(mut self, results: &T) -> Self {
        match serde_json::to_value(results) {
            Ok(value) => {
                self.results = Some(value);
                self
            }
            Err(e) => self.with_error(&AppError::Serialization(e)),
        }
    }

    /// Turns the response into a failure describing `error`.
    ///
    /// Only the error kind and its display message are exposed.
    pub fn with_error(mut self, error: &AppError) -> Self {
        self.status = STATUS_BAD_REQUEST;
        self.message = error.to_string();
        self.results = None;
        self.error = Some(ResponseError {
            code: error.code().to_string(),
            message: error.to_string(),
            details: None,
        });
        self
    }

    /// Attaches structured details to the error (no-op on success).
    pub fn with_error_details(mut self, details: serde_json::Value) -> Self {
        if let Some(error) = self.error.as_mut() {
            error.details = Some(details);
        }
        self
    }

    /// Overrides the status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Sets the activity ID on the response.
    pub fn with_activity_id(mut self, activity_id: impl Into<String>) -> Self {
        self.meta.activity_id = Some(activity_id.into());
        self
    }

    /// Sets the duration on the response.
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.meta.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the producing command on the response.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.meta.command = Some(command.into());
        self
    }
}

impl IntoResponse for CommandResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
