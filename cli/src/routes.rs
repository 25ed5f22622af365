//! Tool server routes.

use axum::{
    body::Bytes,
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

use common::command::{self, ToolMetadata};
use common::context::CommandContext;
use common::errors::{AppError, AppResult};
use common::middleware::RequestId;
use common::response::{CommandResponse, STATUS_NOT_FOUND};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/tools", get(list_tools))
        .route("/api/tools/{tool}", post(call_tool))
}

/// Health check
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is running", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.config.service.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// Lists every registered tool with its option table.
#[utoipa::path(
    get,
    path = "/api/tools",
    tag = "tools",
    responses(
        (status = 200, description = "Registered tools", body = Vec<ToolInfo>)
    )
)]
pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolInfo>> {
    let tools = state
        .tools
        .iter()
        .map(|(name, command)| ToolInfo {
            name: name.clone(),
            title: command.title().to_string(),
            description: command.description().to_string(),
            metadata: command.metadata(),
            options: command
                .options()
                .iter()
                .map(|option| OptionInfo {
                    name: option.name.to_string(),
                    description: option.description.to_string(),
                    required: option.required,
                    kind: option.kind_name().to_string(),
                })
                .collect(),
        })
        .collect();

    Json(tools)
}

/// Runs a tool.
///
/// The body is a JSON object of option name to scalar value, e.g.
/// `{"app": "web", "retry-max-retries": 3}`. The HTTP status mirrors the
/// envelope status.
#[utoipa::path(
    post,
    path = "/api/tools/{tool}",
    tag = "tools",
    params(
        ("tool" = String, Path, description = "Tool name, e.g. appservice_database_add")
    ),
    request_body(
        content = serde_json::Value,
        description = "Option name to scalar value",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Tool succeeded", body = CommandResponse),
        (status = 400, description = "Invalid options or failed operation", body = CommandResponse),
        (status = 404, description = "Unknown tool", body = CommandResponse)
    )
)]
pub async fn call_tool(
    State(state): State<AppState>,
    Path(tool): Path<String>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> CommandResponse {
    let context = CommandContext::new(state.config.clone())
        .with_activity_id(request_id.as_str())
        .with_cancellation(state.shutdown.clone());

    let Some(command) = state.tools.get(&tool) else {
        tracing::warn!(tool = %tool, "Unknown tool requested");
        return context
            .response(&tool)
            .with_error(&AppError::UnknownTool(tool.clone()))
            .with_status(STATUS_NOT_FOUND);
    };

    let args = match parse_body(&body).and_then(|arguments| to_argv(&arguments)) {
        Ok(args) => args,
        Err(error) => return context.response(&tool).with_error(&error),
    };

    match command::run(command.as_ref(), &tool, &context, &args).await {
        Ok(response) => response,
        Err(info) => context
            .response(&tool)
            .with_error(&AppError::InvalidOption(info.to_string())),
    }
}

fn parse_body(body: &[u8]) -> AppResult<Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidOption(format!("tool arguments must be a JSON object: {e}")))
}

/// Converts tool arguments to `--name=value` pairs. Nulls are skipped.
fn to_argv(arguments: &Map<String, Value>) -> AppResult<Vec<String>> {
    let mut argv = Vec::with_capacity(arguments.len());

    for (name, value) in arguments {
        let value = match value {
            Value::Null => continue,
            Value::String(text) => text.clone(),
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(AppError::InvalidOption(format!(
                    "--{name} must be a string, number or boolean"
                )))
            }
        };
        argv.push(format!("--{name}={value}"));
    }

    Ok(argv)
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// A registered tool
#[derive(Serialize, ToSchema)]
pub struct ToolInfo {
    /// Group path and command name joined with `_`.
    pub name: String,
    pub title: String,
    pub description: String,
    pub metadata: ToolMetadata,
    pub options: Vec<OptionInfo>,
}

/// One option of a tool
#[derive(Serialize, ToSchema)]
pub struct OptionInfo {
    pub name: String,
    pub description: String,
    pub required: bool,
    /// `string`, `integer`, `number` or `choice`.
    pub kind: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_to_argv_uses_equals_form() {
        let arguments = json!({
            "app": "web",
            "retry-delay": -1.5,
            "retry-max-retries": 3,
            "tenant": null,
        });

        let argv = to_argv(arguments.as_object().unwrap()).unwrap();

        assert_eq!(argv, vec!["--app=web", "--retry-delay=-1.5", "--retry-max-retries=3"]);
    }

    #[test]
    fn test_to_argv_rejects_nested_values() {
        let arguments = json!({ "app": ["a", "b"] });
        let error = to_argv(arguments.as_object().unwrap()).unwrap_err();

        assert_eq!(error.code(), "INVALID_OPTION");
        assert!(error.to_string().contains("--app"));
    }

    #[test]
    fn test_empty_body_is_no_arguments() {
        assert!(parse_body(b"").unwrap().is_empty());
        assert!(parse_body(b"  \n").unwrap().is_empty());
        assert!(parse_body(b"[1]").is_err());
    }
}
