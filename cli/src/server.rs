//! HTTP tool server
//!
//! Exposes every registered command as a tool call:
//! - `GET /api/tools` lists tools and their options
//! - `POST /api/tools/{tool}` runs one through the same pipeline as the CLI
//! - request IDs become the activity IDs of the invocations they trigger

use std::sync::Arc;

use axum::{middleware, routing::get, Json, Router};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;

use common::command::{CommandGroup, ToolMetadata};
use common::config::AppConfig;
use common::middleware::request_id_middleware;
use common::response::{CommandResponse, ResponseError, ResponseMeta};

use crate::routes;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "aztool API",
        version = "0.1.0",
        description = "Azure tools exposed as HTTP tool calls"
    ),
    paths(
        routes::health_check,
        routes::list_tools,
        routes::call_tool,
    ),
    components(schemas(
        routes::HealthResponse,
        routes::ToolInfo,
        routes::OptionInfo,
        ToolMetadata,
        CommandResponse,
        ResponseError,
        ResponseMeta,
    )),
    tags(
        (name = "tools", description = "Tool endpoints"),
        (name = "health", description = "Health check endpoints")
    )
)]
struct ApiDoc;

/// Binds `host:port` and serves until Ctrl-C.
///
/// In-flight tool calls observe the shutdown as a cancellation.
pub async fn serve(
    config: Arc<AppConfig>,
    root: &CommandGroup,
    host: &str,
    port: u16,
) -> anyhow::Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let state = AppState::new(config.clone(), root, shutdown_rx);
    let app = create_router(state);

    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(service = %config.service, address = %addr, "Tool server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown requested");
            }
            let _ = shutdown_tx.send(true);
        })
        .await?;

    Ok(())
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::Utc;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use appservice::models::DatabaseConnectionInfo;
    use appservice::service::MockAppServiceServiceTrait;
    use common::errors::AppError;

    use super::*;

    fn router_with(service: MockAppServiceServiceTrait) -> Router {
        let mut root = CommandGroup::new("aztool", "root");
        appservice::setup::register(&mut root, Arc::new(service));
        let (_tx, rx) = watch::channel(false);
        create_router(AppState::new(Arc::new(AppConfig::default()), &root, rx))
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let request_id = response
            .headers()
            .get("x-request-id")
            .map(|v| v.to_str().unwrap().to_string());
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, request_id, serde_json::from_slice(&body).unwrap())
    }

    fn call(tool: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/api/tools/{tool}"))
            .header("content-type", "application/json")
            .header("x-request-id", "req-42")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn full_arguments() -> Value {
        json!({
            "subscription": "sub123",
            "resource-group": "rg1",
            "app": "test-app",
            "database-type": "MySQL",
            "database-server": "test-server",
            "database": "test-db",
        })
    }

    #[tokio::test]
    async fn test_health_check() {
        let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        let (status, request_id, body) = send(router_with(MockAppServiceServiceTrait::new()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(request_id.is_some());
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_lists_registered_tools() {
        let request = Request::builder().uri("/api/tools").body(Body::empty()).unwrap();
        let (status, _, body) = send(router_with(MockAppServiceServiceTrait::new()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "appservice_database_add");
        assert_eq!(body[0]["metadata"]["destructive"], false);
        let options = body[0]["options"].as_array().unwrap();
        assert!(options
            .iter()
            .any(|o| o["name"] == "database-type" && o["required"] == true));
    }

    #[tokio::test]
    async fn test_tool_call_runs_command() {
        let mut service = MockAppServiceServiceTrait::new();
        service
            .expect_add_database()
            .once()
            .withf(|r| r.database_type == "MySQL" && r.app_name == "test-app")
            .return_once(|r| {
                Ok(DatabaseConnectionInfo {
                    database_type: r.database_type,
                    database_server: r.database_server,
                    database_name: r.database_name,
                    connection_string: "Server=test-server;".into(),
                    connection_string_name: "test-dbConnection".into(),
                    is_configured: true,
                    configured_at: Utc::now(),
                })
            });

        let (status, request_id, body) =
            send(router_with(service), call("appservice_database_add", full_arguments())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(request_id.as_deref(), Some("req-42"));
        assert_eq!(body["status"], 200);
        assert_eq!(body["results"]["ConnectionInfo"]["DatabaseType"], "MySQL");
        assert_eq!(body["meta"]["activityId"], "req-42");
        assert_eq!(body["meta"]["command"], "appservice_database_add");
    }

    #[tokio::test]
    async fn test_tool_call_with_missing_options_is_bad_request() {
        let mut service = MockAppServiceServiceTrait::new();
        service.expect_add_database().never();

        let (status, _, body) = send(
            router_with(service),
            call("appservice_database_add", json!({ "app": "test-app" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "MISSING_REQUIRED_OPTIONS");
    }

    #[tokio::test]
    async fn test_service_failure_is_bad_request() {
        let mut service = MockAppServiceServiceTrait::new();
        service
            .expect_add_database()
            .once()
            .return_once(|_| Err(AppError::ResourceNotFound("App 'test-app' not found".into())));

        let (status, _, body) =
            send(router_with(service), call("appservice_database_add", full_arguments())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "RESOURCE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_found() {
        let (status, _, body) = send(
            router_with(MockAppServiceServiceTrait::new()),
            call("storage_account_list", json!({})),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
        assert_eq!(body["error"]["code"], "UNKNOWN_TOOL");
    }

    #[tokio::test]
    async fn test_non_scalar_argument_is_bad_request() {
        let mut service = MockAppServiceServiceTrait::new();
        service.expect_add_database().never();

        let (status, _, body) = send(
            router_with(service),
            call("appservice_database_add", json!({ "app": { "name": "web" } })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_OPTION");
    }

    #[tokio::test]
    async fn test_openapi_document_lists_tool_routes() {
        let request = Request::builder()
            .uri("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(router_with(MockAppServiceServiceTrait::new()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/tools/{tool}"].is_object());
    }

    #[tokio::test]
    async fn test_openapi_declares_tool_call_body_as_json() {
        let request = Request::builder()
            .uri("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap();
        let (_, _, body) = send(router_with(MockAppServiceServiceTrait::new()), request).await;

        let request_body = &body["paths"]["/api/tools/{tool}"]["post"]["requestBody"];
        assert!(request_body["content"]["application/json"].is_object());
        assert_eq!(request_body["description"], "Option name to scalar value");
    }

    #[tokio::test]
    async fn test_tool_call_without_body_reports_missing_options() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/tools/appservice_database_add")
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(router_with(MockAppServiceServiceTrait::new()), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "MISSING_REQUIRED_OPTIONS");
    }
}
