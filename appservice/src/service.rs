//! App Service operations.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use mockall::automock;

use common::config::AppConfig;
use common::errors::AppResult;
use common::models::RetryPolicyOptions;

use crate::az_cli::{AzCliRunner, ProcessAzCli};
use crate::models::{AddDatabaseRequest, DatabaseConnectionInfo, DatabaseType};

/// App Service operations used by the area's commands.
#[automock]
#[async_trait]
pub trait AppServiceServiceTrait: Send + Sync {
    /// Stores a database connection string on a web app.
    ///
    /// # Errors
    /// `AppError::UnsupportedDatabaseType` for an unknown type, and
    /// `AppError::ResourceNotFound` when the subscription, resource group or
    /// app does not exist.
    async fn add_database(&self, request: AddDatabaseRequest) -> AppResult<DatabaseConnectionInfo>;
}

/// App Service operations backed by the Azure CLI.
pub struct AppServiceService {
    az: Arc<dyn AzCliRunner>,
}

impl AppServiceService {
    pub fn new(az: Arc<dyn AzCliRunner>) -> Self {
        Self { az }
    }

    /// Uses the `az` executable named in the configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(Arc::new(ProcessAzCli::new(config.az_cli_path.clone())))
    }

    /// Runs one CLI call, re-attempting transient failures per `policy`.
    async fn run_with_retry(
        &self,
        args: Vec<String>,
        policy: &RetryPolicyOptions,
    ) -> AppResult<String> {
        let mut attempt = 0;
        loop {
            match self.az.run(args.clone(), policy.network_timeout()).await {
                Err(error) if error.is_transient() && attempt < policy.max_retries() => {
                    let delay = policy.delay_for_attempt(attempt);
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Retrying Azure CLI call"
                    );
                    tokio::time::sleep(delay).await;
                }
                outcome => return outcome,
            }
        }
    }
}

fn connection_string_name(database_name: &str) -> String {
    format!("{database_name}Connection")
}

#[async_trait]
impl AppServiceServiceTrait for AppServiceService {
    async fn add_database(&self, request: AddDatabaseRequest) -> AppResult<DatabaseConnectionInfo> {
        let database_type: DatabaseType = request.database_type.parse()?;

        let connection_string = if request.connection_string.trim().is_empty() {
            database_type.default_connection_string(&request.database_server, &request.database_name)
        } else {
            request.connection_string.clone()
        };
        let name = connection_string_name(&request.database_name);

        if let Some(tenant) = &request.tenant {
            tracing::debug!(tenant = %tenant, "Tenant is taken from the active az login");
        }

        let args = vec![
            "webapp".to_string(),
            "config".to_string(),
            "connection-string".to_string(),
            "set".to_string(),
            "--name".to_string(),
            request.app_name.clone(),
            "--resource-group".to_string(),
            request.resource_group.clone(),
            "--subscription".to_string(),
            request.subscription.clone(),
            "--connection-string-type".to_string(),
            database_type.connection_string_type().to_string(),
            "--settings".to_string(),
            format!("{name}={connection_string}"),
            "--output".to_string(),
            "json".to_string(),
        ];

        let policy = request.retry_policy.clone().unwrap_or_default();
        self.run_with_retry(args, &policy).await?;

        tracing::info!(
            app = %request.app_name,
            database_type = %database_type,
            connection_string_name = %name,
            "Database connection added to App Service"
        );

        Ok(DatabaseConnectionInfo {
            database_type: request.database_type,
            database_server: request.database_server,
            database_name: request.database_name,
            connection_string,
            connection_string_name: name,
            is_configured: true,
            configured_at: Utc::now(),
        })
    }
}
