//! `appservice database add`

use std::sync::Arc;

use async_trait::async_trait;
use clap::ArgMatches;
use serde_json::json;
use tracing::Instrument;

use common::command::{Command, ToolMetadata};
use common::context::CommandContext;
use common::errors::AppError;
use common::options::{resource_group_options, OptionDefinition};
use common::response::CommandResponse;

use crate::models::DatabaseAddResult;
use crate::options::{
    DatabaseAddOptions, APP, CONNECTION_STRING, DATABASE, DATABASE_SERVER, DATABASE_TYPE,
};
use crate::service::AppServiceServiceTrait;

pub const TOOL_NAME: &str = "appservice_database_add";

/// Adds a database connection string to an App Service web app.
pub struct DatabaseAddCommand {
    service: Arc<dyn AppServiceServiceTrait>,
}

impl DatabaseAddCommand {
    pub fn new(service: Arc<dyn AppServiceServiceTrait>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Command for DatabaseAddCommand {
    fn name(&self) -> &'static str {
        "add"
    }

    fn title(&self) -> &'static str {
        "Add Database to App Service"
    }

    fn description(&self) -> &'static str {
        "Add a database connection to an App Service. This command configures database \
         connection settings for the specified App Service, allowing it to connect to a \
         database server. Supported types are SqlServer, MySQL, PostgreSQL and CosmosDB. \
         When no connection string is given, one is generated from the server and database \
         name with credential placeholders."
    }

    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            destructive: false,
            read_only: false,
        }
    }

    fn options(&self) -> Vec<OptionDefinition> {
        let mut options = resource_group_options();
        options.extend([APP, DATABASE_TYPE, DATABASE_SERVER, DATABASE, CONNECTION_STRING]);
        options
    }

    async fn execute(&self, context: &CommandContext, args: &ArgMatches) -> CommandResponse {
        let response = context.response(TOOL_NAME);

        let request = match DatabaseAddOptions::bind(args, context.config())
            .and_then(|options| options.to_request())
        {
            Ok(request) => request,
            Err(error) => {
                tracing::warn!(error = %error, "Invalid appservice database add options");
                return response.with_error(&error);
            }
        };

        let details = json!({
            "app": request.app_name,
            "resourceGroup": request.resource_group,
            "databaseType": request.database_type,
        });
        let app_name = request.app_name.clone();
        let span = tracing::info_span!(
            "appservice_database_add",
            activity_id = %context.activity_id(),
            app = %app_name,
            database_type = %request.database_type,
        );

        let outcome = async {
            tokio::select! {
                outcome = self.service.add_database(request) => outcome,
                _ = context.cancelled() => Err(AppError::Cancelled),
            }
        }
        .instrument(span)
        .await;

        match outcome {
            Ok(connection_info) => response.with_results(&DatabaseAddResult { connection_info }),
            Err(error) => {
                if error.is_validation() {
                    tracing::warn!(
                        app = %app_name,
                        error = %error,
                        "App Service rejected the database connection"
                    );
                } else {
                    tracing::error!(
                        app = %app_name,
                        error = %error,
                        "Failed to add database connection to App Service"
                    );
                }
                response.with_error(&error).with_error_details(details)
            }
        }
    }
}
