//! App Service database models.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::errors::AppError;
use common::models::RetryPolicyOptions;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Database engines an App Service can be connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum DatabaseType {
    /// Azure SQL / SQL Server.
    SqlServer,
    /// Azure Database for MySQL.
    #[serde(rename = "MySQL")]
    MySql,
    /// Azure Database for PostgreSQL.
    #[serde(rename = "PostgreSQL")]
    PostgreSql,
    /// Azure Cosmos DB.
    #[serde(rename = "CosmosDB")]
    CosmosDb,
}

impl DatabaseType {
    pub const ALL: [DatabaseType; 4] = [
        DatabaseType::SqlServer,
        DatabaseType::MySql,
        DatabaseType::PostgreSql,
        DatabaseType::CosmosDb,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::SqlServer => "SqlServer",
            DatabaseType::MySql => "MySQL",
            DatabaseType::PostgreSql => "PostgreSQL",
            DatabaseType::CosmosDb => "CosmosDB",
        }
    }

    /// Error for a type outside the supported set.
    pub fn unsupported(value: &str) -> AppError {
        let supported: Vec<_> = DatabaseType::ALL.iter().map(|t| t.as_str()).collect();
        AppError::UnsupportedDatabaseType(format!(
            "'{value}'. Supported types: {}",
            supported.join(", ")
        ))
    }

    /// App Service connection-string type the setting is stored under.
    pub fn connection_string_type(&self) -> &'static str {
        match self {
            DatabaseType::SqlServer => "SQLAzure",
            DatabaseType::MySql => "MySql",
            DatabaseType::PostgreSql => "PostgreSQL",
            DatabaseType::CosmosDb => "Custom",
        }
    }

    /// Builds a connection string template for `server`/`database`.
    ///
    /// Credentials are left as `{username}`/`{password}`/`{key}` placeholders.
    pub fn default_connection_string(&self, server: &str, database: &str) -> String {
        match self {
            DatabaseType::SqlServer => format!(
                "Server=tcp:{server},1433;Initial Catalog={database};Persist Security Info=False;\
                 User ID={{username}};Password={{password}};MultipleActiveResultSets=False;\
                 Encrypt=True;TrustServerCertificate=False;Connection Timeout=30;"
            ),
            DatabaseType::MySql => format!(
                "Server={server};Database={database};Uid={{username}};Pwd={{password}};SslMode=Required;"
            ),
            DatabaseType::PostgreSql => format!(
                "Host={server};Database={database};Username={{username}};Password={{password}};SSL Mode=Require;"
            ),
            DatabaseType::CosmosDb => format!(
                "AccountEndpoint={};AccountKey={{key}};Database={database};",
                cosmos_endpoint(server)
            ),
        }
    }
}

/// Accepts an account name, a host name or a full endpoint URL.
fn cosmos_endpoint(server: &str) -> String {
    if server.starts_with("https://") {
        server.to_string()
    } else if server.contains('.') {
        format!("https://{server}:443/")
    } else {
        format!("https://{server}.documents.azure.com:443/")
    }
}

impl FromStr for DatabaseType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        DatabaseType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| DatabaseType::unsupported(s))
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection configured on an App Service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct DatabaseConnectionInfo {
    /// Database type as requested.
    pub database_type: String,
    pub database_server: String,
    pub database_name: String,
    pub connection_string: String,
    /// App setting name the connection string is stored under.
    pub connection_string_name: String,
    pub is_configured: bool,
    pub configured_at: DateTime<Utc>,
}

/// Results payload of `appservice database add`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DatabaseAddResult {
    #[serde(rename = "ConnectionInfo")]
    pub connection_info: DatabaseConnectionInfo,
}

/// Validated parameters handed to the service.
#[derive(Debug, Clone, PartialEq)]
pub struct AddDatabaseRequest {
    pub app_name: String,
    pub resource_group: String,
    pub database_type: String,
    pub database_server: String,
    pub database_name: String,
    /// Empty when the service should generate one.
    pub connection_string: String,
    pub subscription: String,
    pub tenant: Option<String>,
    pub retry_policy: Option<RetryPolicyOptions>,
}
