//! App Service option definitions and bound option values.

use clap::ArgMatches;
use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::models::{AuthMethod, RetryPolicyOptions};
use common::options::{
    self, OptionDefinition, OptionKind, AUTH_METHOD, RESOURCE_GROUP, SUBSCRIPTION, TENANT,
};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::models::{AddDatabaseRequest, DatabaseType};

pub const APP: OptionDefinition =
    OptionDefinition::required("app", "The name of the Azure App Service.");

/// Blank values are kept and rejected as an unsupported type.
pub const DATABASE_TYPE: OptionDefinition = OptionDefinition::required(
    "database-type",
    "The type of database (e.g., SqlServer, MySQL, PostgreSQL, CosmosDB).",
)
.with_kind(OptionKind::Verbatim);

pub const DATABASE_SERVER: OptionDefinition = OptionDefinition::required(
    "database-server",
    "The server name or endpoint for the database.",
);

pub const DATABASE: OptionDefinition =
    OptionDefinition::required("database", "The name of the database.");

pub const CONNECTION_STRING: OptionDefinition = OptionDefinition::optional(
    "connection-string",
    "The connection string for the database. If not provided, a default will be generated.",
);

/// Options of `appservice database add`, bound from parsed arguments.
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct DatabaseAddOptions {
    #[validate(required, length(min = 1))]
    pub subscription: Option<String>,
    #[validate(required, length(min = 1, max = 90))]
    pub resource_group: Option<String>,
    pub tenant: Option<String>,
    #[validate(required, length(min = 1, max = 60))]
    pub app_name: Option<String>,
    #[validate(required)]
    pub database_type: Option<String>,
    #[validate(required, length(min = 1, max = 253))]
    pub database_server: Option<String>,
    #[validate(required, length(min = 1, max = 128))]
    pub database_name: Option<String>,
    pub connection_string: Option<String>,
    pub auth_method: Option<AuthMethod>,
    pub retry_policy: Option<RetryPolicyOptions>,
}

/// Validated field name to the option it was bound from, in flag order.
const FIELD_OPTIONS: [(&str, OptionDefinition); 6] = [
    ("subscription", SUBSCRIPTION),
    ("resource_group", RESOURCE_GROUP),
    ("app_name", APP),
    ("database_type", DATABASE_TYPE),
    ("database_server", DATABASE_SERVER),
    ("database_name", DATABASE),
];

impl DatabaseAddOptions {
    /// Binds parsed arguments.
    ///
    /// Subscription and tenant fall back to the configured defaults; blank
    /// values bind as absent.
    ///
    /// # Errors
    /// Returns `AppError::InvalidOption` when a choice option holds an
    /// unknown value.
    pub fn bind(matches: &ArgMatches, config: &AppConfig) -> AppResult<Self> {
        let value = |option: &OptionDefinition| options::string_value(matches, option);

        Ok(Self {
            subscription: value(&SUBSCRIPTION).or_else(|| config.default_subscription.clone()),
            resource_group: value(&RESOURCE_GROUP),
            tenant: value(&TENANT).or_else(|| config.default_tenant.clone()),
            app_name: value(&APP),
            database_type: options::raw_value(matches, &DATABASE_TYPE),
            database_server: value(&DATABASE_SERVER),
            database_name: value(&DATABASE),
            connection_string: value(&CONNECTION_STRING),
            auth_method: value(&AUTH_METHOD).map(|m| m.parse()).transpose()?,
            retry_policy: RetryPolicyOptions::bind(matches)?,
        })
    }

    /// Validates the options and builds the service request.
    ///
    /// Pure: calling it repeatedly on the same options yields the same
    /// outcome.
    ///
    /// # Errors
    /// `AppError::MissingOptions` listing every absent required flag,
    /// `AppError::InvalidOption` for the first malformed value, or
    /// `AppError::UnsupportedDatabaseType` for a blank database type.
    pub fn to_request(&self) -> AppResult<AddDatabaseRequest> {
        if let Err(errors) = self.validate() {
            return Err(describe(&errors));
        }
        if let Some(policy) = &self.retry_policy {
            policy.validate()?;
        }

        let (
            Some(subscription),
            Some(resource_group),
            Some(app_name),
            Some(database_type),
            Some(database_server),
            Some(database_name),
        ) = (
            &self.subscription,
            &self.resource_group,
            &self.app_name,
            &self.database_type,
            &self.database_server,
            &self.database_name,
        )
        else {
            return Err(AppError::MissingOptions(self.missing_flags().join(", ")));
        };

        if database_type.trim().is_empty() {
            return Err(DatabaseType::unsupported(database_type));
        }

        Ok(AddDatabaseRequest {
            app_name: app_name.clone(),
            resource_group: resource_group.clone(),
            database_type: database_type.clone(),
            database_server: database_server.clone(),
            database_name: database_name.clone(),
            connection_string: self.connection_string.clone().unwrap_or_default(),
            subscription: subscription.clone(),
            tenant: self.tenant.clone(),
            retry_policy: self.retry_policy.clone(),
        })
    }

    fn missing_flags(&self) -> Vec<String> {
        [
            (&self.subscription, SUBSCRIPTION),
            (&self.resource_group, RESOURCE_GROUP),
            (&self.app_name, APP),
            (&self.database_type, DATABASE_TYPE),
            (&self.database_server, DATABASE_SERVER),
            (&self.database_name, DATABASE),
        ]
        .into_iter()
        .filter(|(value, _)| value.is_none())
        .map(|(_, option)| option.flag())
        .collect()
    }
}

/// Turns validator output into a single error, reporting flags rather than
/// field names.
fn describe(errors: &ValidationErrors) -> AppError {
    let failures = errors.errors();
    let mut missing = Vec::new();
    let mut invalid = Vec::new();

    for (field, option) in FIELD_OPTIONS {
        let Some(ValidationErrorsKind::Field(field_errors)) = failures.get(field) else {
            continue;
        };
        if field_errors.iter().any(|e| e.code == "required") {
            missing.push(option.flag());
        } else {
            invalid.push(format!("{} has an invalid length", option.flag()));
        }
    }

    if !missing.is_empty() {
        AppError::MissingOptions(missing.join(", "))
    } else {
        AppError::InvalidOption(invalid.join("; "))
    }
}
