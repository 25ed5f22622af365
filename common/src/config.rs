//! Application configuration.
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file in the working directory.

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5008;
const DEFAULT_AZ_CLI: &str = "az";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Runtime configuration shared by every command invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Name reported in response metadata and logs.
    pub service: String,
    /// Bind address for server mode.
    pub host: String,
    /// Bind port for server mode.
    pub port: u16,
    /// Subscription used when `--subscription` is omitted.
    pub default_subscription: Option<String>,
    /// Tenant used when `--tenant` is omitted.
    pub default_tenant: Option<String>,
    /// Path or name of the Azure CLI executable.
    pub az_cli_path: String,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Emit logs as JSON lines.
    pub log_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service: env!("CARGO_PKG_NAME").to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            default_subscription: None,
            default_tenant: None,
            az_cli_path: DEFAULT_AZ_CLI.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the process environment.
    pub fn load_with_service(service: impl Into<String>) -> Self {
        Self::from_lookup(service, |key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(service: impl Into<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Self {
            service: service.into(),
            host: get("SERVER_HOST").unwrap_or(defaults.host),
            port: get("SERVER_PORT")
                .and_then(|value| value.parse().ok())
                .unwrap_or(defaults.port),
            default_subscription: get("AZURE_SUBSCRIPTION_ID"),
            default_tenant: get("AZURE_TENANT_ID"),
            az_cli_path: get("AZ_CLI_PATH").unwrap_or(defaults.az_cli_path),
            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json: get("LOG_FORMAT").is_some_and(|format| format.eq_ignore_ascii_case("json")),
        }
    }
}

/// Loads `.env` from the working directory if present.
///
/// Variables already set in the environment win.
pub fn load_dotenv() {
    if let Err(error) = dotenvy::dotenv() {
        if !error.not_found() {
            eprintln!("ignoring malformed .env file: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = AppConfig::from_lookup("aztool", lookup(&[]));

        assert_eq!(config.service, "aztool");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.az_cli_path, "az");
        assert!(config.default_subscription.is_none());
        assert!(!config.log_json);
    }

    #[test]
    fn test_reads_azure_defaults() {
        let config = AppConfig::from_lookup(
            "aztool",
            lookup(&[
                ("AZURE_SUBSCRIPTION_ID", "env-sub-123"),
                ("AZURE_TENANT_ID", "tenant-1"),
                ("SERVER_PORT", "9000"),
                ("LOG_FORMAT", "JSON"),
            ]),
        );

        assert_eq!(config.default_subscription.as_deref(), Some("env-sub-123"));
        assert_eq!(config.default_tenant.as_deref(), Some("tenant-1"));
        assert_eq!(config.port, 9000);
        assert!(config.log_json);
    }

    #[test]
    fn test_blank_and_invalid_values_fall_back() {
        let config = AppConfig::from_lookup(
            "aztool",
            lookup(&[("AZURE_SUBSCRIPTION_ID", "  "), ("SERVER_PORT", "not-a-port")]),
        );

        assert!(config.default_subscription.is_none());
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
