//! Azure CLI invocation.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use common::errors::{AppError, AppResult};
use mockall::automock;
use tokio::process::Command;

/// Markers in CLI error output that identify a missing resource.
const NOT_FOUND_MARKERS: [&str; 7] = [
    "ResourceGroupNotFound",
    "ResourceNotFound",
    "WebSiteNotFound",
    "SubscriptionNotFound",
    "could not be found",
    "was not found",
    "does not exist",
];

const AUTH_MARKERS: [&str; 3] = ["az login", "AADSTS", "AuthorizationFailed"];

const TRANSIENT_MARKERS: [&str; 6] = [
    "TooManyRequests",
    "(429)",
    "ServiceUnavailable",
    "GatewayTimeout",
    "timed out",
    "Connection aborted",
];

#[automock]
#[async_trait]
/// Runs Azure CLI commands.
pub trait AzCliRunner: Send + Sync {
    /// Runs `az` with `args` and returns its standard output.
    ///
    /// The call is abandoned, and the child killed, after `timeout`.
    async fn run(&self, args: Vec<String>, timeout: Duration) -> AppResult<String>;
}

/// Spawns the `az` executable.
#[derive(Debug, Clone)]
pub struct ProcessAzCli {
    program: String,
}

impl ProcessAzCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl AzCliRunner for ProcessAzCli {
    async fn run(&self, args: Vec<String>, timeout: Duration) -> AppResult<String> {
        tracing::debug!(
            program = %self.program,
            command = %args.iter().take(4).cloned().collect::<Vec<_>>().join(" "),
            "Running Azure CLI"
        );

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(timeout, command.output())
            .await
            .map_err(|_| AppError::Timeout(timeout))??;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(classify_failure(&String::from_utf8_lossy(&output.stderr)))
        }
    }
}

/// Maps CLI error output to an error kind.
pub fn classify_failure(stderr: &str) -> AppError {
    let summary = summarize(stderr);
    let contains_any = |markers: &[&str]| markers.iter().any(|m| stderr.contains(m));

    if contains_any(&NOT_FOUND_MARKERS) {
        AppError::ResourceNotFound(summary)
    } else if contains_any(&AUTH_MARKERS) {
        AppError::Authentication(summary)
    } else if contains_any(&TRANSIENT_MARKERS) {
        AppError::Transient(summary)
    } else {
        AppError::ExternalService(summary)
    }
}

/// The first `ERROR:` line of the CLI output, else its last non-empty line.
fn summarize(stderr: &str) -> String {
    let mut lines = stderr.lines().map(str::trim).filter(|line| !line.is_empty());

    lines
        .clone()
        .find_map(|line| line.strip_prefix("ERROR:"))
        .or_else(|| lines.next_back())
        .map(|line| line.trim().to_string())
        .unwrap_or_else(|| "Azure CLI exited with an error".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_missing_resource_group() {
        let error = classify_failure(
            "ERROR: (ResourceGroupNotFound) Resource group 'test-rg' could not be found.\nCode: ResourceGroupNotFound\n",
        );

        assert_eq!(error.code(), "RESOURCE_NOT_FOUND");
        assert!(error.to_string().contains("ResourceGroupNotFound"));
    }

    #[test]
    fn test_classifies_login_required() {
        let error = classify_failure("ERROR: Please run 'az login' to setup account.");

        assert_eq!(error.code(), "AUTHENTICATION_FAILED");
        assert!(error.to_string().ends_with("Please run 'az login' to setup account."));
    }

    #[test]
    fn test_classifies_throttling_as_transient() {
        let error = classify_failure("ERROR: (TooManyRequests) Rate limit exceeded.");
        assert!(error.is_transient());
    }

    #[test]
    fn test_unknown_failure_keeps_summary() {
        let error = classify_failure("WARNING: something\nERROR: boom\n\n");

        assert_eq!(error.code(), "EXTERNAL_SERVICE_ERROR");
        assert_eq!(error.to_string(), "External service error: boom");
    }

    #[test]
    fn test_empty_output_has_fallback_message() {
        let error = classify_failure("");
        assert!(error.to_string().contains("Azure CLI exited with an error"));
    }

    #[tokio::test]
    async fn test_missing_executable_is_io_error() {
        let runner = ProcessAzCli::new("definitely-not-an-az-binary");
        let error = runner
            .run(vec!["version".into()], Duration::from_secs(5))
            .await
            .unwrap_err();

        assert_eq!(error.code(), "IO_ERROR");
    }
}
