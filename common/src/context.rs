//! Per-invocation command context.

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::AppConfig;
use crate::response::CommandResponse;
use crate::utils::IdGenerator;

/// Collaborator handles and identity of a single command invocation.
#[derive(Debug, Clone)]
pub struct CommandContext {
    config: Arc<AppConfig>,
    activity_id: String,
    cancellation: Option<watch::Receiver<bool>>,
}

impl CommandContext {
    /// Creates a context with a fresh activity ID and no cancellation signal.
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            activity_id: IdGenerator::activity_id(),
            cancellation: None,
        }
    }

    /// Reuses an activity ID supplied by the caller (e.g. `x-request-id`).
    pub fn with_activity_id(mut self, activity_id: impl Into<String>) -> Self {
        self.activity_id = activity_id.into();
        self
    }

    /// Attaches a cancellation signal; the invocation is cancelled once the
    /// watched value becomes `true`.
    pub fn with_cancellation(mut self, cancellation: watch::Receiver<bool>) -> Self {
        self.cancellation = Some(cancellation);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn activity_id(&self) -> &str {
        &self.activity_id
    }

    /// Resolves when the invocation is cancelled. Never resolves if no signal
    /// is attached or the sender goes away without cancelling.
    pub async fn cancelled(&self) {
        if let Some(cancellation) = &self.cancellation {
            let mut receiver = cancellation.clone();
            if receiver.wait_for(|cancelled| *cancelled).await.is_ok() {
                return;
            }
        }
        std::future::pending::<()>().await;
    }

    /// Starts a response pre-filled with this invocation's metadata.
    pub fn response(&self, command: &str) -> CommandResponse {
        CommandResponse::new()
            .with_activity_id(self.activity_id.clone())
            .with_command(command)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_cancelled_resolves_after_signal() {
        let (sender, receiver) = watch::channel(false);
        let context = CommandContext::new(Arc::new(AppConfig::default())).with_cancellation(receiver);

        sender.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), context.cancelled())
            .await
            .expect("cancellation should be observed");
    }

    #[tokio::test]
    async fn test_cancelled_pends_without_signal() {
        let context = CommandContext::new(Arc::new(AppConfig::default()));

        let outcome = tokio::time::timeout(Duration::from_millis(20), context.cancelled()).await;
        assert!(outcome.is_err());
    }

    #[test]
    fn test_response_carries_activity_id() {
        let context = CommandContext::new(Arc::new(AppConfig::default())).with_activity_id("req-1");
        let response = context.response("appservice_database_add");

        assert_eq!(response.meta.activity_id.as_deref(), Some("req-1"));
        assert_eq!(response.meta.command.as_deref(), Some("appservice_database_add"));
    }
}
