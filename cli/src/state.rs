//! Application state for server mode.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::watch;

use common::command::{Command, CommandGroup};
use common::config::AppConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Registered commands keyed by tool name.
    pub tools: Arc<BTreeMap<String, Arc<dyn Command>>>,
    /// Flips to `true` when the server shuts down; in-flight calls are cancelled.
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: Arc<AppConfig>, root: &CommandGroup, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            config,
            tools: Arc::new(root.tools().into_iter().collect()),
            shutdown,
        }
    }
}
