//! aztool
//!
//! Runs Azure tool commands from the command line, or serves them as HTTP
//! tool calls with `aztool server start`. Every command prints a JSON
//! response envelope on stdout; logs go to stderr.

mod app;
mod routes;
mod server;
mod state;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::info;

use appservice::AppServiceService;
use common::command::{self, CommandGroup, TOOL_NAME_SEPARATOR};
use common::config::{self, AppConfig};
use common::context::CommandContext;
use common::logging;

use app::Invocation;

const SERVICE_NAME: &str = "aztool";

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Configuration
    config::load_dotenv();
    let config = Arc::new(AppConfig::load_with_service(SERVICE_NAME));

    // Logging
    logging::init(&config);

    let root = build_root(&config);
    let matches = app::build(&root).get_matches();

    match app::invocation(&matches)? {
        Invocation::Server(args) => {
            let host = args.host.unwrap_or_else(|| config.host.clone());
            let port = args.port.unwrap_or(config.port);
            server::serve(config, &root, &host, port).await?;
            Ok(ExitCode::SUCCESS)
        }
        Invocation::Tool { path, args } => run_tool(config, &root, &path, &args).await,
    }
}

/// Registers every command area.
fn build_root(config: &AppConfig) -> CommandGroup {
    let mut root = CommandGroup::new(SERVICE_NAME, "Azure tools");
    appservice::setup::register(&mut root, Arc::new(AppServiceService::from_config(config)));
    root
}

async fn run_tool(
    config: Arc<AppConfig>,
    root: &CommandGroup,
    path: &[String],
    args: &[String],
) -> anyhow::Result<ExitCode> {
    let segments: Vec<&str> = path.iter().map(String::as_str).collect();
    let command = root
        .find(&segments)
        .with_context(|| format!("no command registered at '{}'", segments.join(" ")))?;
    let tool = segments.join(TOOL_NAME_SEPARATOR);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Cancellation requested");
            let _ = cancel_tx.send(true);
        }
    });

    let context = CommandContext::new(config).with_cancellation(cancel_rx);

    match command::run(command.as_ref(), &tool, &context, args).await {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(if response.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Err(help) => {
            help.print()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
