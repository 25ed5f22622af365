//! Command trait, command groups and the parse/execute pipeline.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use clap::{error::ErrorKind, ArgMatches};
use serde::Serialize;
use utoipa::ToSchema;

use crate::context::CommandContext;
use crate::errors::AppError;
use crate::options::OptionDefinition;
use crate::response::CommandResponse;

/// Separator between path segments in tool names.
pub const TOOL_NAME_SEPARATOR: &str = "_";

/// Behavioral hints published alongside a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolMetadata {
    /// The command deletes or overwrites existing state.
    pub destructive: bool,
    /// The command never modifies state.
    pub read_only: bool,
}

/// A single executable command.
#[async_trait]
pub trait Command: Send + Sync {
    /// Leaf name within its group, e.g. `add`.
    fn name(&self) -> &'static str;

    fn title(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn metadata(&self) -> ToolMetadata;

    /// Full option table, inherited options included.
    fn options(&self) -> Vec<OptionDefinition>;

    /// Binds, validates and runs the command against parsed arguments.
    ///
    /// Failures are reported in the returned envelope, never by panicking.
    async fn execute(&self, context: &CommandContext, args: &ArgMatches) -> CommandResponse;

    /// Builds the argument parser from the option table.
    fn parser(&self) -> clap::Command {
        self.options().iter().fold(
            clap::Command::new(self.name())
                .about(self.description())
                .no_binary_name(true),
            |parser, option| parser.arg(option.to_arg()),
        )
    }
}

/// Parses raw arguments and executes `command`.
///
/// Parse failures become 400 envelopes without reaching `execute`. Help and
/// version requests are handed back as `Err` for the caller to display.
pub async fn run(
    command: &dyn Command,
    tool_name: &str,
    context: &CommandContext,
    args: &[String],
) -> Result<CommandResponse, clap::Error> {
    let started = Instant::now();

    let parsed = command.parser().try_get_matches_from(args);
    let response = match parsed {
        Ok(matches) => command.execute(context, &matches).await,
        Err(error) if is_informational(&error) => return Err(error),
        Err(error) => {
            let error = AppError::from(error);
            tracing::warn!(tool = tool_name, error = %error, "Rejected command arguments");
            context.response(tool_name).with_error(&error)
        }
    };

    let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    Ok(response.with_command(tool_name).with_duration(elapsed))
}

fn is_informational(error: &clap::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    )
}

/// A named group of commands and nested groups, e.g. `appservice database`.
pub struct CommandGroup {
    pub name: String,
    pub description: String,
    pub subgroups: Vec<CommandGroup>,
    pub commands: Vec<Arc<dyn Command>>,
}

impl std::fmt::Debug for CommandGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandGroup")
            .field("name", &self.name)
            .field("subgroups", &self.subgroups)
            .field(
                "commands",
                &self.commands.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl CommandGroup {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            subgroups: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub fn add_command(&mut self, command: Arc<dyn Command>) {
        self.commands.push(command);
    }

    /// Returns a nested group by name, creating it if needed.
    pub fn subgroup_mut(&mut self, name: &str, description: &str) -> &mut CommandGroup {
        let index = match self.subgroups.iter().position(|g| g.name == name) {
            Some(index) => index,
            None => {
                self.subgroups.push(CommandGroup::new(name, description));
                self.subgroups.len() - 1
            }
        };
        &mut self.subgroups[index]
    }

    /// Resolves a command path below this group, e.g. `["appservice", "database", "add"]`.
    pub fn find(&self, path: &[&str]) -> Option<Arc<dyn Command>> {
        match path {
            [] => None,
            [leaf] => self.commands.iter().find(|c| c.name() == *leaf).cloned(),
            [head, rest @ ..] => self
                .subgroups
                .iter()
                .find(|g| g.name == *head)
                .and_then(|g| g.find(rest)),
        }
    }

    /// Flattens the tree into `(tool_name, command)` pairs.
    ///
    /// Tool names join the path below this group with `_`.
    pub fn tools(&self) -> Vec<(String, Arc<dyn Command>)> {
        let mut tools = Vec::new();
        self.collect_tools(&mut Vec::new(), &mut tools);
        tools
    }

    fn collect_tools<'a>(
        &'a self,
        prefix: &mut Vec<&'a str>,
        tools: &mut Vec<(String, Arc<dyn Command>)>,
    ) {
        for command in &self.commands {
            let mut path = prefix.clone();
            path.push(command.name());
            tools.push((path.join(TOOL_NAME_SEPARATOR), Arc::clone(command)));
        }
        for group in &self.subgroups {
            prefix.push(&group.name);
            group.collect_tools(prefix, tools);
            prefix.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::config::AppConfig;
    use crate::options::{self, OptionDefinition, TENANT};

    const NAME: OptionDefinition = OptionDefinition::required("name", "Name to greet.");

    #[derive(Default)]
    struct EchoCommand {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Command for EchoCommand {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn title(&self) -> &'static str {
            "Echo"
        }

        fn description(&self) -> &'static str {
            "Echoes the name."
        }

        fn metadata(&self) -> ToolMetadata {
            ToolMetadata {
                destructive: false,
                read_only: true,
            }
        }

        fn options(&self) -> Vec<OptionDefinition> {
            vec![NAME, TENANT]
        }

        async fn execute(&self, context: &CommandContext, args: &ArgMatches) -> CommandResponse {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let name = options::string_value(args, &NAME);
            context.response("echo").with_results(&name)
        }
    }

    fn context() -> CommandContext {
        CommandContext::new(Arc::new(AppConfig::default()))
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_run_executes_parsed_command() {
        let command = EchoCommand::default();
        let response = run(&command, "test_echo", &context(), &args(&["--name", "web"]))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.results, Some(serde_json::json!("web")));
        assert_eq!(response.meta.command.as_deref(), Some("test_echo"));
        assert!(response.meta.duration_ms.is_some());
    }

    #[tokio::test]
    async fn test_parse_failure_skips_execute() {
        let command = EchoCommand::default();
        let response = run(&command, "test_echo", &context(), &args(&["--tenant", "t"]))
            .await
            .unwrap();

        assert_eq!(response.status, 400);
        assert_eq!(response.error.unwrap().code, "MISSING_REQUIRED_OPTIONS");
        assert_eq!(command.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_flag_is_invalid_option() {
        let command = EchoCommand::default();
        let response = run(&command, "test_echo", &context(), &args(&["--name", "a", "--bogus", "1"]))
            .await
            .unwrap();

        assert_eq!(response.error.unwrap().code, "INVALID_OPTION");
        assert_eq!(command.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_help_is_returned_to_caller() {
        let command = EchoCommand::default();
        let outcome = run(&command, "test_echo", &context(), &args(&["--help"])).await;

        assert!(outcome.is_err());
        assert_eq!(command.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_group_lookup_and_tool_names() {
        let mut root = CommandGroup::new("root", "Root");
        root.subgroup_mut("test", "Test operations")
            .add_command(Arc::new(EchoCommand::default()));

        assert!(root.find(&["test", "echo"]).is_some());
        assert!(root.find(&["test", "missing"]).is_none());
        assert!(root.find(&["echo"]).is_none());

        let names: Vec<_> = root.tools().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["test_echo".to_string()]);
    }
}
