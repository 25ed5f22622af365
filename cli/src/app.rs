//! Command-line surface built from the registered command groups.

use clap::{Arg, ArgMatches, Args, FromArgMatches};

use common::command::CommandGroup;

pub const BIN_NAME: &str = "aztool";

/// Argument id holding a leaf command's unparsed arguments.
const RAW_ARGS: &str = "args";

pub const SERVER: &str = "server";
const SERVER_START: &str = "start";

/// Arguments of `server start`.
#[derive(Debug, Clone, Args)]
pub struct ServerArgs {
    /// Address to bind (defaults to SERVER_HOST or 127.0.0.1).
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (defaults to SERVER_PORT or 5008).
    #[arg(long)]
    pub port: Option<u16>,
}

/// What the command line asked for.
#[derive(Debug)]
pub enum Invocation {
    /// Run a tool, e.g. path `["appservice", "database", "add"]`.
    Tool { path: Vec<String>, args: Vec<String> },
    /// Start the HTTP tool server.
    Server(ServerArgs),
}

/// Builds the top-level parser.
///
/// Leaf commands only capture their raw arguments here; they are parsed
/// against the command's own option table when it runs.
pub fn build(root: &CommandGroup) -> clap::Command {
    let server = ServerArgs::augment_args(
        clap::Command::new(SERVER_START).about("Serve registered commands as HTTP tool calls"),
    );

    root.subgroups
        .iter()
        .fold(
            clap::Command::new(BIN_NAME)
                .version(env!("CARGO_PKG_VERSION"))
                .about("Azure tools: App Service database connections")
                .subcommand_required(true)
                .arg_required_else_help(true),
            |app, group| app.subcommand(group_command(group)),
        )
        .subcommand(
            clap::Command::new(SERVER)
                .about("HTTP tool server")
                .subcommand_required(true)
                .subcommand(server),
        )
}

fn group_command(group: &CommandGroup) -> clap::Command {
    let command = clap::Command::new(group.name.clone())
        .about(group.description.clone())
        .subcommand_required(true)
        .arg_required_else_help(true);

    let command = group
        .subgroups
        .iter()
        .fold(command, |command, sub| command.subcommand(group_command(sub)));

    group.commands.iter().fold(command, |command, leaf| {
        command.subcommand(
            clap::Command::new(leaf.name())
                .about(leaf.title())
                .disable_help_flag(true)
                .arg(
                    Arg::new(RAW_ARGS)
                        .num_args(0..)
                        .trailing_var_arg(true)
                        .allow_hyphen_values(true),
                ),
        )
    })
}

/// Resolves parsed top-level matches into an invocation.
pub fn invocation(matches: &ArgMatches) -> clap::error::Result<Invocation> {
    let mut path = Vec::new();
    let mut current = matches;
    while let Some((name, sub)) = current.subcommand() {
        path.push(name.to_string());
        current = sub;
    }

    if path.first().map(String::as_str) == Some(SERVER) {
        return ServerArgs::from_arg_matches(current).map(Invocation::Server);
    }

    let args = current
        .get_many::<String>(RAW_ARGS)
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    Ok(Invocation::Tool { path, args })
}
