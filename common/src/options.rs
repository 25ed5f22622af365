//! Option definitions shared by every command.
//!
//! Each area declares its own options as `OptionDefinition` constants and
//! combines them with the inherited tables below. The parser is built from
//! these tables, so help output, required flags and the tool listing all come
//! from one place.

use clap::{
    builder::{NonEmptyStringValueParser, PossibleValuesParser},
    value_parser, Arg, ArgMatches,
};

use crate::models::{auth::AuthMethod, retry::RetryMode};

/// Value type accepted by an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Non-empty string.
    Text,
    /// String kept as typed, blank included.
    Verbatim,
    /// Unsigned integer.
    Integer,
    /// Floating point number.
    Number,
    /// One of a fixed, case-insensitive set.
    Choice(&'static [&'static str]),
}

/// A named command-line option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionDefinition {
    /// Flag name without the leading dashes.
    pub name: &'static str,
    /// Help text.
    pub description: &'static str,
    /// Whether the parser rejects invocations that omit it.
    pub required: bool,
    pub kind: OptionKind,
}

impl OptionDefinition {
    /// Declares a required text option.
    pub const fn required(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            required: true,
            kind: OptionKind::Text,
        }
    }

    /// Declares an optional text option.
    pub const fn optional(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            required: false,
            kind: OptionKind::Text,
        }
    }

    /// Replaces the value type.
    pub const fn with_kind(self, kind: OptionKind) -> Self {
        Self { kind, ..self }
    }

    /// Returns the flag as typed on the command line, e.g. `--app`.
    pub fn flag(&self) -> String {
        format!("--{}", self.name)
    }

    /// Short type label used in tool listings.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            OptionKind::Text | OptionKind::Verbatim => "string",
            OptionKind::Integer => "integer",
            OptionKind::Number => "number",
            OptionKind::Choice(_) => "choice",
        }
    }

    /// Builds the `clap` argument for this option.
    pub fn to_arg(&self) -> Arg {
        let arg = Arg::new(self.name)
            .long(self.name)
            .help(self.description)
            .required(self.required);

        match self.kind {
            OptionKind::Text => arg.value_parser(NonEmptyStringValueParser::new()),
            OptionKind::Verbatim => arg.value_parser(value_parser!(String)),
            OptionKind::Integer => arg.value_parser(value_parser!(u32)),
            OptionKind::Number => arg.value_parser(value_parser!(f64)),
            OptionKind::Choice(values) => arg
                .value_parser(PossibleValuesParser::new(values.iter().copied()))
                .ignore_case(true),
        }
    }
}

pub const SUBSCRIPTION: OptionDefinition = OptionDefinition::optional(
    "subscription",
    "The Azure subscription ID or name. Falls back to AZURE_SUBSCRIPTION_ID when omitted.",
);

pub const RESOURCE_GROUP: OptionDefinition = OptionDefinition::required(
    "resource-group",
    "The name of the Azure resource group.",
);

pub const TENANT: OptionDefinition =
    OptionDefinition::optional("tenant", "The Microsoft Entra ID tenant ID or name.");

pub const AUTH_METHOD: OptionDefinition = OptionDefinition::optional(
    "auth-method",
    "Authentication method to use: credential, key or connectionString.",
)
.with_kind(OptionKind::Choice(AuthMethod::NAMES));

pub const RETRY_MAX_RETRIES: OptionDefinition = OptionDefinition::optional(
    "retry-max-retries",
    "Maximum number of retry attempts for failed operations.",
)
.with_kind(OptionKind::Integer);

pub const RETRY_DELAY: OptionDefinition = OptionDefinition::optional(
    "retry-delay",
    "Initial delay in seconds between retry attempts.",
)
.with_kind(OptionKind::Number);

pub const RETRY_MAX_DELAY: OptionDefinition = OptionDefinition::optional(
    "retry-max-delay",
    "Maximum delay in seconds between retries.",
)
.with_kind(OptionKind::Number);

pub const RETRY_MODE: OptionDefinition =
    OptionDefinition::optional("retry-mode", "Retry strategy: fixed or exponential.")
        .with_kind(OptionKind::Choice(RetryMode::NAMES));

pub const RETRY_NETWORK_TIMEOUT: OptionDefinition = OptionDefinition::optional(
    "retry-network-timeout",
    "Network operation timeout in seconds.",
)
.with_kind(OptionKind::Number);

/// Options every command inherits.
pub const GLOBAL_OPTIONS: [OptionDefinition; 7] = [
    TENANT,
    AUTH_METHOD,
    RETRY_MAX_RETRIES,
    RETRY_DELAY,
    RETRY_MAX_DELAY,
    RETRY_MODE,
    RETRY_NETWORK_TIMEOUT,
];

/// Options of commands scoped to a subscription.
pub fn subscription_options() -> Vec<OptionDefinition> {
    std::iter::once(SUBSCRIPTION).chain(GLOBAL_OPTIONS).collect()
}

/// Options of commands scoped to a resource group.
pub fn resource_group_options() -> Vec<OptionDefinition> {
    let mut options = subscription_options();
    options.push(RESOURCE_GROUP);
    options
}

/// Reads a string option exactly as supplied.
pub fn raw_value(matches: &ArgMatches, option: &OptionDefinition) -> Option<String> {
    matches.try_get_one::<String>(option.name).ok().flatten().cloned()
}

/// Reads a string option, treating blank values as absent.
///
/// Options the command does not declare read as absent too.
pub fn string_value(matches: &ArgMatches, option: &OptionDefinition) -> Option<String> {
    matches
        .try_get_one::<String>(option.name)
        .ok()
        .flatten()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
