//! Authentication method selection.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;

/// How the backing service should authenticate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum AuthMethod {
    /// Ambient Azure credential (CLI login, managed identity, ...).
    #[default]
    Credential,
    /// Account key.
    Key,
    /// Caller-supplied connection string.
    ConnectionString,
}

impl AuthMethod {
    /// Accepted spellings, in declaration order.
    pub const NAMES: &'static [&'static str] = &["credential", "key", "connectionString"];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Credential => "credential",
            AuthMethod::Key => "key",
            AuthMethod::ConnectionString => "connectionString",
        }
    }
}

impl FromStr for AuthMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [AuthMethod::Credential, AuthMethod::Key, AuthMethod::ConnectionString]
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::InvalidOption(format!("unknown auth method '{s}'")))
    }
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
