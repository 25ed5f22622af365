//! Shared command framework for all tool areas.
//!
//! Provides the option table type, the command trait and command groups,
//! the per-invocation context, the response envelope and the common error,
//! configuration and logging setup.

pub mod command;
pub mod config;
pub mod context;
pub mod errors;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod options;
pub mod response;
pub mod utils;
