//! App Service command area.

pub mod az_cli;
pub mod commands;
pub mod models;
pub mod options;
pub mod service;
pub mod setup;

pub use commands::DatabaseAddCommand;
pub use service::{AppServiceService, AppServiceServiceTrait};
