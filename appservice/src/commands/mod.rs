//! App Service commands.

pub mod database_add;

pub use database_add::DatabaseAddCommand;
