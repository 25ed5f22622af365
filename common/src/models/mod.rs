//! Shared models passed from commands to services.

pub mod auth;
pub mod retry;

// Re-export commonly used types
pub use auth::AuthMethod;
pub use retry::{RetryMode, RetryPolicyOptions};
