//! Unique ID generator.
//!
//! Provides utilities for generating unique identifiers.

use uuid::Uuid;

/// Generates unique identifiers for command invocations.
pub struct IdGenerator;

impl IdGenerator {
    /// Generates a unique activity ID.
    ///
    /// # Returns
    /// A unique UUID string.
    pub fn activity_id() -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_id_is_unique() {
        let id1 = IdGenerator::activity_id();
        let id2 = IdGenerator::activity_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_activity_id_is_uuid() {
        assert!(Uuid::parse_str(&IdGenerator::activity_id()).is_ok());
    }
}
