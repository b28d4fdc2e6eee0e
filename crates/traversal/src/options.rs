//! Traversal configuration.

use serde::{Deserialize, Serialize};

/// What happens to queued work once a node has failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop scheduling new nodes but let already submitted jobs run.
    #[default]
    Drain,
    /// Stop scheduling new nodes, and skip the work of jobs that start after the failure.
    Halt,
}

/// Options for [`Traversal::start_with`](crate::Traversal::start_with).
///
/// Deserializes from a partial table, missing fields take their defaults:
///
/// ```
/// use dagwalk_traversal::{FailurePolicy, TraversalOptions};
///
/// let options: TraversalOptions = serde_json::from_str(r#"{ "on_failure": "halt" }"#).unwrap();
/// assert_eq!(options.on_failure, FailurePolicy::Halt);
/// assert!(!options.validate_acyclic);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct TraversalOptions {
    /// Behavior after the first failure
    pub on_failure: FailurePolicy,
    /// Reject cyclic graphs up front instead of running until a timeout
    pub validate_acyclic: bool,
}

impl TraversalOptions {
    /// Default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the failure policy.
    #[must_use]
    pub const fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }

    /// Enable or disable the up-front cycle check.
    #[must_use]
    pub const fn with_acyclic_validation(mut self, enabled: bool) -> Self {
        self.validate_acyclic = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = TraversalOptions::new();
        assert_eq!(options.on_failure, FailurePolicy::Drain);
        assert!(!options.validate_acyclic);
    }

    #[test]
    fn test_builders() {
        let options = TraversalOptions::new()
            .with_failure_policy(FailurePolicy::Halt)
            .with_acyclic_validation(true);
        assert_eq!(options.on_failure, FailurePolicy::Halt);
        assert!(options.validate_acyclic);
    }

    #[test]
    fn test_deserialize_empty_table() {
        let options: TraversalOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, TraversalOptions::default());
    }

    #[test]
    fn test_serialize_snake_case() {
        let options = TraversalOptions::new().with_failure_policy(FailurePolicy::Halt);
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "on_failure": "halt", "validate_acyclic": false })
        );
    }
}
