//! Validation utilities for dependency graphs.
//!
//! This module reports which nodes keep a graph from being ordered.

use crate::{DependencyGraph, Error};
use std::collections::HashSet;
use std::hash::Hash;
use tracing::debug;

/// Result of graph validation.
#[derive(Debug, Clone)]
pub struct ValidationResult<T> {
    /// Whether the graph is valid (no cycles).
    pub is_valid: bool,
    /// Nodes that could not be ordered: members of a cycle, or nodes a
    /// cycle depends on.
    pub unresolved: Vec<T>,
    /// List of validation errors, if any.
    pub errors: Vec<Error>,
}

impl<T> ValidationResult<T> {
    /// Create a valid result.
    #[must_use]
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            unresolved: vec![],
            errors: vec![],
        }
    }

    /// Create an invalid result for the given stuck nodes.
    #[must_use]
    pub fn invalid(unresolved: Vec<T>) -> Self {
        let errors = vec![Error::circular_dependency(unresolved.len())];
        Self {
            is_valid: false,
            unresolved,
            errors,
        }
    }
}

impl<T> DependencyGraph<T>
where
    T: Eq + Hash + Clone,
{
    /// Validate the graph structure.
    ///
    /// Checks for cycles and lists the nodes that cannot be ordered because
    /// of them, in iteration order.
    #[must_use]
    pub fn validate(&self) -> ValidationResult<T> {
        let emitted: HashSet<&T> = self.kahn().into_iter().collect();
        if emitted.len() == self.len() {
            return ValidationResult::valid();
        }

        let unresolved: Vec<T> = self
            .nodes()
            .filter(|node| !emitted.contains(node))
            .cloned()
            .collect();
        debug!(
            unresolved = unresolved.len(),
            "Dependency graph validation failed"
        );
        ValidationResult::invalid(unresolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_graph() {
        let graph: DependencyGraph<u32> = DependencyGraph::new();
        let result = graph.validate();
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert!(result.unresolved.is_empty());
    }

    #[test]
    fn test_validate_valid_graph() {
        let mut graph = DependencyGraph::new();
        graph.put_edge("b", "a");
        graph.add_node("c");

        let result = graph.validate();
        assert!(result.is_valid);
    }

    #[test]
    fn test_validate_cyclic_graph() {
        let mut graph = DependencyGraph::new();
        graph.put_edge("a", "b");
        graph.put_edge("b", "a");
        // "a" needs "c", so "c" is blocked behind the cycle; "d" is fine
        graph.put_edge("a", "c");
        graph.put_edge("d", "e");

        let result = graph.validate();
        assert!(!result.is_valid);
        assert_eq!(result.errors, vec![Error::circular_dependency(3)]);

        let unresolved: HashSet<&str> = result.unresolved.into_iter().collect();
        assert_eq!(unresolved, HashSet::from(["a", "b", "c"]));
    }
}
