//! Error types for dependency graph queries.

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type for dependency graph queries.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by structural queries on a [`DependencyGraph`](crate::DependencyGraph).
///
/// Errors are local to the query that produced them: the graph itself is
/// left untouched, so removing an edge that closes a cycle makes the same
/// query succeed afterwards.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum Error {
    /// The graph contains at least one cycle.
    #[error("Circular dependency detected: {unresolved} node(s) could not be ordered")]
    #[diagnostic(
        code(dagwalk::graph::circular_dependency),
        help("Remove one of the edges that closes the cycle, see `DependencyGraph::validate`")
    )]
    CircularDependency {
        /// Number of nodes that sit on a cycle or that a cycle depends on.
        unresolved: usize,
    },
}

impl Error {
    /// Create a circular dependency error.
    #[must_use]
    pub const fn circular_dependency(unresolved: usize) -> Self {
        Self::CircularDependency { unresolved }
    }

    /// Returns true if this error reports a cycle.
    #[must_use]
    pub const fn is_circular_dependency(&self) -> bool {
        matches!(self, Self::CircularDependency { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_dependency_display() {
        let err = Error::circular_dependency(3);
        assert_eq!(
            err.to_string(),
            "Circular dependency detected: 3 node(s) could not be ordered"
        );
        assert!(err.is_circular_dependency());
    }

    #[test]
    fn test_circular_dependency_diagnostic_code() {
        let err = Error::circular_dependency(1);
        let code = err.code().map(|c| c.to_string());
        assert_eq!(
            code.as_deref(),
            Some("dagwalk::graph::circular_dependency")
        );
    }
}
