//! Dependency graph storage and ordering algorithms for dagwalk.
//!
//! This crate provides a mutable directed graph keyed by opaque, hashable
//! node identifiers, with the queries a scheduler needs: parents/children,
//! roots/leaves, ancestor/descendant closure, topological sort with cycle
//! detection, and grouping into parallel levels.
//!
//! # Key Types
//!
//! - [`DependencyGraph`]: The graph structure for building and querying dependencies
//! - [`ValidationResult`]: Report of the nodes that keep a graph from being ordered
//! - [`Error`]: Structural errors such as circular dependencies
//!
//! # Example
//!
//! ```
//! use dagwalk_graph::DependencyGraph;
//!
//! let mut graph = DependencyGraph::new();
//! graph.put_edge("test", "build");
//! graph.put_edge("deploy", "test");
//!
//! // Dependencies come first
//! assert_eq!(graph.sort(), Some(vec!["build", "test", "deploy"]));
//!
//! // Closing a cycle makes ordering impossible
//! graph.put_edge("build", "deploy");
//! assert!(graph.sort().is_none());
//! assert!(graph.ancestors(&"build").is_err());
//! ```

mod error;
mod graph;
mod levels;
mod validation;

pub use error::{Error, Result};
pub use graph::DependencyGraph;
pub use levels::Levels;
pub use validation::ValidationResult;
