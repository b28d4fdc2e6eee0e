//! Dependency graphs with concurrent, dependency-ordered traversal.
//!
//! `dagwalk` bundles the graph store from [`dagwalk_graph`] with the
//! schedulers from [`dagwalk_traversal`]:
//!
//! - [`DependencyGraph`]: Mutable graph with sorting, closures and cycle detection
//! - [`Traversal`]: Runs a work function per node on a [`WorkerPool`], dependencies first
//! - [`Visitor`]: Pull-based ready queue for callers that drive their own threads
//!
//! # Example
//!
//! ```
//! use dagwalk::{DependencyGraph, Traversal, fixed_pool};
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//!
//! let mut graph = DependencyGraph::new();
//! graph.put_edge("test", "build");
//! graph.put_edge("deploy", "test");
//! assert_eq!(graph.sort(), Some(vec!["build", "test", "deploy"]));
//!
//! let log = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&log);
//! let traversal = Traversal::start(&graph, fixed_pool(2)?, move |step: &&str| {
//!     sink.lock().map_err(|e| e.to_string())?.push(*step);
//!     Ok::<_, String>(())
//! });
//!
//! assert!(traversal.await_completion(Duration::from_secs(5))?);
//! assert_eq!(*log.lock().unwrap(), ["build", "test", "deploy"]);
//! # Ok::<(), dagwalk::TraversalError>(())
//! ```

pub use dagwalk_graph as graph;
pub use dagwalk_traversal as traversal;

pub use dagwalk_graph::{DependencyGraph, Levels, ValidationResult};
pub use dagwalk_traversal::{
    BoxError, CancelHandle, FailurePolicy, Job, Node, PoolError, Status, Traversal,
    TraversalOptions, Visitor, WorkerPool, fixed_pool,
};

/// Errors raised by graph queries.
pub type GraphError = dagwalk_graph::Error;

/// Errors raised while running or waiting on a traversal.
pub type TraversalError = dagwalk_traversal::Error;
