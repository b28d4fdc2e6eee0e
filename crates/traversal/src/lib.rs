//! Concurrent traversal of dependency graphs.
//!
//! This crate schedules work over a [`DependencyGraph`](dagwalk_graph::DependencyGraph)
//! so that a node only runs once everything it depends on has finished.
//!
//! # Key Types
//!
//! - [`Traversal`]: Push-based scheduler that submits ready nodes to a [`WorkerPool`]
//! - [`Visitor`]: Pull-based ready queue for callers that manage their own threads
//! - [`TraversalOptions`]: Failure policy and up-front cycle validation
//! - [`Error`]: Work, panic, rejection and cancellation failures
//!
//! Node identifiers implement [`Node`]. Besides `Eq + Hash + Clone` and
//! being shareable across threads they must be `Debug`, since a failure
//! records the node it happened on as its `Debug` rendering.
//!
//! # Example
//!
//! ```
//! use dagwalk_graph::DependencyGraph;
//! use dagwalk_traversal::{Traversal, TraversalOptions, fixed_pool};
//! use std::time::Duration;
//!
//! let mut graph = DependencyGraph::new();
//! graph.put_all_edges("app", ["lib", "utils"]);
//! graph.put_edge("lib", "utils");
//!
//! let options = TraversalOptions::new().with_acyclic_validation(true);
//! let traversal = Traversal::start_with(&graph, fixed_pool(4)?, |_: &&str| Ok::<_, std::io::Error>(()), options)?;
//! assert!(traversal.await_completion(Duration::from_secs(5))?);
//! # Ok::<(), dagwalk_traversal::Error>(())
//! ```

mod error;
mod frontier;
mod options;
mod pool;
mod traversal;
mod visitor;

pub use error::{BoxError, Error, PoolError, Result};
pub use options::{FailurePolicy, TraversalOptions};
pub use pool::{Job, WorkerPool, fixed_pool};
pub use traversal::{CancelHandle, Node, Status, Traversal};
pub use visitor::Visitor;
