//! Error types for traversals and worker pools.

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::fmt::Debug;
use thiserror::Error;

/// Result type for traversal operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by a work function.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures raised by a [`WorkerPool`](crate::WorkerPool).
#[derive(Error, Debug, Diagnostic)]
pub enum PoolError {
    /// The pool no longer accepts jobs.
    #[error("Worker pool is shut down")]
    #[diagnostic(
        code(dagwalk::pool::shutdown),
        help("Keep the pool alive until the traversal has completed")
    )]
    Shutdown,

    /// The pool could not be created.
    #[error("Failed to build worker pool: {0}")]
    #[diagnostic(code(dagwalk::pool::build))]
    Build(#[from] rayon::ThreadPoolBuildError),
}

/// Errors produced while running or waiting on a [`Traversal`](crate::Traversal).
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The work function returned an error for a node.
    #[error("Work failed for node {node}: {source}")]
    #[diagnostic(code(dagwalk::traversal::node_work))]
    NodeWork {
        /// Debug rendering of the node.
        node: String,
        /// What the work function returned.
        #[source]
        source: BoxError,
    },

    /// The work function panicked for a node.
    #[error("Work panicked for node {node}: {message}")]
    #[diagnostic(
        code(dagwalk::traversal::node_panicked),
        help("Return an error from the work function instead of panicking")
    )]
    NodePanicked {
        /// Debug rendering of the node.
        node: String,
        /// The panic payload, when it was a string.
        message: String,
    },

    /// The pool refused a job for a node.
    #[error("Worker pool rejected node {node}")]
    #[diagnostic(code(dagwalk::traversal::rejected))]
    Rejected {
        /// Debug rendering of the node.
        node: String,
        /// Why the pool refused the job.
        #[source]
        source: PoolError,
    },

    /// A wait was cancelled through a [`CancelHandle`](crate::CancelHandle).
    #[error("Wait for traversal was cancelled")]
    #[diagnostic(
        code(dagwalk::traversal::cancelled),
        help("The traversal keeps running; wait again to observe its outcome")
    )]
    Cancelled,

    /// A worker pool could not be set up.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Pool(#[from] PoolError),

    /// The graph could not be traversed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] dagwalk_graph::Error),
}

impl Error {
    /// Create a work failure for `node`.
    pub fn node_work(node: &impl Debug, source: impl Into<BoxError>) -> Self {
        Self::NodeWork {
            node: format!("{node:?}"),
            source: source.into(),
        }
    }

    /// Create a panic failure for `node`.
    pub fn node_panicked(node: &impl Debug, message: impl Into<String>) -> Self {
        Self::NodePanicked {
            node: format!("{node:?}"),
            message: message.into(),
        }
    }

    /// Create a rejected submission failure for `node`.
    pub fn rejected(node: &impl Debug, source: PoolError) -> Self {
        Self::Rejected {
            node: format!("{node:?}"),
            source,
        }
    }

    /// Returns true if this error reports a cancelled wait.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The node this error is about, if any.
    #[must_use]
    pub fn node(&self) -> Option<&str> {
        match self {
            Self::NodeWork { node, .. }
            | Self::NodePanicked { node, .. }
            | Self::Rejected { node, .. } => Some(node),
            Self::Cancelled | Self::Pool(_) | Self::Graph(_) => None,
        }
    }
}
