//! Pull-based traversal for callers that drive their own threads.

use crate::frontier::Frontier;
use dagwalk_graph::DependencyGraph;
use parking_lot::{Condvar, Mutex};
use std::collections::{HashSet, VecDeque};
use std::hash::Hash;
use tracing::trace;

struct VisitState<T> {
    frontier: Frontier<T>,
    queue: VecDeque<T>,
    in_flight: HashSet<T>,
}

/// Hands out nodes in dependency order as their dependencies are marked done.
///
/// Share it by reference between worker threads: each worker calls
/// [`next`](Self::next), processes the node and reports back with
/// [`done`](Self::done).
///
/// ```
/// use dagwalk_graph::DependencyGraph;
/// use dagwalk_traversal::Visitor;
///
/// let graph: DependencyGraph<&str> = [("test", "build"), ("deploy", "test")].into_iter().collect();
/// let visitor = Visitor::new(&graph);
///
/// let mut order = Vec::new();
/// while let Some(step) = visitor.next() {
///     order.push(step);
///     visitor.done(&step);
/// }
/// assert_eq!(order, ["build", "test", "deploy"]);
/// ```
pub struct Visitor<T> {
    state: Mutex<VisitState<T>>,
    changed: Condvar,
}

impl<T> Visitor<T>
where
    T: Eq + Hash + Clone,
{
    /// Snapshot `graph` and queue its leaves.
    #[must_use]
    pub fn new(graph: &DependencyGraph<T>) -> Self {
        let frontier = Frontier::new(graph);
        let queue = frontier.ready().into();
        Self {
            state: Mutex::new(VisitState {
                frontier,
                queue,
                in_flight: HashSet::new(),
            }),
            changed: Condvar::new(),
        }
    }

    /// Take the next ready node, blocking while others are still in flight.
    ///
    /// Returns `None` once nothing is ready and nothing handed out is
    /// outstanding. On a cyclic graph that happens with
    /// [`remaining`](Self::remaining) still above zero.
    pub fn next(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(node) = state.queue.pop_front() {
                state.in_flight.insert(node.clone());
                return Some(node);
            }
            if state.in_flight.is_empty() {
                return None;
            }
            self.changed.wait(&mut state);
        }
    }

    /// Take the next ready node without blocking.
    pub fn try_next(&self) -> Option<T> {
        let mut state = self.state.lock();
        let node = state.queue.pop_front()?;
        state.in_flight.insert(node.clone());
        Some(node)
    }

    /// Mark a node handed out by [`next`](Self::next) as complete.
    ///
    /// Returns `false` if `node` was not outstanding.
    pub fn done(&self, node: &T) -> bool {
        let mut state = self.state.lock();
        if !state.in_flight.remove(node) {
            return false;
        }

        let unblocked = state.frontier.release(node).unwrap_or_default();
        trace!(unblocked = unblocked.len(), "Node done");
        state.queue.extend(unblocked);
        self.changed.notify_all();
        true
    }

    /// Number of nodes not yet marked done.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.state.lock().frontier.len()
    }
}
