//! Release bookkeeping shared by [`Traversal`](crate::Traversal) and [`Visitor`](crate::Visitor).

use dagwalk_graph::DependencyGraph;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// A private snapshot of a graph that shrinks as nodes complete.
///
/// A node's remaining in-degree is its child count in the snapshot, so a
/// parent is ready exactly when its last child is released.
#[derive(Debug)]
pub(crate) struct Frontier<T> {
    graph: DependencyGraph<T>,
    parents: HashMap<T, HashSet<T>>,
}

impl<T> Frontier<T>
where
    T: Eq + Hash + Clone,
{
    pub(crate) fn new(graph: &DependencyGraph<T>) -> Self {
        let graph = graph.snapshot();
        let parents = graph
            .nodes()
            .map(|node| (node.clone(), graph.parents(node)))
            .collect();
        Self { graph, parents }
    }

    /// Nodes with nothing left to wait on, in snapshot order.
    pub(crate) fn ready(&self) -> Vec<T> {
        self.graph
            .nodes()
            .filter(|node| self.graph.out_degree(node) == 0)
            .cloned()
            .collect()
    }

    /// Mark `node` complete and return the parents it unblocked.
    ///
    /// Returns `None` if `node` was not pending.
    pub(crate) fn release(&mut self, node: &T) -> Option<Vec<T>> {
        if !self.graph.remove_node(node) {
            return None;
        }

        let unblocked = self
            .parents
            .get(node)
            .into_iter()
            .flatten()
            .filter(|parent| self.graph.contains(parent) && self.graph.out_degree(parent) == 0)
            .cloned()
            .collect();
        Some(unblocked)
    }

    /// Number of nodes not yet released.
    pub(crate) fn len(&self) -> usize {
        self.graph.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> DependencyGraph<&'static str> {
        [
            ("app", "left"),
            ("app", "right"),
            ("left", "base"),
            ("right", "base"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_ready_are_leaves() {
        let frontier = Frontier::new(&diamond());
        assert_eq!(frontier.ready(), vec!["base"]);
        assert_eq!(frontier.len(), 4);
    }

    #[test]
    fn test_release_unblocks_on_last_child() {
        let mut frontier = Frontier::new(&diamond());

        let mut unblocked = frontier.release(&"base").unwrap();
        unblocked.sort_unstable();
        assert_eq!(unblocked, vec!["left", "right"]);

        assert!(frontier.release(&"left").unwrap().is_empty());
        assert_eq!(frontier.release(&"right").unwrap(), vec!["app"]);
        assert!(frontier.release(&"app").unwrap().is_empty());
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_release_twice_is_rejected() {
        let mut frontier = Frontier::new(&diamond());
        assert!(frontier.release(&"base").is_some());
        assert!(frontier.release(&"base").is_none());
        assert!(frontier.release(&"missing").is_none());
    }

    #[test]
    fn test_snapshot_is_private() {
        let mut graph = diamond();
        let frontier = Frontier::new(&graph);
        graph.clear();
        assert_eq!(frontier.len(), 4);
    }
}
