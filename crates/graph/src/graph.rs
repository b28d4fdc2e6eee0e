//! Dependency graph storage and structural queries.
//!
//! A [`DependencyGraph`] maps each node to the set of nodes it depends on
//! (its *children*). The inverse mapping (node to *parents*, the nodes that
//! depend on it) is kept alongside so parent lookups and node removal only
//! touch the edges incident to the node.

use crate::{Error, Result};
use indexmap::{IndexMap, IndexSet};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;
use tracing::{debug, trace};

/// A mutable directed graph of dependencies.
///
/// An edge `parent -> child` means "`parent` depends on `child` finishing
/// first". Nodes are opaque identifiers; cloning the graph copies the
/// structure, not the identifiers' referents.
///
/// Cycles are tolerated by every mutation. Only ordering and closure
/// queries look for them: [`sort`](Self::sort) and [`levels`](Self::levels)
/// return `None`, while [`ancestors`](Self::ancestors) and
/// [`descendants`](Self::descendants) return [`Error::CircularDependency`].
#[derive(Debug, Clone)]
pub struct DependencyGraph<T> {
    /// Node -> the nodes it depends on.
    children: IndexMap<T, IndexSet<T>>,
    /// Node -> the nodes that depend on it.
    parents: IndexMap<T, IndexSet<T>>,
}

impl<T> DependencyGraph<T>
where
    T: Eq + Hash + Clone,
{
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            children: IndexMap::new(),
            parents: IndexMap::new(),
        }
    }

    /// Build a graph from an adjacency mapping of node to dependencies.
    ///
    /// Each key becomes a node even when its dependency collection is empty.
    pub fn from_map<I, C>(map: I) -> Self
    where
        I: IntoIterator<Item = (T, C)>,
        C: IntoIterator<Item = T>,
    {
        let mut graph = Self::new();
        for (parent, children) in map {
            graph.put_all_edges(parent, children);
        }
        graph
    }

    /// Add a single node with no edges.
    ///
    /// Returns `true` if the node was not already present.
    pub fn add_node(&mut self, node: T) -> bool {
        if self.children.contains_key(&node) {
            return false;
        }
        self.parents.insert(node.clone(), IndexSet::new());
        self.children.insert(node, IndexSet::new());
        true
    }

    /// Add every node from `nodes`.
    ///
    /// Returns `true` if at least one node was added.
    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = T>) -> bool {
        nodes
            .into_iter()
            .fold(false, |changed, node| self.add_node(node) | changed)
    }

    /// Record that `parent` depends on `child`.
    ///
    /// Both nodes are added if absent. Returns `true` if the graph changed.
    pub fn put_edge(&mut self, parent: T, child: T) -> bool {
        let mut changed = self.add_node(parent.clone());
        changed |= self.add_node(child.clone());

        if let Some(children) = self.children.get_mut(&parent)
            && children.insert(child.clone())
        {
            if let Some(parents) = self.parents.get_mut(&child) {
                parents.insert(parent);
            }
            changed = true;
        }

        changed
    }

    /// Record that `parent` depends on every node in `children`.
    ///
    /// An empty `children` collection still adds `parent` as a node.
    /// Returns `true` if the graph changed.
    pub fn put_all_edges(&mut self, parent: T, children: impl IntoIterator<Item = T>) -> bool {
        let mut changed = self.add_node(parent.clone());
        for child in children {
            changed |= self.put_edge(parent.clone(), child);
        }
        changed
    }

    /// Remove a node and every edge touching it.
    ///
    /// The node's former children stay in the graph, possibly as orphans.
    /// Returns `true` if the node was present.
    pub fn remove_node(&mut self, node: &T) -> bool {
        let Some(children) = self.children.swap_remove(node) else {
            return false;
        };
        let parents = self.parents.swap_remove(node).unwrap_or_default();

        for child in &children {
            if let Some(set) = self.parents.get_mut(child) {
                set.swap_remove(node);
            }
        }
        for parent in &parents {
            if let Some(set) = self.children.get_mut(parent) {
                set.swap_remove(node);
            }
        }

        trace!(
            children = children.len(),
            parents = parents.len(),
            "Removed node from dependency graph"
        );
        true
    }

    /// Remove every node yielded by `nodes`.
    ///
    /// Returns `true` if at least one node was removed.
    pub fn remove_nodes<'a>(&mut self, nodes: impl IntoIterator<Item = &'a T>) -> bool
    where
        T: 'a,
    {
        nodes
            .into_iter()
            .fold(false, |changed, node| self.remove_node(node) | changed)
    }

    /// Keep only the nodes for which `keep` returns `true`.
    ///
    /// Returns `true` if any node was removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) -> bool {
        let doomed: Vec<T> = self
            .children
            .keys()
            .filter(|node| !keep(node))
            .cloned()
            .collect();
        self.remove_nodes(&doomed)
    }

    /// Remove the edge `parent -> child`, leaving both nodes in place.
    ///
    /// Returns `true` if the edge existed.
    pub fn remove_edge(&mut self, parent: &T, child: &T) -> bool {
        let removed = self
            .children
            .get_mut(parent)
            .is_some_and(|children| children.swap_remove(child));
        if removed && let Some(parents) = self.parents.get_mut(child) {
            parents.swap_remove(parent);
        }
        removed
    }

    /// Remove every node and edge.
    pub fn clear(&mut self) {
        self.children.clear();
        self.parents.clear();
    }

    /// Returns true if `node` is in the graph.
    #[must_use]
    pub fn contains(&self, node: &T) -> bool {
        self.children.contains_key(node)
    }

    /// Returns true if the edge `parent -> child` exists.
    #[must_use]
    pub fn contains_edge(&self, parent: &T, child: &T) -> bool {
        self.children
            .get(parent)
            .is_some_and(|children| children.contains(child))
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns true if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.children.values().map(IndexSet::len).sum()
    }

    /// Iterate over all nodes.
    ///
    /// The order is deterministic for a given sequence of mutations.
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.children.keys()
    }

    /// Iterate over all `(parent, child)` edges.
    pub fn edges(&self) -> impl Iterator<Item = (&T, &T)> {
        self.children
            .iter()
            .flat_map(|(parent, children)| children.iter().map(move |child| (parent, child)))
    }

    /// The nodes that depend on `node`. Empty if `node` is absent.
    #[must_use]
    pub fn parents(&self, node: &T) -> HashSet<T> {
        self.parents
            .get(node)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The nodes `node` depends on. Empty if `node` is absent.
    #[must_use]
    pub fn children(&self, node: &T) -> HashSet<T> {
        self.children
            .get(node)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of nodes depending on `node`.
    #[must_use]
    pub fn in_degree(&self, node: &T) -> usize {
        self.parents.get(node).map_or(0, IndexSet::len)
    }

    /// Number of nodes `node` depends on.
    #[must_use]
    pub fn out_degree(&self, node: &T) -> usize {
        self.children.get(node).map_or(0, IndexSet::len)
    }

    /// Nodes nothing depends on.
    #[must_use]
    pub fn roots(&self) -> HashSet<T> {
        self.ordered_roots().cloned().collect()
    }

    /// Nodes with no dependencies, immediately ready to run.
    #[must_use]
    pub fn leaves(&self) -> HashSet<T> {
        self.ordered_leaves().cloned().collect()
    }

    /// Every node that transitively depends on `node`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CircularDependency`] if the graph contains a cycle
    /// anywhere, not only on a path through `node`.
    pub fn ancestors(&self, node: &T) -> Result<HashSet<T>> {
        self.topological_order()?;
        Ok(Self::closure(node, &self.parents))
    }

    /// Every node that `node` transitively depends on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CircularDependency`] if the graph contains a cycle.
    pub fn descendants(&self, node: &T) -> Result<HashSet<T>> {
        self.topological_order()?;
        Ok(Self::closure(node, &self.children))
    }

    /// Order all nodes so that every node comes after everything it depends on.
    ///
    /// Returns `None` if the graph contains a cycle. Use this form to test for
    /// cycles cheaply; [`validate`](Self::validate) reports which nodes are stuck.
    #[must_use]
    pub fn sort(&self) -> Option<Vec<T>> {
        self.topological_order().ok()
    }

    /// Check if the graph has cycles.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        self.topological_order().is_err()
    }

    /// Create an independent copy of this graph.
    ///
    /// Mutating the copy never affects `self`, which lets concurrent
    /// consumers each own their view of the structure.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// The adjacency mapping of node to dependencies.
    ///
    /// `DependencyGraph::from_map(graph.to_map())` equals `graph`.
    #[must_use]
    pub fn to_map(&self) -> HashMap<T, HashSet<T>> {
        self.children
            .iter()
            .map(|(node, children)| (node.clone(), children.iter().cloned().collect()))
            .collect()
    }

    /// Export the structure as a petgraph graph with `parent -> child` edges.
    ///
    /// Node indices follow this graph's iteration order.
    #[must_use]
    pub fn to_petgraph(&self) -> DiGraph<T, ()> {
        let mut graph = DiGraph::with_capacity(self.len(), self.edge_count());
        let indices: HashMap<&T, NodeIndex> = self
            .nodes()
            .map(|node| (node, graph.add_node(node.clone())))
            .collect();

        for (parent, child) in self.edges() {
            graph.add_edge(indices[parent], indices[child], ());
        }

        graph
    }

    /// Roots in iteration order.
    pub(crate) fn ordered_roots(&self) -> impl Iterator<Item = &T> {
        self.parents
            .iter()
            .filter(|(_, parents)| parents.is_empty())
            .map(|(node, _)| node)
    }

    /// Leaves in iteration order.
    pub(crate) fn ordered_leaves(&self) -> impl Iterator<Item = &T> {
        self.children
            .iter()
            .filter(|(_, children)| children.is_empty())
            .map(|(node, _)| node)
    }

    /// Children of `node` in iteration order.
    pub(crate) fn children_iter(&self, node: &T) -> impl Iterator<Item = &T> {
        self.children.get(node).into_iter().flatten()
    }

    /// Kahn's algorithm, seeded from the roots.
    ///
    /// Nodes are emitted dependents-first while each child's remaining
    /// parent count is decremented; a child becomes ready once the count
    /// reaches zero. Nodes on a cycle, and everything a cycle depends on,
    /// are never emitted.
    pub(crate) fn kahn(&self) -> Vec<&T> {
        let mut remaining: HashMap<&T, usize> = self
            .parents
            .iter()
            .map(|(node, parents)| (node, parents.len()))
            .collect();
        let mut ready: VecDeque<&T> = self.ordered_roots().collect();
        let mut emitted: Vec<&T> = Vec::with_capacity(self.len());

        while let Some(node) = ready.pop_front() {
            emitted.push(node);
            for child in self.children_iter(node) {
                if let Some(count) = remaining.get_mut(child) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push_back(child);
                    }
                }
            }
        }

        emitted
    }

    /// Dependency-first order, or the number of nodes that could not be ordered.
    pub(crate) fn topological_order(&self) -> Result<Vec<T>> {
        let emitted = self.kahn();

        if emitted.len() < self.len() {
            let unresolved = self.len() - emitted.len();
            debug!(unresolved, "Dependency graph contains a cycle");
            return Err(Error::circular_dependency(unresolved));
        }

        Ok(emitted.into_iter().rev().cloned().collect())
    }

    /// Depth-first closure over `edges` starting at `start`, excluding `start`.
    fn closure(start: &T, edges: &IndexMap<T, IndexSet<T>>) -> HashSet<T> {
        let mut seen: HashSet<T> = HashSet::new();
        let mut stack: Vec<&T> = edges.get(start).into_iter().flatten().collect();

        while let Some(node) = stack.pop() {
            if seen.insert(node.clone()) {
                stack.extend(edges.get(node).into_iter().flatten());
            }
        }

        seen
    }
}

impl<T> Default for DependencyGraph<T>
where
    T: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PartialEq for DependencyGraph<T>
where
    T: Eq + Hash,
{
    fn eq(&self, other: &Self) -> bool {
        // IndexMap/IndexSet equality ignores insertion order.
        self.children == other.children
    }
}

impl<T> Eq for DependencyGraph<T> where T: Eq + Hash {}

impl<T> FromIterator<(T, T)> for DependencyGraph<T>
where
    T: Eq + Hash + Clone,
{
    fn from_iter<I: IntoIterator<Item = (T, T)>>(edges: I) -> Self {
        let mut graph = Self::new();
        graph.extend(edges);
        graph
    }
}

impl<T> Extend<(T, T)> for DependencyGraph<T>
where
    T: Eq + Hash + Clone,
{
    fn extend<I: IntoIterator<Item = (T, T)>>(&mut self, edges: I) {
        for (parent, child) in edges {
            self.put_edge(parent, child);
        }
    }
}
