//! Grouping of nodes into levels that can run in parallel.

use crate::DependencyGraph;
use std::collections::HashMap;
use std::hash::Hash;

/// Groups of nodes that can execute in parallel.
///
/// Each inner vector contains nodes that have no dependencies on each other.
/// The outer vector is ordered by dependency level: every node in group N
/// depends only on nodes in groups before N.
pub type Levels<T> = Vec<Vec<T>>;

impl<T> DependencyGraph<T>
where
    T: Eq + Hash + Clone,
{
    /// Group nodes by dependency level.
    ///
    /// Level 0 holds the leaves; a node sits one level above the deepest of
    /// its dependencies. Returns `None` if the graph contains a cycle.
    #[must_use]
    pub fn levels(&self) -> Option<Levels<T>> {
        let sorted = self.topological_order().ok()?;

        let mut groups: Levels<T> = Vec::new();
        let mut assigned: HashMap<T, usize> = HashMap::with_capacity(sorted.len());

        for node in sorted {
            // Dependencies precede `node` in sorted order, so they are assigned
            let level = self
                .children_iter(&node)
                .filter_map(|child| assigned.get(child))
                .map(|&child_level| child_level + 1)
                .max()
                .unwrap_or(0);

            if level >= groups.len() {
                groups.resize_with(level + 1, Vec::new);
            }
            groups[level].push(node.clone());
            assigned.insert(node, level);
        }

        Some(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_empty_graph() {
        let graph: DependencyGraph<u32> = DependencyGraph::new();
        assert_eq!(graph.levels(), Some(vec![]));
    }

    #[test]
    fn test_levels_chain() {
        let graph: DependencyGraph<&str> =
            [("deploy", "test"), ("test", "build")].into_iter().collect();
        assert_eq!(
            graph.levels(),
            Some(vec![vec!["build"], vec!["test"], vec!["deploy"]])
        );
    }

    #[test]
    fn test_levels_diamond() {
        let graph: DependencyGraph<&str> = [
            ("app", "left"),
            ("app", "right"),
            ("left", "base"),
            ("right", "base"),
        ]
        .into_iter()
        .collect();

        let levels = graph.levels().unwrap();
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0], vec!["base"]);
        assert_eq!(levels[1].len(), 2);
        assert!(levels[1].contains(&"left"));
        assert!(levels[1].contains(&"right"));
        assert_eq!(levels[2], vec!["app"]);
    }

    #[test]
    fn test_levels_use_longest_path() {
        // "top" depends on a leaf directly and on a two-step chain
        let graph: DependencyGraph<&str> = [("top", "leaf"), ("top", "mid"), ("mid", "leaf")]
            .into_iter()
            .collect();
        let levels = graph.levels().unwrap();
        assert_eq!(levels, vec![vec!["leaf"], vec!["mid"], vec!["top"]]);
    }

    #[test]
    fn test_levels_cyclic_graph() {
        let graph: DependencyGraph<u32> = [(1, 2), (2, 1)].into_iter().collect();
        assert_eq!(graph.levels(), None);
    }
}
