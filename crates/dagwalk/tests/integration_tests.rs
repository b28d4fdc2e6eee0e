//! End-to-end tests across the graph store and the schedulers.

#![allow(clippy::unwrap_used)]

use dagwalk::{
    BoxError, DependencyGraph, FailurePolicy, GraphError, Job, PoolError, Status, Traversal,
    TraversalError, TraversalOptions, Visitor, WorkerPool, fixed_pool,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(10);

fn scenario() -> DependencyGraph<u32> {
    [
        (1, 5),
        (2, 5),
        (2, 6),
        (3, 6),
        (4, 6),
        (4, 7),
        (5, 8),
        (6, 8),
        (7, 8),
        (7, 9),
    ]
    .into_iter()
    .collect()
}

/// Runs every job immediately on the submitting thread.
struct InlinePool;

impl WorkerPool for InlinePool {
    fn submit(&self, job: Job) -> Result<(), PoolError> {
        job();
        Ok(())
    }
}

#[test]
fn test_scenario_structure() {
    let graph = scenario();

    assert_eq!(graph.roots(), HashSet::from([1, 2, 3, 4]));
    assert_eq!(graph.leaves(), HashSet::from([8, 9]));

    let levels = graph.levels().unwrap();
    assert_eq!(levels.len(), 3);
    assert_eq!(levels[0].iter().copied().collect::<HashSet<_>>(), HashSet::from([8, 9]));
    assert_eq!(levels[1].iter().copied().collect::<HashSet<_>>(), HashSet::from([5, 6, 7]));
    assert_eq!(levels[2].iter().copied().collect::<HashSet<_>>(), HashSet::from([1, 2, 3, 4]));
}

#[test]
fn test_inline_traversal_matches_sort_constraints() {
    let graph = scenario();
    let order = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&order);

    let traversal = Traversal::start(&graph, InlinePool, move |node: &u32| {
        sink.lock().push(*node);
        Ok::<_, BoxError>(())
    });

    // Every job ran during start
    assert_eq!(traversal.status(), Status::Done);
    let order = order.lock();
    for (parent, child) in graph.edges() {
        let parent_at = order.iter().position(|n| n == parent).unwrap();
        let child_at = order.iter().position(|n| n == child).unwrap();
        assert!(child_at < parent_at);
    }
}

#[test]
fn test_visitor_and_traversal_agree_on_coverage() {
    let graph = scenario();

    let visitor = Visitor::new(&graph);
    let visited = Mutex::new(HashSet::new());
    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                while let Some(node) = visitor.next() {
                    visited.lock().insert(node);
                    visitor.done(&node);
                }
            });
        }
    });

    let traversed = Arc::new(Mutex::new(HashSet::new()));
    let sink = Arc::clone(&traversed);
    let traversal = Traversal::start(&graph, fixed_pool(4).unwrap(), move |node: &u32| {
        sink.lock().insert(*node);
        Ok::<_, BoxError>(())
    });
    assert!(traversal.await_completion(TIMEOUT).unwrap());

    let all: HashSet<u32> = graph.nodes().copied().collect();
    assert_eq!(visited.into_inner(), all);
    assert_eq!(*traversed.lock(), all);
}

#[test]
fn test_cycle_reported_consistently() {
    let mut graph = scenario();
    graph.put_edge(9, 4);

    assert!(graph.sort().is_none());
    assert!(matches!(
        graph.descendants(&1),
        Err(GraphError::CircularDependency { .. })
    ));

    let report = graph.validate();
    assert!(!report.is_valid);
    let unresolved: HashSet<u32> = report.unresolved.iter().copied().collect();
    assert!(unresolved.is_superset(&HashSet::from([4, 7, 9])));

    let err = Traversal::start_with(
        &graph,
        InlinePool,
        |_: &u32| Ok::<_, BoxError>(()),
        TraversalOptions::new().with_acyclic_validation(true),
    )
    .unwrap_err();
    assert!(matches!(err, TraversalError::Graph(_)));

    // Breaking the cycle makes everything work again
    graph.remove_edge(&9, &4);
    let traversal = Traversal::start_with(
        &graph,
        InlinePool,
        |_: &u32| Ok::<_, BoxError>(()),
        TraversalOptions::new().with_acyclic_validation(true),
    )
    .unwrap();
    assert!(traversal.await_completion(Duration::ZERO).unwrap());
}

#[test]
fn test_options_from_config() {
    let options: TraversalOptions =
        serde_json::from_str(r#"{ "on_failure": "halt", "validate_acyclic": true }"#).unwrap();
    assert_eq!(options.on_failure, FailurePolicy::Halt);
    assert!(options.validate_acyclic);
}
