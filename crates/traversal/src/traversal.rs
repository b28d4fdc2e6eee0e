//! Concurrent dependency-ordered traversal.
//!
//! A [`Traversal`] runs a work function once per node of a graph snapshot,
//! submitting a node to the pool only after every node it depends on has
//! completed. Leaves start first; each completion releases the node from the
//! snapshot and submits the parents that have nothing left to wait on.

use crate::frontier::Frontier;
use crate::{BoxError, Error, FailurePolicy, Result, TraversalOptions, WorkerPool};
use dagwalk_graph::DependencyGraph;
use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Bounds a node identifier needs to travel between worker threads.
///
/// Beyond equality and hashing, identifiers must be `Debug`: failures name
/// the node they happened on using its `Debug` rendering, see
/// [`Error::node`](crate::Error::node).
pub trait Node: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<T> Node for T where T: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

/// Lifecycle of a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Nodes are still being scheduled or executed.
    Running,
    /// Every node completed successfully.
    Done,
    /// A node failed; nothing new is scheduled.
    Failed,
}

impl Status {
    /// Returns true for `Done` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

type WorkFn<T> = dyn Fn(&T) -> std::result::Result<(), BoxError> + Send + Sync;

struct State<T> {
    frontier: Frontier<T>,
    status: Status,
    error: Option<Error>,
    cancel_requested: bool,
}

impl<T> State<T> {
    /// Keep the first failure. Returns true if the status changed.
    fn fail(&mut self, error: Error) -> bool {
        if self.status == Status::Running {
            warn!(error = %error, "Traversal failed");
            self.status = Status::Failed;
            self.error = Some(error);
            true
        } else {
            debug!(error = %error, "Discarding failure after traversal ended");
            false
        }
    }
}

struct Shared<T> {
    state: Mutex<State<T>>,
    changed: Condvar,
    work: Box<WorkFn<T>>,
    options: TraversalOptions,
    pool: Arc<dyn WorkerPool>,
    /// Ready nodes waiting to be handed to the pool.
    pending: Mutex<VecDeque<T>>,
}

thread_local! {
    /// Traversals this thread is currently submitting for.
    static DRAINING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks a traversal as draining on the current thread until dropped.
struct DrainGuard {
    key: usize,
}

impl DrainGuard {
    /// Returns `None` if the traversal is already draining on this thread.
    fn enter(key: usize) -> Option<Self> {
        DRAINING.with_borrow_mut(|draining| {
            if draining.contains(&key) {
                None
            } else {
                draining.push(key);
                Some(Self { key })
            }
        })
    }
}

impl Drop for DrainGuard {
    fn drop(&mut self) {
        DRAINING.with_borrow_mut(|draining| draining.retain(|&key| key != self.key));
    }
}

impl<T: Node> Shared<T> {
    /// Queue `nodes` and submit them unless this thread is already doing so.
    ///
    /// A pool may run a job on the submitting thread. Its completion then
    /// re-enters here, so re-entrant calls only extend the queue and the
    /// outermost call drains it, keeping the stack flat on long chains.
    fn submit_all(self: &Arc<Self>, nodes: Vec<T>) {
        self.pending.lock().extend(nodes);

        let Some(_drain) = DrainGuard::enter(Arc::as_ptr(self).addr()) else {
            return;
        };

        loop {
            let next = self.pending.lock().pop_front();
            let Some(node) = next else { break };

            if self.state.lock().status != Status::Running {
                self.pending.lock().clear();
                break;
            }

            trace!(node = ?node, "Submitting node");
            let shared = Arc::clone(self);
            let job_node = node.clone();
            if let Err(source) = self.pool.submit(Box::new(move || shared.run(&job_node))) {
                warn!(node = ?node, error = %source, "Worker pool rejected node");
                self.fail(Error::rejected(&node, source));
                self.pending.lock().clear();
                break;
            }
        }
    }

    fn run(self: &Arc<Self>, node: &T) {
        let halted = self.options.on_failure == FailurePolicy::Halt
            && self.state.lock().status == Status::Failed;
        let outcome = if halted {
            trace!(node = ?node, "Skipping node after failure");
            Ok(())
        } else {
            self.invoke(node)
        };

        let unblocked = {
            let mut state = self.state.lock();
            let released = state.frontier.release(node).unwrap_or_default();

            let mut finished = false;
            if let Err(error) = outcome {
                finished = state.fail(error);
            }
            if state.status == Status::Running && state.frontier.is_empty() {
                info!("Traversal complete");
                state.status = Status::Done;
                finished = true;
            }
            if finished {
                self.changed.notify_all();
            }

            if state.status != Status::Running {
                return;
            }
            released
        };

        self.submit_all(unblocked);
    }

    fn invoke(&self, node: &T) -> Result<()> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.work)(node))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(Error::node_work(node, source)),
            Err(payload) => Err(Error::node_panicked(node, panic_message(payload.as_ref()))),
        }
    }

    fn fail(&self, error: Error) {
        if self.state.lock().fail(error) {
            self.changed.notify_all();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}

trait Interrupt: Send + Sync {
    fn interrupt(&self);
}

impl<T: Send> Interrupt for Shared<T> {
    fn interrupt(&self) {
        self.state.lock().cancel_requested = true;
        self.changed.notify_all();
    }
}

/// Cancels a pending or future wait on a [`Traversal`].
///
/// One request cancels one wait. The traversal itself keeps running.
#[derive(Clone)]
pub struct CancelHandle {
    target: Arc<dyn Interrupt>,
}

impl CancelHandle {
    /// Wake the waiting thread with [`Error::Cancelled`].
    pub fn cancel(&self) {
        debug!("Cancelling traversal wait");
        self.target.interrupt();
    }
}

impl Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle").finish_non_exhaustive()
    }
}

/// A running traversal of a dependency graph.
///
/// The traversal owns a snapshot of the graph taken at start; later changes
/// to the caller's graph have no effect on it. Dropping the handle does not
/// stop jobs that are already queued.
///
/// ```
/// use dagwalk_graph::DependencyGraph;
/// use dagwalk_traversal::{Traversal, fixed_pool};
/// use std::time::Duration;
///
/// let graph: DependencyGraph<&str> = [("test", "build"), ("deploy", "test")].into_iter().collect();
/// let pool = fixed_pool(2).unwrap();
///
/// let traversal = Traversal::start(&graph, pool, |step: &&str| -> Result<(), std::io::Error> {
///     println!("running {step}");
///     Ok(())
/// });
/// assert!(traversal.await_completion(Duration::from_secs(5)).unwrap());
/// ```
pub struct Traversal<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Node> Traversal<T> {
    /// Start traversing `graph` with default options.
    pub fn start<P, F, E>(graph: &DependencyGraph<T>, pool: P, work: F) -> Self
    where
        P: WorkerPool + 'static,
        F: Fn(&T) -> std::result::Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        Self::launch(graph, pool, work, TraversalOptions::default())
    }

    /// Start traversing `graph` with explicit options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Graph`] if `options.validate_acyclic` is set and the
    /// graph contains a cycle.
    pub fn start_with<P, F, E>(
        graph: &DependencyGraph<T>,
        pool: P,
        work: F,
        options: TraversalOptions,
    ) -> Result<Self>
    where
        P: WorkerPool + 'static,
        F: Fn(&T) -> std::result::Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        if options.validate_acyclic {
            let report = graph.validate();
            if let Some(error) = report.errors.into_iter().next() {
                warn!(
                    unresolved = report.unresolved.len(),
                    "Refusing to traverse cyclic graph"
                );
                return Err(error.into());
            }
        }

        Ok(Self::launch(graph, pool, work, options))
    }

    fn launch<P, F, E>(
        graph: &DependencyGraph<T>,
        pool: P,
        work: F,
        options: TraversalOptions,
    ) -> Self
    where
        P: WorkerPool + 'static,
        F: Fn(&T) -> std::result::Result<(), E> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        let frontier = Frontier::new(graph);
        let ready = frontier.ready();
        let status = if ready.is_empty() {
            Status::Done
        } else {
            Status::Running
        };

        let work: Box<WorkFn<T>> = Box::new(move |node: &T| work(node).map_err(Into::into));
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                frontier,
                status,
                error: None,
                cancel_requested: false,
            }),
            changed: Condvar::new(),
            work,
            options,
            pool: Arc::new(pool),
            pending: Mutex::new(VecDeque::new()),
        });

        if ready.is_empty() {
            debug!(nodes = graph.len(), "No ready nodes, traversal complete");
        } else {
            debug!(
                nodes = graph.len(),
                ready = ready.len(),
                "Starting traversal"
            );
            shared.submit_all(ready);
        }

        Self { shared }
    }

    /// Block until the traversal ends or `timeout` elapses.
    ///
    /// Returns `Ok(true)` if every node completed and `Ok(false)` if a node
    /// failed or the timeout elapsed first. A zero timeout polls without
    /// blocking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if a [`CancelHandle`] interrupted the wait.
    pub fn await_completion(&self, timeout: Duration) -> Result<bool> {
        if timeout.is_zero() {
            return self.wait_until(Some(Instant::now()));
        }
        // An overflowing deadline is as good as none
        self.wait_until(Instant::now().checked_add(timeout))
    }

    /// Block until the traversal ends.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if a [`CancelHandle`] interrupted the wait.
    pub fn wait(&self) -> Result<bool> {
        self.wait_until(None)
    }

    fn wait_until(&self, deadline: Option<Instant>) -> Result<bool> {
        let mut state = self.shared.state.lock();
        loop {
            match state.status {
                Status::Done => return Ok(true),
                Status::Failed => return Ok(false),
                Status::Running => {}
            }

            if state.cancel_requested {
                state.cancel_requested = false;
                return Err(Error::Cancelled);
            }

            match deadline {
                Some(deadline) if Instant::now() >= deadline => return Ok(false),
                Some(deadline) => {
                    self.shared.changed.wait_until(&mut state, deadline);
                }
                None => self.shared.changed.wait(&mut state),
            }
        }
    }

    /// A handle that cancels waits on this traversal from another thread.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        let target: Arc<dyn Interrupt> = self.shared.clone();
        CancelHandle { target }
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> Status {
        self.shared.state.lock().status
    }

    /// Returns true once the traversal is `Done` or `Failed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Take the error that failed the traversal, if any.
    ///
    /// Only the first failure is kept; later ones are logged and dropped.
    pub fn take_error(&self) -> Option<Error> {
        self.shared.state.lock().error.take()
    }

    /// Number of nodes that have not completed yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.shared.state.lock().frontier.len()
    }
}

impl<T: Node> Debug for Traversal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("Traversal")
            .field("status", &state.status)
            .field("remaining", &state.frontier.len())
            .finish_non_exhaustive()
    }
}
