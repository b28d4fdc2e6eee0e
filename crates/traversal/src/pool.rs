//! Worker pool abstraction.
//!
//! A traversal never creates threads. It hands each ready node to a
//! [`WorkerPool`] as a boxed job; the job itself performs the completion
//! bookkeeping once the work function returns.

use crate::PoolError;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;

/// A unit of work submitted to a pool.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run jobs on other threads.
pub trait WorkerPool: Send + Sync {
    /// Queue `job` for execution.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError`] if the pool refuses the job. The job is dropped
    /// without running.
    fn submit(&self, job: Job) -> Result<(), PoolError>;
}

impl WorkerPool for ThreadPool {
    fn submit(&self, job: Job) -> Result<(), PoolError> {
        self.spawn(job);
        Ok(())
    }
}

impl<P: WorkerPool + ?Sized> WorkerPool for Arc<P> {
    fn submit(&self, job: Job) -> Result<(), PoolError> {
        (**self).submit(job)
    }
}

impl<P: WorkerPool + ?Sized> WorkerPool for &P {
    fn submit(&self, job: Job) -> Result<(), PoolError> {
        (**self).submit(job)
    }
}

/// Build a rayon pool with `threads` named worker threads.
///
/// `threads == 0` lets rayon pick the number of available cores.
///
/// # Errors
///
/// Returns [`PoolError::Build`] if the threads cannot be spawned.
pub fn fixed_pool(threads: usize) -> Result<ThreadPool, PoolError> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|index| format!("dagwalk-worker-{index}"))
        .build()?;
    tracing::debug!(threads = pool.current_num_threads(), "Built worker pool");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_fixed_pool_runs_jobs() {
        let pool = fixed_pool(2).unwrap();
        assert_eq!(pool.current_num_threads(), 2);

        let (tx, rx) = mpsc::channel();
        for i in 0..4 {
            let tx = tx.clone();
            pool.submit(Box::new(move || tx.send(i).unwrap())).unwrap();
        }
        drop(tx);

        let mut received: Vec<i32> = rx.iter().collect();
        received.sort_unstable();
        assert_eq!(received, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_worker_threads_are_named() {
        let pool = fixed_pool(1).unwrap();
        let (tx, rx) = mpsc::channel();
        pool.submit(Box::new(move || {
            let name = std::thread::current().name().map(str::to_owned);
            tx.send(name).unwrap();
        }))
        .unwrap();

        assert_eq!(rx.recv().unwrap().as_deref(), Some("dagwalk-worker-0"));
    }

    fn submit_via(pool: impl WorkerPool, job: Job) {
        pool.submit(job).unwrap();
    }

    #[test]
    fn test_forwarding_impls() {
        let pool = Arc::new(fixed_pool(1).unwrap());
        let (tx, rx) = mpsc::channel();

        let tx2 = tx.clone();
        submit_via(Arc::clone(&pool), Box::new(move || tx2.send("arc").unwrap()));
        submit_via(&*pool, Box::new(move || tx.send("ref").unwrap()));

        let mut received: Vec<&str> = rx.iter().take(2).collect();
        received.sort_unstable();
        assert_eq!(received, vec!["arc", "ref"]);
    }
}
