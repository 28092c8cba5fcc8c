//! # Engine Errors
//!
//! Errors raised by the worker pool and by batch orchestration. Batch errors are generic over
//! the task error type so each domain keeps its own error enum for the first failing task.

use std::time::Duration;

/// Errors from submitting work to a [`WorkerPool`](crate::WorkerPool).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("Worker pool queue is full")]
    QueueFull,
    #[error("Worker pool is shut down")]
    Closed,
    #[error("Worker task failed: {0}")]
    WorkerFailed(String),
}

/// Outcome of a batch that did not fully succeed.
#[derive(Debug, thiserror::Error)]
pub enum BatchError<E> {
    /// The batch did not finish within its budget. Tasks still running are abandoned, not
    /// cancelled.
    #[error("Batch timed out after {0:?}")]
    Timeout(Duration),

    /// The first task failure observed, in completion order.
    #[error("Task failed: {0}")]
    Task(#[source] E),

    /// A task ended without reporting a result (it panicked or was dropped).
    #[error("Task ended without a result")]
    TaskLost,

    /// The pool refused a job.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl<E> BatchError<E> {
    /// Converts the task error type, keeping the other variants.
    pub fn map_task<F>(self, f: impl FnOnce(E) -> F) -> BatchError<F> {
        match self {
            BatchError::Timeout(budget) => BatchError::Timeout(budget),
            BatchError::Task(e) => BatchError::Task(f(e)),
            BatchError::TaskLost => BatchError::TaskLost,
            BatchError::Pool(e) => BatchError::Pool(e),
        }
    }
}
