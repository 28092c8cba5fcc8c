//! # Task Orchestrator
//!
//! Fans a batch of keyed items out onto the [`WorkerPool`] and joins the results.
//!
//! ## Per-task Protocol
//!
//! Every item becomes one job that:
//!
//! 1. acquires the item's lock from the [`ResourceLockRegistry`],
//! 2. runs the operation,
//! 3. drops the lock handle, which releases the mutex and lets the registry forget the key
//!    once nobody else uses it,
//! 4. reports its result to the batch.
//!
//! Items of one batch are expected to have distinct keys. Normalize requests before calling
//! [`TaskOrchestrator::process_all`], otherwise two tasks of the same batch queue on the same
//! lock.
//!
//! ## Join Semantics
//!
//! - The caller waits for all results or until the batch timeout elapses.
//! - The first failure observed is returned immediately as [`BatchError::Task`].
//! - Neither a timeout nor a failure cancels jobs already queued or running. Mutations they
//!   have applied, or still apply, stay in place: the orchestrator does not compensate.
//! - On success, outputs come back in the order of the input items.

use crate::error::BatchError;
use crate::lock_registry::ResourceLockRegistry;
use crate::pool::WorkerPool;
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Items that can be scheduled by the orchestrator expose the key they mutate.
pub trait ResourceKeyed {
    type Key: Eq + Hash + Clone + Display + Send + Sync + 'static;

    fn resource_key(&self) -> Self::Key;
}

/// Runs batches of keyed work on a bounded pool under per-key mutual exclusion.
pub struct TaskOrchestrator<K> {
    pool: WorkerPool,
    locks: ResourceLockRegistry<K>,
    batch_timeout: Duration,
}

impl<K> Clone for TaskOrchestrator<K> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            locks: self.locks.clone(),
            batch_timeout: self.batch_timeout,
        }
    }
}

impl<K> TaskOrchestrator<K>
where
    K: Eq + Hash + Clone + Display + Send + Sync + 'static,
{
    pub fn new(pool: WorkerPool, locks: ResourceLockRegistry<K>, batch_timeout: Duration) -> Self {
        Self {
            pool,
            locks,
            batch_timeout,
        }
    }

    pub fn locks(&self) -> &ResourceLockRegistry<K> {
        &self.locks
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn batch_timeout(&self) -> Duration {
        self.batch_timeout
    }

    /// Runs `operation` once per item, each under the lock of the item's key.
    ///
    /// # Errors
    ///
    /// - [`BatchError::Pool`] if a job could not be queued. Jobs queued before it still run.
    /// - [`BatchError::Task`] with the first failure observed.
    /// - [`BatchError::TaskLost`] if a job panicked before reporting.
    /// - [`BatchError::Timeout`] if the batch did not finish within the batch timeout.
    pub async fn process_all<I, O, E, F, Fut>(
        &self,
        items: Vec<I>,
        operation: F,
    ) -> Result<Vec<O>, BatchError<E>>
    where
        I: ResourceKeyed<Key = K> + Send + 'static,
        O: Send + 'static,
        E: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, E>> + Send + 'static,
    {
        let total = items.len();
        if total == 0 {
            return Ok(Vec::new());
        }
        debug!(pool = self.pool.name(), total, "Submitting batch");

        // Sized for every result so late tasks never wait on an abandoned batch.
        let (results_tx, results_rx) = mpsc::channel::<(usize, Result<O, E>)>(total);
        let operation = Arc::new(operation);

        for (index, item) in items.into_iter().enumerate() {
            let key = item.resource_key();
            let locks = self.locks.clone();
            let operation = Arc::clone(&operation);
            let results_tx = results_tx.clone();

            self.pool.submit(async move {
                let handle = locks.acquire(key).await;
                let result = (*operation)(item).await;
                drop(handle);
                // The batch may have stopped listening; the result is simply discarded.
                let _ = results_tx.send((index, result)).await;
            })?;
        }
        drop(results_tx);

        match tokio::time::timeout(self.batch_timeout, collect(total, results_rx)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    pool = self.pool.name(),
                    total,
                    budget = ?self.batch_timeout,
                    "Batch timed out"
                );
                Err(BatchError::Timeout(self.batch_timeout))
            }
        }
    }
}

impl<K> std::fmt::Debug for TaskOrchestrator<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskOrchestrator")
            .field("pool", &self.pool)
            .field("batch_timeout", &self.batch_timeout)
            .finish()
    }
}

async fn collect<O, E>(
    total: usize,
    mut results: mpsc::Receiver<(usize, Result<O, E>)>,
) -> Result<Vec<O>, BatchError<E>> {
    let mut slots: Vec<Option<O>> = (0..total).map(|_| None).collect();
    let mut received = 0;

    while received < total {
        match results.recv().await {
            Some((index, Ok(output))) => {
                slots[index] = Some(output);
                received += 1;
            }
            Some((index, Err(e))) => {
                debug!(index, "Task failed, abandoning batch");
                return Err(BatchError::Task(e));
            }
            // Every sender is gone but some task never reported.
            None => return Err(BatchError::TaskLost),
        }
    }

    Ok(slots.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone)]
    struct Work {
        key: u32,
        value: u32,
        delay_ms: u64,
    }

    impl ResourceKeyed for Work {
        type Key = u32;

        fn resource_key(&self) -> u32 {
            self.key
        }
    }

    fn work(key: u32, value: u32, delay_ms: u64) -> Work {
        Work {
            key,
            value,
            delay_ms,
        }
    }

    fn orchestrator(workers: usize, timeout_ms: u64) -> TaskOrchestrator<u32> {
        TaskOrchestrator::new(
            WorkerPool::new("orchestrator-test", workers, 64),
            ResourceLockRegistry::new(),
            Duration::from_millis(timeout_ms),
        )
    }

    #[tokio::test]
    async fn test_outputs_follow_input_order() {
        let orchestrator = orchestrator(4, 1_000);
        let items = vec![work(1, 10, 30), work(2, 20, 0), work(3, 30, 10)];

        let outputs = orchestrator
            .process_all(items, |w: Work| async move {
                tokio::time::sleep(Duration::from_millis(w.delay_ms)).await;
                Ok::<_, String>(w.value)
            })
            .await
            .unwrap();

        assert_eq!(outputs, vec![10, 20, 30]);
        assert!(orchestrator.locks().is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch_succeeds() {
        let orchestrator = orchestrator(1, 100);
        let outputs = orchestrator
            .process_all(Vec::<Work>::new(), |w: Work| async move { Ok::<_, String>(w.value) })
            .await
            .unwrap();
        assert!(outputs.is_empty());
    }

    #[tokio::test]
    async fn test_first_failure_is_surfaced() {
        let orchestrator = orchestrator(4, 1_000);
        let items = vec![work(1, 1, 0), work(2, 2, 0), work(3, 3, 0)];

        let result = orchestrator
            .process_all(items, |w: Work| async move {
                if w.key == 2 {
                    Err(format!("key {} failed", w.key))
                } else {
                    Ok(w.value)
                }
            })
            .await;

        match result {
            Err(BatchError::Task(msg)) => assert_eq!(msg, "key 2 failed"),
            other => panic!("Expected task failure, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_slow_batch_times_out_without_cancelling() {
        let orchestrator = orchestrator(2, 20);
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = finished.clone();

        let result = orchestrator
            .process_all(vec![work(1, 1, 100)], move |w: Work| {
                let counter = counter.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(w.delay_ms)).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(w.value)
                }
            })
            .await;

        assert!(matches!(result, Err(BatchError::Timeout(_))));

        // The abandoned task still runs to completion.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_same_key_across_batches_is_serialized() {
        let orchestrator = orchestrator(8, 2_000);
        let inside = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));

        let mut batches = vec![];
        for _ in 0..8 {
            let orchestrator = orchestrator.clone();
            let inside = inside.clone();
            let overlaps = overlaps.clone();
            batches.push(tokio::spawn(async move {
                orchestrator
                    .process_all(vec![work(7, 0, 5)], move |w: Work| {
                        let inside = inside.clone();
                        let overlaps = overlaps.clone();
                        async move {
                            if inside.fetch_add(1, Ordering::SeqCst) > 0 {
                                overlaps.fetch_add(1, Ordering::SeqCst);
                            }
                            tokio::time::sleep(Duration::from_millis(w.delay_ms)).await;
                            inside.fetch_sub(1, Ordering::SeqCst);
                            Ok::<_, String>(())
                        }
                    })
                    .await
            }));
        }
        for batch in batches {
            batch.await.unwrap().unwrap();
        }

        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_panicking_task_is_reported_as_lost() {
        let orchestrator = orchestrator(2, 1_000);

        let result = orchestrator
            .process_all(vec![work(1, 1, 0)], |w: Work| async move {
                if w.key == 1 {
                    panic!("task exploded");
                }
                Ok::<_, String>(w.value)
            })
            .await;
        assert!(matches!(result, Err(BatchError::TaskLost)));

        // The lock was released while unwinding and the pool still serves work.
        assert!(orchestrator.locks().is_empty());
        let outputs = orchestrator
            .process_all(vec![work(2, 5, 0)], |w: Work| async move { Ok::<_, String>(w.value) })
            .await
            .unwrap();
        assert_eq!(outputs, vec![5]);
    }
}
