//! # Bounded Worker Pool
//!
//! A fixed number of worker tasks draining one bounded job queue. The number of jobs running
//! at once never exceeds the worker count, no matter how many requests submit work.
//!
//! ## Submission
//!
//! [`WorkerPool::submit`] never waits. If the queue is full the job is handed back as
//! [`PoolError::QueueFull`]; if the pool was shut down it fails with [`PoolError::Closed`].
//!
//! ## Panics
//!
//! Each job runs in its own Tokio task awaited by the worker, so a panicking job is logged
//! and the worker keeps serving the queue.
//!
//! ## Shutdown
//!
//! [`WorkerPool::shutdown`] refuses new jobs, lets the workers finish everything already
//! queued, and waits for them to exit.

use crate::error::PoolError;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A unit of work accepted by the pool.
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

enum Command {
    Run(Job),
    Stop,
}

/// Cheap handle for submitting jobs. Clones share the same queue and workers.
#[derive(Clone)]
pub struct WorkerPool {
    name: &'static str,
    worker_count: usize,
    sender: mpsc::Sender<Command>,
    closed: Arc<AtomicBool>,
    workers: Arc<std::sync::Mutex<Vec<JoinHandle<()>>>>,
}

impl WorkerPool {
    /// Spawns `workers` worker tasks sharing a queue of `queue_capacity` jobs.
    ///
    /// Must be called from inside a Tokio runtime.
    pub fn new(name: &'static str, workers: usize, queue_capacity: usize) -> Self {
        let workers = workers.max(1);
        let (sender, receiver) = mpsc::channel::<Command>(queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        let handles = (0..workers)
            .map(|worker| tokio::spawn(run_worker(name, worker, Arc::clone(&receiver))))
            .collect();

        info!(pool = name, workers, queue_capacity, "Worker pool started");
        Self {
            name,
            worker_count: workers,
            sender,
            closed: Arc::new(AtomicBool::new(false)),
            workers: Arc::new(std::sync::Mutex::new(handles)),
        }
    }

    /// Queues a job without waiting for space.
    pub fn submit<F>(&self, job: F) -> Result<(), PoolError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.closed.load(Ordering::Acquire) {
            return Err(PoolError::Closed);
        }
        self.sender
            .try_send(Command::Run(Box::pin(job)))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    warn!(pool = self.name, "Queue full, job rejected");
                    PoolError::QueueFull
                }
                mpsc::error::TrySendError::Closed(_) => PoolError::Closed,
            })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of worker tasks serving this pool.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stops accepting jobs, lets the workers finish what is already queued, and waits for
    /// every worker to exit.
    ///
    /// Shutdown applies to every clone of the pool. Calling it again is a no-op.
    pub async fn shutdown(&self) -> Result<(), PoolError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        info!(pool = self.name, "Shutting down worker pool...");

        let handles = match self.workers.lock() {
            Ok(mut workers) => std::mem::take(&mut *workers),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };

        // One stop marker per worker, queued behind the pending jobs.
        for _ in 0..handles.len() {
            if self.sender.send(Command::Stop).await.is_err() {
                break;
            }
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(pool = self.name, error = %e, "Worker task failed");
                return Err(PoolError::WorkerFailed(e.to_string()));
            }
        }
        info!(pool = self.name, "Worker pool stopped");
        Ok(())
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.name)
            .field("workers", &self.worker_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

async fn run_worker(
    pool: &'static str,
    worker: usize,
    queue: Arc<Mutex<mpsc::Receiver<Command>>>,
) {
    debug!(pool, worker, "Worker started");
    loop {
        // Hold the receiver only while waiting for the next command.
        let command = queue.lock().await.recv().await;
        let job = match command {
            Some(Command::Run(job)) => job,
            Some(Command::Stop) | None => break,
        };

        if let Err(e) = tokio::spawn(job).await {
            warn!(pool, worker, error = %e, "Job panicked");
        }
    }
    debug!(pool, worker, "Worker stopped");
}
