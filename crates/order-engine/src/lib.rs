//! # Order Engine
//!
//! Building blocks for processing many concurrent requests that mutate an overlapping set of
//! shared records. The crate knows nothing about books or orders: it schedules keyed work
//! and guarantees that two pieces of work for the same key never run at the same time.
//!
//! ## Architecture Overview
//!
//! 1. **Exclusion** ([`ResourceLockRegistry`]) - one lock per key, created on demand and
//!    forgotten when no task holds or awaits it.
//! 2. **Execution** ([`WorkerPool`]) - a fixed number of workers draining a bounded queue.
//! 3. **Fan-out / fan-in** ([`TaskOrchestrator`]) - one job per item, joined under a timeout,
//!    failing fast on the first task error.
//!
//! ```rust
//! use order_engine::{ResourceKeyed, ResourceLockRegistry, TaskOrchestrator, WorkerPool};
//! use std::time::Duration;
//!
//! struct Withdrawal { account: u32, amount: u32 }
//!
//! impl ResourceKeyed for Withdrawal {
//!     type Key = u32;
//!     fn resource_key(&self) -> u32 { self.account }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let orchestrator = TaskOrchestrator::new(
//!         WorkerPool::new("accounts", 4, 64),
//!         ResourceLockRegistry::new(),
//!         Duration::from_secs(5),
//!     );
//!
//!     let batch = vec![
//!         Withdrawal { account: 1, amount: 10 },
//!         Withdrawal { account: 2, amount: 20 },
//!     ];
//!     let amounts = orchestrator
//!         .process_all(batch, |w: Withdrawal| async move { Ok::<_, String>(w.amount) })
//!         .await
//!         .unwrap();
//!     assert_eq!(amounts, vec![10, 20]);
//! }
//! ```
//!
//! ## Failure Model
//!
//! Batches are best effort. A failed or timed-out batch returns an error to the caller, but
//! work already applied by sibling tasks is left in place. Callers that need compensation
//! must drive it themselves.

pub mod config;
pub mod error;
pub mod lock_registry;
pub mod orchestrator;
pub mod pool;
pub mod tracing;

// Re-export core types for convenience
pub use config::EngineConfig;
pub use error::{BatchError, PoolError};
pub use lock_registry::{LockHandle, ResourceLockRegistry};
pub use orchestrator::{ResourceKeyed, TaskOrchestrator};
pub use pool::WorkerPool;
