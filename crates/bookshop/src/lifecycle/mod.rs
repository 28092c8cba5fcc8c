//! # System Lifecycle
//!
//! Starting, wiring and stopping the bookshop. [`BookshopSystem`] owns the store actor and
//! both worker pools, and hands out the services built on them.
//!
//! ## Shutdown
//!
//! 1. Close both pools. Queued jobs still run; new submissions are refused.
//! 2. Drop every service and store client, which closes the store's mailbox.
//! 3. Await the store actor.
//!
//! Clones of [`StoreClient`](crate::store::StoreClient) held outside the system keep the
//! store alive, so drop them before calling
//! [`shutdown`](BookshopSystem::shutdown).

pub mod bookshop_system;

pub use bookshop_system::*;
