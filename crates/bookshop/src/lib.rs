//! # Bookshop
//!
//! Concurrent book ordering on top of [`order_engine`].
//!
//! - **[model]**: books, order lines, orders and users with type-safe ids.
//! - **[store]**: the storage traits and the in-memory [`StoreActor`](store::StoreActor).
//! - **[ledger]**: read-check-write stock operations for one book.
//! - **[order]**: normalization, reconciliation and the caller-facing
//!   [`OrderService`](order::OrderService).
//! - **[recommendation]**: same-genre suggestions after an order.
//! - **[lifecycle]**: [`BookshopSystem`](lifecycle::BookshopSystem), which wires it all
//!   together.
//!
//! Stock only changes inside an orchestrated batch, one task per book, each holding that
//! book's lock. Two orders competing for the last copies of a book are therefore decided
//! in lock order, and a book's stock never drops below zero.

pub mod ledger;
pub mod lifecycle;
pub mod model;
pub mod order;
pub mod recommendation;
pub mod store;
