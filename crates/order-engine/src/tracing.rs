//! # Observability & Tracing
//!
//! Structured logging for the engine and the services built on it.
//!
//! ## What Gets Traced
//!
//! - **Pool lifecycle**: startup, rejected jobs, panicking jobs, shutdown
//! - **Batches**: submission size, first failure, timeouts
//! - **Stock operations**: every reserve, restore and adjust with the book id
//! - **Order flow**: the order phase (`Reserving`, `Committed`, ...) on each step
//!
//! ## Usage
//!
//! ```bash
//! # Outcomes only
//! RUST_LOG=info cargo run
//!
//! # Payloads, batch sizes, lock traffic
//! RUST_LOG=debug cargo run
//!
//! # Lock acquisition per key
//! RUST_LOG=order_engine=trace cargo run
//! ```
//!
//! With `RUST_LOG=info` an order looks like:
//!
//! ```text
//! INFO create_order: Stock reserved book=book_1 quantity=2 remaining=8
//! INFO create_order: Stock reserved book=book_2 quantity=1 remaining=4
//! INFO create_order: Order committed order=order_1 phase=Committed items=2
//! ```

/// Initializes the global subscriber, filtered by `RUST_LOG`.
///
/// Call once at process start. Module paths are hidden; the structured fields carry the
/// context instead.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
