//! Order creation, update and deletion on top of the order engine.

pub mod assembler;
pub mod error;
pub mod normalizer;
pub mod reconciliation;
pub mod service;

pub use assembler::OrderAssembler;
pub use error::OrderError;
pub use normalizer::normalize;
pub use reconciliation::{ReconcileStep, ReconciliationEngine, ReconciliationPlan};
pub use service::OrderService;
