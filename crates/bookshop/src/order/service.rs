//! # Order Service
//!
//! The caller-facing entry points. Each request is normalized, its stock work fanned out
//! through the [`TaskOrchestrator`] (one task per book, under that book's lock), and the
//! order persisted only once every line succeeded.
//!
//! ## Budgets
//!
//! Every batch is bounded by the orchestrator's batch timeout. The whole request,
//! including user lookup and order assembly, is bounded by the request timeout. Either one
//! expiring yields [`OrderError::Timeout`]; work already applied stays applied.
//!
//! ## Phases
//!
//! ```text
//! create: Draft -> Reserving -> Committed | Failed
//! update: Committed -> Reconciling -> Committed | Failed
//! delete: Committed -> Restoring -> Deleted | Failed
//! ```
//!
//! The phase is carried on the log lines of each step.
//!
//! ## Failed updates
//!
//! An update runs two batches: removed lines first, then adjustments and new reservations.
//! When the second batch fails, the stored order keeps its previous lines minus the
//! removed ones, while sibling adjustments and reservations that succeeded stay applied to
//! stock. An adjusted line's stored quantity then no longer matches what was taken from
//! stock, and deleting the order later restores the stored quantity, not the adjusted one.

use super::assembler::OrderAssembler;
use super::normalizer::normalize;
use super::reconciliation::ReconciliationEngine;
use super::OrderError;
use crate::ledger::StockLedger;
use crate::model::{BookId, Item, Order, OrderId, OrderPhase, UserId};
use crate::store::{BookStore, UserDirectory};
use order_engine::{ResourceLockRegistry, TaskOrchestrator};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, field, info, instrument, warn};

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn BookStore>,
    users: Arc<dyn UserDirectory>,
    ledger: StockLedger,
    orchestrator: TaskOrchestrator<BookId>,
    assembler: OrderAssembler,
    reconciliation: ReconciliationEngine,
    /// Serializes updates and deletes of the same order.
    order_locks: ResourceLockRegistry<OrderId>,
    request_timeout: Duration,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn BookStore>,
        users: Arc<dyn UserDirectory>,
        orchestrator: TaskOrchestrator<BookId>,
        request_timeout: Duration,
    ) -> Self {
        let ledger = StockLedger::new(Arc::clone(&store));
        Self {
            assembler: OrderAssembler::new(Arc::clone(&store)),
            reconciliation: ReconciliationEngine::new(
                ledger.clone(),
                Arc::clone(&store),
                orchestrator.clone(),
            ),
            store,
            users,
            ledger,
            orchestrator,
            order_locks: ResourceLockRegistry::new(),
            request_timeout,
        }
    }

    /// Reserves stock for `items` and saves a new order for `user_id`.
    ///
    /// Lines for the same book are merged first. If any line fails, no order is saved, but
    /// lines reserved by sibling tasks keep their reservation.
    #[instrument(skip_all, fields(user = %user_id))]
    pub async fn create_order(
        &self,
        user_id: UserId,
        items: Vec<Item>,
    ) -> Result<Order, OrderError> {
        debug!(?items, "Received order request");
        self.within_budget(self.create(user_id, items)).await
    }

    /// Replaces the lines of an existing order with `items`.
    ///
    /// Books dropped from the order get their stock back, lines kept are adjusted by the
    /// difference, and new books are reserved. An empty `items` returns every line's stock
    /// and leaves the order with no lines.
    #[instrument(skip_all, fields(order = %order_id))]
    pub async fn update_order(
        &self,
        order_id: OrderId,
        items: Vec<Item>,
    ) -> Result<Order, OrderError> {
        debug!(?items, "Received update request");
        self.within_budget(self.update(order_id, items)).await
    }

    /// Returns every line's stock, then deletes the order and its lines.
    #[instrument(skip_all, fields(order = %order_id))]
    pub async fn delete_order(&self, order_id: OrderId) -> Result<(), OrderError> {
        self.within_budget(self.delete(order_id)).await
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, OrderError> {
        debug!("Loading order");
        self.load(order_id).await
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    async fn create(&self, user_id: UserId, items: Vec<Item>) -> Result<Order, OrderError> {
        if items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        let items = normalize(items)?;
        let user = self
            .users
            .load_user(user_id)
            .await?
            .ok_or(OrderError::UserNotFound(user_id))?;
        info!(phase = %OrderPhase::Draft, items = items.len(), "Order normalized");

        info!(phase = %OrderPhase::Reserving, "Reserving stock");
        let ledger = self.ledger.clone();
        let reserved = self
            .orchestrator
            .process_all(items, move |item: Item| {
                let ledger = ledger.clone();
                async move { ledger.reserve(item.book_id, item.quantity).await }
            })
            .await?;

        let order = self.assembler.assemble(&user, reserved).await?;
        info!(
            order = order.id.map(field::display),
            phase = %OrderPhase::Committed,
            items = order.items.len(),
            "Order committed"
        );
        Ok(order)
    }

    async fn update(&self, order_id: OrderId, items: Vec<Item>) -> Result<Order, OrderError> {
        let items = normalize(items)?;
        let _guard = self.order_locks.acquire(order_id).await;
        let mut order = self.load(order_id).await?;

        info!(phase = %OrderPhase::Reconciling, lines = items.len(), "Reconciling order");
        order.items = self.reconciliation.reconcile(&order, items).await?;

        let order = self.store.save_order(order).await?;
        info!(
            phase = %OrderPhase::Committed,
            items = order.items.len(),
            "Order updated"
        );
        Ok(order)
    }

    async fn delete(&self, order_id: OrderId) -> Result<(), OrderError> {
        let _guard = self.order_locks.acquire(order_id).await;
        let order = self.load(order_id).await?;

        info!(phase = %OrderPhase::Restoring, items = order.items.len(), "Restoring stock");
        self.reconciliation.release(order.items).await?;
        self.store.delete_order(order_id).await?;

        info!(phase = %OrderPhase::Deleted, "Order deleted");
        Ok(())
    }

    async fn load(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.store
            .load_order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))
    }

    /// Runs a request under the request timeout and logs its failure phase.
    async fn within_budget<T>(
        &self,
        request: impl Future<Output = Result<T, OrderError>>,
    ) -> Result<T, OrderError> {
        let outcome = match tokio::time::timeout(self.request_timeout, request).await {
            Ok(outcome) => outcome,
            Err(_) => Err(OrderError::Timeout(self.request_timeout)),
        };
        if let Err(e) = &outcome {
            warn!(phase = %OrderPhase::Failed, error = %e, "Order request failed");
        }
        outcome
    }
}

impl std::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService")
            .field("orchestrator", &self.orchestrator)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
