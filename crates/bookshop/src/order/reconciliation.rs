//! # Reconciliation
//!
//! Brings an existing order's stock in line with a new set of requested lines, and returns
//! all of an order's stock when it is deleted.
//!
//! An update is split into a [`ReconciliationPlan`]:
//!
//! - lines whose book is no longer requested are **removed**: their stock is restored and
//!   the line deleted;
//! - every requested line becomes a [`ReconcileStep`]: an **adjust** of the existing line
//!   for that book, or a fresh **reserve**.
//!
//! Removals run as one orchestrated batch, steps as a second one. Every ledger call runs
//! under its book's lock. A failure stops the update but leaves earlier batches applied.

use super::OrderError;
use crate::ledger::StockLedger;
use crate::model::{BookId, Item, Order};
use crate::store::BookStore;
use order_engine::{ResourceKeyed, TaskOrchestrator};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Stock work for one requested line of an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileStep {
    /// The order already has a line for this book; move it to `quantity` copies.
    Adjust { existing: Item, quantity: u32 },
    /// A book new to the order.
    Reserve(Item),
}

impl ResourceKeyed for ReconcileStep {
    type Key = BookId;

    fn resource_key(&self) -> BookId {
        match self {
            ReconcileStep::Adjust { existing, .. } => existing.book_id,
            ReconcileStep::Reserve(item) => item.book_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconciliationPlan {
    pub removed: Vec<Item>,
    pub steps: Vec<ReconcileStep>,
}

impl ReconciliationPlan {
    /// Diffs an order's lines against normalized `requested` lines.
    pub fn new(existing: &[Item], requested: Vec<Item>) -> Self {
        let wanted: HashSet<BookId> = requested.iter().map(|item| item.book_id).collect();

        let removed = existing
            .iter()
            .filter(|item| !wanted.contains(&item.book_id))
            .cloned()
            .collect();

        let steps = requested
            .into_iter()
            .map(|item| {
                match existing.iter().find(|line| line.book_id == item.book_id) {
                    Some(line) => ReconcileStep::Adjust {
                        existing: line.clone(),
                        quantity: item.quantity,
                    },
                    None => ReconcileStep::Reserve(item),
                }
            })
            .collect();

        Self { removed, steps }
    }
}

#[derive(Clone)]
pub struct ReconciliationEngine {
    ledger: StockLedger,
    store: Arc<dyn BookStore>,
    orchestrator: TaskOrchestrator<BookId>,
}

impl ReconciliationEngine {
    pub fn new(
        ledger: StockLedger,
        store: Arc<dyn BookStore>,
        orchestrator: TaskOrchestrator<BookId>,
    ) -> Self {
        Self {
            ledger,
            store,
            orchestrator,
        }
    }

    /// Applies an update to `order`'s stock and returns the order's new lines.
    ///
    /// Adjusted lines keep their identity; reserved lines are transient until the order
    /// is saved.
    pub async fn reconcile(
        &self,
        order: &Order,
        requested: Vec<Item>,
    ) -> Result<Vec<Item>, OrderError> {
        let plan = ReconciliationPlan::new(&order.items, requested);
        debug!(
            removed = plan.removed.len(),
            steps = plan.steps.len(),
            "Reconciliation planned"
        );

        self.release(plan.removed).await?;

        let ledger = self.ledger.clone();
        let items = self
            .orchestrator
            .process_all(plan.steps, move |step: ReconcileStep| {
                let ledger = ledger.clone();
                async move { apply(&ledger, step).await }
            })
            .await?;
        Ok(items)
    }

    /// Restores every line's stock and deletes the line, one task per line.
    pub async fn release(&self, items: Vec<Item>) -> Result<(), OrderError> {
        let ledger = self.ledger.clone();
        let store = Arc::clone(&self.store);
        self.orchestrator
            .process_all(items, move |item: Item| {
                let ledger = ledger.clone();
                let store = Arc::clone(&store);
                async move {
                    ledger.restore(item.book_id, item.quantity).await?;
                    if let Some(id) = item.id {
                        store.delete_item(id).await?;
                    }
                    Ok::<_, OrderError>(())
                }
            })
            .await?;
        Ok(())
    }
}

async fn apply(ledger: &StockLedger, step: ReconcileStep) -> Result<Item, OrderError> {
    match step {
        ReconcileStep::Adjust { existing, quantity } => {
            ledger
                .adjust(existing.book_id, existing.quantity, quantity)
                .await?;
            Ok(Item {
                quantity,
                ..existing
            })
        }
        ReconcileStep::Reserve(item) => ledger.reserve(item.book_id, item.quantity).await,
    }
}
