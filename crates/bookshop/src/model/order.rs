use super::{BookId, Item, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

super::entity_id!(
    /// Type-safe identifier for Orders.
    OrderId,
    "order"
);

/// A user's order: the lines whose stock has been reserved on its behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// `None` until the order is first saved.
    pub id: Option<OrderId>,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub items: Vec<Item>,
}

impl Order {
    /// An unsaved order owning `items`.
    pub fn draft(user_id: UserId, items: Vec<Item>) -> Self {
        Self {
            id: None,
            user_id,
            created_at: Utc::now(),
            items,
        }
    }

    pub fn item_for(&self, book_id: BookId) -> Option<&Item> {
        self.items.iter().find(|item| item.book_id == book_id)
    }

    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// Where an order is in its lifecycle. Carried on log lines only; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderPhase {
    /// Request normalized, nothing reserved yet.
    Draft,
    /// Item tasks are reserving stock.
    Reserving,
    /// Order persisted with every line reserved.
    Committed,
    /// An update is restoring, adjusting and reserving lines.
    Reconciling,
    /// A delete is returning every line's stock.
    Restoring,
    Deleted,
    Failed,
}

impl Display for OrderPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
