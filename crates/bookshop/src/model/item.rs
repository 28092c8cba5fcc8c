use super::{BookId, OrderId};
use order_engine::ResourceKeyed;
use serde::{Deserialize, Serialize};

super::entity_id!(
    /// Type-safe identifier for persisted order lines.
    ItemId,
    "item"
);

/// One order line: a book and how many copies of it.
///
/// A requested line carries neither `id` nor `order_id`; both are set by the store when
/// the owning order is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: Option<ItemId>,
    pub book_id: BookId,
    pub quantity: u32,
    pub order_id: Option<OrderId>,
}

impl Item {
    /// A transient line, as submitted by a caller.
    pub fn new(book_id: BookId, quantity: u32) -> Self {
        Self {
            id: None,
            book_id,
            quantity,
            order_id: None,
        }
    }
}

/// Stock work for a line is serialized per book.
impl ResourceKeyed for Item {
    type Key = BookId;

    fn resource_key(&self) -> BookId {
        self.book_id
    }
}
