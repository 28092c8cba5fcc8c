//! # Storage
//!
//! The order flows reach persistent state only through two narrow traits, [`BookStore`] and
//! [`UserDirectory`]. The in-process implementation is a single [`StoreActor`] that owns
//! every table and serves requests one at a time; [`StoreClient`] is its cloneable handle.
//!
//! Nothing here enforces stock rules. A `save_book` is a blind write, so concurrent
//! read-modify-write sequences on one book must be serialized by the caller (the
//! [`StockLedger`](crate::ledger::StockLedger) runs under the per-book lock).

pub mod actor;
pub mod client;
pub mod message;

pub use actor::StoreActor;
pub use client::StoreClient;
pub use message::StoreRequest;

use crate::model::{Book, BookId, ItemId, Order, OrderId, User, UserId};
use async_trait::async_trait;

/// Errors talking to the store itself. Missing records are `Ok(None)`, not errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Store closed")]
    Closed,
    #[error("Store dropped response channel")]
    Dropped,
}

#[async_trait]
pub trait BookStore: Send + Sync {
    async fn load_book(&self, id: BookId) -> Result<Option<Book>, StoreError>;

    async fn save_book(&self, book: Book) -> Result<(), StoreError>;

    async fn load_order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Persists `order`, assigning ids to the order and any new lines, and linking every
    /// line to it. Returns the order as stored.
    async fn save_order(&self, order: Order) -> Result<Order, StoreError>;

    /// Removes the order and all of its lines. Unknown ids are ignored.
    async fn delete_order(&self, id: OrderId) -> Result<(), StoreError>;

    /// Detaches the line from its order and removes it. Unknown ids are ignored.
    async fn delete_item(&self, id: ItemId) -> Result<(), StoreError>;

    /// Up to `limit` books of `genre`, ordered by title.
    async fn books_by_genre(&self, genre: &str, limit: usize) -> Result<Vec<Book>, StoreError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn load_user(&self, id: UserId) -> Result<Option<User>, StoreError>;
}
