//! # Stock Ledger
//!
//! Read-check-write operations on a single book's stock.
//!
//! The ledger takes no locks. Each operation loads the book, validates, and saves it back
//! as three separate store calls, so callers must hold the book's lock from the
//! [`ResourceLockRegistry`](order_engine::ResourceLockRegistry) around every call. The
//! order flows get this for free by running ledger calls inside
//! [`TaskOrchestrator`](order_engine::TaskOrchestrator) batches.

use crate::model::{Book, BookId, Item};
use crate::order::OrderError;
use crate::store::BookStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct StockLedger {
    store: Arc<dyn BookStore>,
}

impl StockLedger {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    /// Takes `quantity` copies out of stock and returns a transient line for them.
    ///
    /// On [`OrderError::InsufficientStock`] nothing is written.
    pub async fn reserve(&self, book_id: BookId, quantity: u32) -> Result<Item, OrderError> {
        let mut book = self.load(book_id).await?;
        if book.stock < quantity {
            warn!(
                book = %book_id,
                requested = quantity,
                available = book.stock,
                "Insufficient stock"
            );
            return Err(insufficient(&book, quantity, book.stock));
        }

        book.stock -= quantity;
        let remaining = book.stock;
        self.store.save_book(book).await?;
        info!(book = %book_id, quantity, remaining, "Stock reserved");
        Ok(Item::new(book_id, quantity))
    }

    /// Puts `quantity` copies back into stock.
    ///
    /// Fails with [`OrderError::StockOverflow`] rather than clamp at `u32::MAX`.
    pub async fn restore(&self, book_id: BookId, quantity: u32) -> Result<(), OrderError> {
        let mut book = self.load(book_id).await?;
        book.stock = book
            .stock
            .checked_add(quantity)
            .ok_or(OrderError::StockOverflow {
                book: book_id,
                stock: book.stock,
                added: quantity,
            })?;
        let remaining = book.stock;
        self.store.save_book(book).await?;
        info!(book = %book_id, quantity, remaining, "Stock restored");
        Ok(())
    }

    /// Moves a line from `old_quantity` to `new_quantity` copies, charging or refunding
    /// the difference.
    ///
    /// Fails when the stock plus the copies already held cannot cover `new_quantity`.
    pub async fn adjust(
        &self,
        book_id: BookId,
        old_quantity: u32,
        new_quantity: u32,
    ) -> Result<(), OrderError> {
        let mut book = self.load(book_id).await?;
        // Widened so that stock plus the copies held cannot wrap.
        let available = u64::from(book.stock) + u64::from(old_quantity);
        if available < u64::from(new_quantity) {
            warn!(
                book = %book_id,
                old_quantity,
                new_quantity,
                available,
                "Insufficient stock for adjustment"
            );
            // Below `new_quantity`, so it fits in a u32.
            let available = u32::try_from(available).unwrap_or(u32::MAX);
            return Err(insufficient(&book, new_quantity, available));
        }

        let delta = i64::from(new_quantity) - i64::from(old_quantity);
        book.stock = u32::try_from(available - u64::from(new_quantity)).map_err(|_| {
            OrderError::StockOverflow {
                book: book_id,
                stock: book.stock,
                added: old_quantity - new_quantity,
            }
        })?;
        let remaining = book.stock;
        self.store.save_book(book).await?;
        info!(book = %book_id, delta, remaining, "Stock adjusted");
        Ok(())
    }

    /// Current stock of a book.
    pub async fn stock(&self, book_id: BookId) -> Result<u32, OrderError> {
        Ok(self.load(book_id).await?.stock)
    }

    async fn load(&self, book_id: BookId) -> Result<Book, OrderError> {
        debug!(book = %book_id, "Loading book");
        self.store
            .load_book(book_id)
            .await?
            .ok_or(OrderError::BookNotFound(book_id))
    }
}

fn insufficient(book: &Book, requested: u32, available: u32) -> OrderError {
    OrderError::InsufficientStock {
        book: book.id,
        title: book.title.clone(),
        requested,
        available,
    }
}
