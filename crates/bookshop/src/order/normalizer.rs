//! Folds a requested item list into at most one line per book.

use super::OrderError;
use crate::model::{BookId, Item};
use std::collections::HashMap;

/// Merges lines for the same book by summing their quantities.
///
/// Output lines are transient (no ids) and keep the order in which each book first
/// appears. An empty request normalizes to no lines.
///
/// # Errors
///
/// [`OrderError::InvalidQuantity`] for a zero quantity, or a sum that overflows.
pub fn normalize(items: Vec<Item>) -> Result<Vec<Item>, OrderError> {
    let mut positions: HashMap<BookId, usize> = HashMap::new();
    let mut merged: Vec<Item> = Vec::with_capacity(items.len());

    for item in items {
        if item.quantity == 0 {
            return Err(OrderError::InvalidQuantity {
                book: item.book_id,
                quantity: 0,
            });
        }
        match positions.get(&item.book_id) {
            Some(&index) => {
                let line = &mut merged[index];
                line.quantity = line.quantity.checked_add(item.quantity).ok_or(
                    OrderError::InvalidQuantity {
                        book: item.book_id,
                        quantity: item.quantity,
                    },
                )?;
            }
            None => {
                positions.insert(item.book_id, merged.len());
                merged.push(Item::new(item.book_id, item.quantity));
            }
        }
    }

    Ok(merged)
}
