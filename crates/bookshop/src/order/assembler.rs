use super::OrderError;
use crate::model::{Item, Order, User};
use crate::store::BookStore;
use std::sync::Arc;
use tracing::debug;

/// Turns a batch of reserved lines into a persisted order.
#[derive(Clone)]
pub struct OrderAssembler {
    store: Arc<dyn BookStore>,
}

impl OrderAssembler {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    /// Saves a new order for `user` owning `items`, stamped with the current time.
    ///
    /// The store assigns the order and line ids and links each line to the order in the
    /// same call. Only call this once every line's stock has been reserved.
    pub async fn assemble(&self, user: &User, items: Vec<Item>) -> Result<Order, OrderError> {
        let draft = Order::draft(user.id, items);
        debug!(user = %user.id, items = draft.items.len(), "Assembling order");
        Ok(self.store.save_order(draft).await?)
    }
}
