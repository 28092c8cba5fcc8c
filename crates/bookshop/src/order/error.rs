use crate::model::{BookId, OrderId, UserId};
use crate::store::StoreError;
use order_engine::{BatchError, PoolError};
use std::time::Duration;
use thiserror::Error;

/// Everything an order request can fail with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("Book not found: {0}")]
    BookNotFound(BookId),

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Insufficient stock for book: {title} (requested {requested}, available {available})")]
    InsufficientStock {
        book: BookId,
        title: String,
        requested: u32,
        available: u32,
    },

    #[error("Stock of {book} cannot hold {stock} + {added} copies")]
    StockOverflow { book: BookId, stock: u32, added: u32 },

    #[error("Invalid quantity {quantity} for {book}")]
    InvalidQuantity { book: BookId, quantity: u32 },

    #[error("Order has no items")]
    EmptyOrder,

    #[error("Order processing timed out after {0:?}")]
    Timeout(Duration),

    /// An item task failed; the first failure observed is kept.
    #[error("Order processing failed: {0}")]
    AggregateFailure(#[source] Box<OrderError>),

    #[error("Order rejected: worker queue is full")]
    Rejected,

    #[error("Order engine is shut down")]
    PoolClosed,

    #[error("Item task ended without a result")]
    TaskLost,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OrderError {
    /// The innermost error, looking through [`OrderError::AggregateFailure`].
    pub fn root_cause(&self) -> &OrderError {
        match self {
            OrderError::AggregateFailure(inner) => inner.root_cause(),
            other => other,
        }
    }

    /// Copies missing for the failing book, if this is a stock failure.
    pub fn shortfall(&self) -> Option<u32> {
        match self.root_cause() {
            OrderError::InsufficientStock {
                requested,
                available,
                ..
            } => Some(requested.saturating_sub(*available)),
            _ => None,
        }
    }
}

impl From<BatchError<OrderError>> for OrderError {
    fn from(e: BatchError<OrderError>) -> Self {
        match e {
            BatchError::Timeout(budget) => OrderError::Timeout(budget),
            BatchError::Task(cause) => OrderError::AggregateFailure(Box::new(cause)),
            BatchError::TaskLost => OrderError::TaskLost,
            BatchError::Pool(PoolError::QueueFull) => OrderError::Rejected,
            BatchError::Pool(PoolError::Closed | PoolError::WorkerFailed(_)) => {
                OrderError::PoolClosed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insufficient() -> OrderError {
        OrderError::InsufficientStock {
            book: BookId(1),
            title: "Dune".to_string(),
            requested: 5,
            available: 3,
        }
    }

    #[test]
    fn test_root_cause_unwraps_aggregate() {
        let err = OrderError::from(BatchError::Task(insufficient()));

        assert!(matches!(err, OrderError::AggregateFailure(_)));
        assert_eq!(err.root_cause(), &insufficient());
        assert_eq!(err.shortfall(), Some(2));
        assert!(err.to_string().contains("Insufficient stock for book: Dune"));
    }

    #[test]
    fn test_batch_errors_map_to_order_errors() {
        let budget = Duration::from_millis(5);
        assert_eq!(
            OrderError::from(BatchError::Timeout(budget)),
            OrderError::Timeout(budget)
        );
        assert_eq!(
            OrderError::from(BatchError::Pool(PoolError::QueueFull)),
            OrderError::Rejected
        );
        assert_eq!(
            OrderError::from(BatchError::<OrderError>::TaskLost),
            OrderError::TaskLost
        );
        assert_eq!(OrderError::EmptyOrder.shortfall(), None);
    }
}
