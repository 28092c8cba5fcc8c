//! # Recommendations
//!
//! After an order, suggests books from the genres of the ordered books: the first three
//! titles of each genre, alphabetically. Lookups run on their own small [`WorkerPool`] so
//! they never compete with stock work for workers.
//!
//! The join is lenient. A lookup that fails is logged and skipped, and when the timeout
//! elapses whatever has arrived is returned.

use crate::model::{Book, BookId, Item};
use crate::order::OrderError;
use crate::store::BookStore;
use order_engine::WorkerPool;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Titles suggested per ordered genre.
pub const PER_GENRE: usize = 3;

#[derive(Clone)]
pub struct RecommendationService {
    store: Arc<dyn BookStore>,
    pool: WorkerPool,
    timeout: Duration,
}

impl RecommendationService {
    pub fn new(store: Arc<dyn BookStore>, pool: WorkerPool, timeout: Duration) -> Self {
        Self {
            store,
            pool,
            timeout,
        }
    }

    /// Distinct suggestions for the books in `items`, grouped by ordered book.
    #[instrument(skip_all, fields(items = items.len()))]
    pub async fn recommend(&self, items: &[Item]) -> Vec<Book> {
        let mut seen = HashSet::new();
        let book_ids: Vec<BookId> = items
            .iter()
            .map(|item| item.book_id)
            .filter(|id| seen.insert(*id))
            .collect();
        if book_ids.is_empty() {
            return Vec::new();
        }

        let (results_tx, mut results_rx) = mpsc::channel(book_ids.len());
        for (index, book_id) in book_ids.iter().copied().enumerate() {
            let store = Arc::clone(&self.store);
            let results_tx = results_tx.clone();
            let submitted = self.pool.submit(async move {
                let result = same_genre(store.as_ref(), book_id).await;
                let _ = results_tx.send((index, book_id, result)).await;
            });
            if let Err(e) = submitted {
                warn!(book = %book_id, error = %e, "Recommendation lookup not submitted");
            }
        }
        drop(results_tx);

        let mut slots: Vec<Vec<Book>> = vec![Vec::new(); book_ids.len()];
        let gather = async {
            while let Some((index, book_id, result)) = results_rx.recv().await {
                match result {
                    Ok(books) => slots[index] = books,
                    Err(e) => warn!(book = %book_id, error = %e, "Recommendation lookup failed"),
                }
            }
        };
        if tokio::time::timeout(self.timeout, gather).await.is_err() {
            info!(budget = ?self.timeout, "Not all recommendations were processed");
        }

        let mut unique = HashSet::new();
        let recommendations: Vec<Book> = slots
            .into_iter()
            .flatten()
            .filter(|book| unique.insert(book.id))
            .collect();
        info!(count = recommendations.len(), "Recommendations ready");
        recommendations
    }
}

async fn same_genre(store: &dyn BookStore, book_id: BookId) -> Result<Vec<Book>, OrderError> {
    let book = store
        .load_book(book_id)
        .await?
        .ok_or(OrderError::BookNotFound(book_id))?;
    let books = store.books_by_genre(&book.genre, PER_GENRE).await?;
    debug!(book = %book_id, genre = %book.genre, found = books.len(), "Genre lookup done");
    Ok(books)
}
