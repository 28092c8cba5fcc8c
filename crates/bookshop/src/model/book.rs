use serde::{Deserialize, Serialize};

super::entity_id!(
    /// Type-safe identifier for Books.
    BookId,
    "book"
);

/// A title in the catalogue together with its sellable stock.
///
/// `stock` is the only field mutated while orders are processed, and only through the
/// [`StockLedger`](crate::ledger::StockLedger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub stock: u32,
}

impl Book {
    pub fn new(params: BookCreate, id: BookId) -> Self {
        Self {
            id,
            title: params.title,
            author: params.author,
            genre: params.genre,
            stock: params.stock,
        }
    }
}

/// DTO for adding a book to the catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookCreate {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub stock: u32,
}

impl BookCreate {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        genre: impl Into<String>,
        stock: u32,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            genre: genre.into(),
            stock,
        }
    }
}
