//! # Store Client
//!
//! Cloneable handle to a running [`StoreActor`](super::StoreActor). Implements the storage
//! traits by forwarding each call as a [`StoreRequest`] and awaiting the one-shot reply.

use super::message::{Response, StoreRequest};
use super::{BookStore, StoreError, UserDirectory};
use crate::model::{Book, BookCreate, BookId, ItemId, Order, OrderId, User, UserCreate, UserId};
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct StoreClient {
    sender: mpsc::Sender<StoreRequest>,
}

impl StoreClient {
    pub fn new(sender: mpsc::Sender<StoreRequest>) -> Self {
        Self { sender }
    }

    async fn request<T: Send>(
        &self,
        make: impl FnOnce(Response<T>) -> StoreRequest + Send,
    ) -> Result<T, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(make(respond_to))
            .await
            .map_err(|_| StoreError::Closed)?;
        response.await.map_err(|_| StoreError::Dropped)
    }

    #[instrument(skip(self))]
    pub async fn add_book(&self, params: BookCreate) -> Result<BookId, StoreError> {
        debug!("Sending request");
        self.request(|respond_to| StoreRequest::AddBook { params, respond_to })
            .await
    }

    #[instrument(skip(self))]
    pub async fn add_user(&self, params: UserCreate) -> Result<UserId, StoreError> {
        debug!("Sending request");
        self.request(|respond_to| StoreRequest::AddUser { params, respond_to })
            .await
    }
}

#[async_trait]
impl BookStore for StoreClient {
    async fn load_book(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        self.request(|respond_to| StoreRequest::LoadBook { id, respond_to })
            .await
    }

    async fn save_book(&self, book: Book) -> Result<(), StoreError> {
        self.request(|respond_to| StoreRequest::SaveBook { book, respond_to })
            .await
    }

    async fn load_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        self.request(|respond_to| StoreRequest::LoadOrder { id, respond_to })
            .await
    }

    async fn save_order(&self, order: Order) -> Result<Order, StoreError> {
        self.request(|respond_to| StoreRequest::SaveOrder { order, respond_to })
            .await
    }

    async fn delete_order(&self, id: OrderId) -> Result<(), StoreError> {
        self.request(|respond_to| StoreRequest::DeleteOrder { id, respond_to })
            .await
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), StoreError> {
        self.request(|respond_to| StoreRequest::DeleteItem { id, respond_to })
            .await
    }

    async fn books_by_genre(&self, genre: &str, limit: usize) -> Result<Vec<Book>, StoreError> {
        let genre = genre.to_string();
        self.request(|respond_to| StoreRequest::BooksByGenre {
            genre,
            limit,
            respond_to,
        })
        .await
    }
}

#[async_trait]
impl UserDirectory for StoreClient {
    async fn load_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.request(|respond_to| StoreRequest::LoadUser { id, respond_to })
            .await
    }
}
