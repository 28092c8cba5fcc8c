//! Messages exchanged between [`StoreClient`](super::StoreClient) and
//! [`StoreActor`](super::StoreActor).

use crate::model::{Book, BookCreate, BookId, ItemId, Order, OrderId, User, UserCreate, UserId};
use tokio::sync::oneshot;

/// One-shot reply channel. The actor itself never fails a request.
pub type Response<T> = oneshot::Sender<T>;

#[derive(Debug)]
pub enum StoreRequest {
    AddBook {
        params: BookCreate,
        respond_to: Response<BookId>,
    },
    LoadBook {
        id: BookId,
        respond_to: Response<Option<Book>>,
    },
    SaveBook {
        book: Book,
        respond_to: Response<()>,
    },
    BooksByGenre {
        genre: String,
        limit: usize,
        respond_to: Response<Vec<Book>>,
    },
    LoadOrder {
        id: OrderId,
        respond_to: Response<Option<Order>>,
    },
    SaveOrder {
        order: Order,
        respond_to: Response<Order>,
    },
    DeleteOrder {
        id: OrderId,
        respond_to: Response<()>,
    },
    DeleteItem {
        id: ItemId,
        respond_to: Response<()>,
    },
    AddUser {
        params: UserCreate,
        respond_to: Response<UserId>,
    },
    LoadUser {
        id: UserId,
        respond_to: Response<Option<User>>,
    },
}
