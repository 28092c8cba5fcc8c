//! # Store Actor
//!
//! The in-memory tables behind [`StoreClient`]. The actor owns every table and processes
//! its mailbox sequentially, so no table needs a lock of its own.

use super::client::StoreClient;
use super::message::StoreRequest;
use crate::model::{Book, BookId, ItemId, Order, OrderId, User, UserId};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info};

pub struct StoreActor {
    receiver: mpsc::Receiver<StoreRequest>,
    books: HashMap<BookId, Book>,
    users: HashMap<UserId, User>,
    orders: HashMap<OrderId, Order>,
    /// Which order each persisted line belongs to.
    item_owners: HashMap<ItemId, OrderId>,
    next_book_id: u32,
    next_user_id: u32,
    next_order_id: u32,
    next_item_id: u32,
}

impl StoreActor {
    /// Creates the actor and its client.
    ///
    /// `buffer_size` bounds the mailbox; callers wait for space when it is full.
    pub fn new(buffer_size: usize) -> (Self, StoreClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            books: HashMap::new(),
            users: HashMap::new(),
            orders: HashMap::new(),
            item_owners: HashMap::new(),
            next_book_id: 1,
            next_user_id: 1,
            next_order_id: 1,
            next_item_id: 1,
        };
        (actor, StoreClient::new(sender))
    }

    /// Serves requests until every client has been dropped.
    pub async fn run(mut self) {
        info!("Store started");

        while let Some(msg) = self.receiver.recv().await {
            self.handle(msg);
        }

        info!(
            books = self.books.len(),
            orders = self.orders.len(),
            users = self.users.len(),
            "Store shutdown"
        );
    }

    fn handle(&mut self, msg: StoreRequest) {
        match msg {
            StoreRequest::AddBook { params, respond_to } => {
                let id = BookId(take_next(&mut self.next_book_id));
                let book = Book::new(params, id);
                info!(book = %id, title = %book.title, stock = book.stock, "Book added");
                self.books.insert(id, book);
                let _ = respond_to.send(id);
            }
            StoreRequest::LoadBook { id, respond_to } => {
                let book = self.books.get(&id).cloned();
                debug!(book = %id, found = book.is_some(), "Load book");
                let _ = respond_to.send(book);
            }
            StoreRequest::SaveBook { book, respond_to } => {
                debug!(book = %book.id, stock = book.stock, "Save book");
                self.books.insert(book.id, book);
                let _ = respond_to.send(());
            }
            StoreRequest::BooksByGenre {
                genre,
                limit,
                respond_to,
            } => {
                let mut books: Vec<Book> = self
                    .books
                    .values()
                    .filter(|book| book.genre == genre)
                    .cloned()
                    .collect();
                books.sort_by(|a, b| a.title.cmp(&b.title));
                books.truncate(limit);
                debug!(%genre, found = books.len(), "Books by genre");
                let _ = respond_to.send(books);
            }
            StoreRequest::LoadOrder { id, respond_to } => {
                let order = self.orders.get(&id).cloned();
                debug!(order = %id, found = order.is_some(), "Load order");
                let _ = respond_to.send(order);
            }
            StoreRequest::SaveOrder { order, respond_to } => {
                let saved = self.save_order(order);
                let _ = respond_to.send(saved);
            }
            StoreRequest::DeleteOrder { id, respond_to } => {
                if let Some(order) = self.orders.remove(&id) {
                    for item_id in order.items.iter().filter_map(|item| item.id) {
                        self.item_owners.remove(&item_id);
                    }
                    info!(order = %id, size = self.orders.len(), "Order deleted");
                }
                let _ = respond_to.send(());
            }
            StoreRequest::DeleteItem { id, respond_to } => {
                if let Some(order_id) = self.item_owners.remove(&id) {
                    if let Some(order) = self.orders.get_mut(&order_id) {
                        order.items.retain(|item| item.id != Some(id));
                    }
                    debug!(item = %id, order = %order_id, "Item deleted");
                }
                let _ = respond_to.send(());
            }
            StoreRequest::AddUser { params, respond_to } => {
                let id = UserId(take_next(&mut self.next_user_id));
                let user = User {
                    id,
                    name: params.name,
                    email: params.email,
                };
                info!(user = %id, name = %user.name, "User added");
                self.users.insert(id, user);
                let _ = respond_to.send(id);
            }
            StoreRequest::LoadUser { id, respond_to } => {
                let user = self.users.get(&id).cloned();
                debug!(user = %id, found = user.is_some(), "Load user");
                let _ = respond_to.send(user);
            }
        }
    }

    fn save_order(&mut self, mut order: Order) -> Order {
        let id = match order.id {
            Some(id) => id,
            None => {
                let id = OrderId(take_next(&mut self.next_order_id));
                order.id = Some(id);
                id
            }
        };

        // Lines dropped from the order since the last save are forgotten with it.
        if let Some(previous) = self.orders.get(&id) {
            for item_id in previous.items.iter().filter_map(|item| item.id) {
                self.item_owners.remove(&item_id);
            }
        }

        for item in &mut order.items {
            let item_id = match item.id {
                Some(item_id) => item_id,
                None => {
                    let item_id = ItemId(take_next(&mut self.next_item_id));
                    item.id = Some(item_id);
                    item_id
                }
            };
            item.order_id = Some(id);
            self.item_owners.insert(item_id, id);
        }

        info!(order = %id, items = order.items.len(), "Order saved");
        self.orders.insert(id, order.clone());
        order
    }
}

fn take_next(counter: &mut u32) -> u32 {
    let id = *counter;
    *counter += 1;
    id
}
