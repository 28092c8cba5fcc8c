use bookshop::lifecycle::BookshopSystem;
use bookshop::model::{BookCreate, BookId, Item, OrderId, UserCreate, UserId};
use bookshop::order::OrderError;
use bookshop::store::BookStore;
use std::time::Duration;

async fn seed_user(system: &BookshopSystem) -> UserId {
    system
        .store
        .add_user(UserCreate {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        })
        .await
        .expect("Failed to create user")
}

async fn seed_book(system: &BookshopSystem, title: &str, stock: u32) -> BookId {
    system
        .store
        .add_book(BookCreate::new(title, "Anonymous", "fiction", stock))
        .await
        .expect("Failed to create book")
}

async fn stock(system: &BookshopSystem, id: BookId) -> u32 {
    system
        .store
        .load_book(id)
        .await
        .expect("Failed to load book")
        .expect("Book not found")
        .stock
}

fn quantities(items: &[Item]) -> Vec<(BookId, u32)> {
    let mut lines: Vec<_> = items.iter().map(|i| (i.book_id, i.quantity)).collect();
    lines.sort();
    lines
}

/// Full end-to-end flow through create, get, update and delete.
#[tokio::test]
async fn test_full_order_lifecycle() {
    let system = BookshopSystem::new();
    let user = seed_user(&system).await;
    let a = seed_book(&system, "A", 10).await;
    let b = seed_book(&system, "B", 5).await;

    // Duplicate lines are merged into one per book.
    let order = system
        .orders
        .create_order(user, vec![Item::new(a, 2), Item::new(b, 1), Item::new(a, 1)])
        .await
        .expect("Failed to create order");
    let order_id = order.id.expect("Saved order has an id");

    assert_eq!(order.user_id, user);
    assert_eq!(quantities(&order.items), vec![(a, 3), (b, 1)]);
    assert!(order.items.iter().all(|i| i.order_id == Some(order_id)));
    assert_eq!(stock(&system, a).await, 7);
    assert_eq!(stock(&system, b).await, 4);

    let fetched = system.orders.get_order(order_id).await.unwrap();
    assert_eq!(fetched, order);

    // Delete restores every line and removes the order.
    system.orders.delete_order(order_id).await.unwrap();
    assert_eq!(stock(&system, a).await, 10);
    assert_eq!(stock(&system, b).await, 5);
    assert_eq!(
        system.orders.get_order(order_id).await,
        Err(OrderError::OrderNotFound(order_id))
    );

    system.shutdown().await.expect("Shutdown failed");
}

#[tokio::test]
async fn test_update_removes_increases_and_adds_lines() {
    let system = BookshopSystem::new();
    let user = seed_user(&system).await;
    let a = seed_book(&system, "A", 10).await;
    let b = seed_book(&system, "B", 5).await;
    let c = seed_book(&system, "C", 2).await;

    let order = system
        .orders
        .create_order(user, vec![Item::new(a, 3), Item::new(b, 1)])
        .await
        .unwrap();
    let order_id = order.id.unwrap();
    let kept_line = order.item_for(a).and_then(|i| i.id);

    // Drop B, raise A from 3 to 5, add C.
    let updated = system
        .orders
        .update_order(order_id, vec![Item::new(a, 5), Item::new(c, 2)])
        .await
        .unwrap();

    assert_eq!(quantities(&updated.items), vec![(a, 5), (c, 2)]);
    assert_eq!(updated.item_for(a).and_then(|i| i.id), kept_line);
    assert_eq!(stock(&system, a).await, 5);
    assert_eq!(stock(&system, b).await, 5);
    assert_eq!(stock(&system, c).await, 0);

    let stored = system.orders.get_order(order_id).await.unwrap();
    assert_eq!(quantities(&stored.items), vec![(a, 5), (c, 2)]);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_update_fails_when_stock_plus_held_cannot_cover() {
    let system = BookshopSystem::new();
    let user = seed_user(&system).await;
    let a = seed_book(&system, "A", 4).await;

    let order = system
        .orders
        .create_order(user, vec![Item::new(a, 3)])
        .await
        .unwrap();
    let order_id = order.id.unwrap();

    // 1 in stock + 3 held < 5 requested.
    let err = system
        .orders
        .update_order(order_id, vec![Item::new(a, 5)])
        .await
        .unwrap_err();

    assert!(matches!(
        err.root_cause(),
        OrderError::InsufficientStock { requested: 5, available: 4, .. }
    ));
    assert_eq!(stock(&system, a).await, 1);
    let stored = system.orders.get_order(order_id).await.unwrap();
    assert_eq!(quantities(&stored.items), vec![(a, 3)]);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_update_with_no_lines_returns_all_stock() {
    let system = BookshopSystem::new();
    let user = seed_user(&system).await;
    let a = seed_book(&system, "A", 10).await;

    let order = system
        .orders
        .create_order(user, vec![Item::new(a, 3)])
        .await
        .unwrap();
    let order_id = order.id.unwrap();
    assert_eq!(stock(&system, a).await, 7);

    let updated = system.orders.update_order(order_id, vec![]).await.unwrap();

    assert!(updated.items.is_empty());
    assert_eq!(stock(&system, a).await, 10);
    let stored = system.orders.get_order(order_id).await.unwrap();
    assert!(stored.items.is_empty());

    // The order still exists and can take lines again.
    let refilled = system
        .orders
        .update_order(order_id, vec![Item::new(a, 2)])
        .await
        .unwrap();
    assert_eq!(quantities(&refilled.items), vec![(a, 2)]);
    assert_eq!(stock(&system, a).await, 8);

    system.shutdown().await.unwrap();
}

/// Removals run before adjustments, so a failing reservation does not undo them.
#[tokio::test]
async fn test_failed_update_keeps_earlier_restorations() {
    let system = BookshopSystem::new();
    let user = seed_user(&system).await;
    let a = seed_book(&system, "A", 10).await;
    let b = seed_book(&system, "B", 1).await;
    let c = seed_book(&system, "C", 7).await;

    let order = system
        .orders
        .create_order(user, vec![Item::new(a, 3), Item::new(c, 2)])
        .await
        .unwrap();
    let order_id = order.id.unwrap();
    assert_eq!(stock(&system, a).await, 7);
    assert_eq!(stock(&system, c).await, 5);

    // Drop C, raise A from 3 to 5, and ask for more B than exists.
    let err = system
        .orders
        .update_order(order_id, vec![Item::new(a, 5), Item::new(b, 100)])
        .await
        .unwrap_err();
    assert!(matches!(
        err.root_cause(),
        OrderError::InsufficientStock { book, .. } if *book == b
    ));

    // The A adjustment may finish after the batch has already failed.
    tokio::time::sleep(Duration::from_millis(50)).await;

    // C was restored and its line removed. A was charged for 5 but the stored line says 3.
    let stored = system.orders.get_order(order_id).await.unwrap();
    assert_eq!(quantities(&stored.items), vec![(a, 3)]);
    assert_eq!(stock(&system, a).await, 5);
    assert_eq!(stock(&system, b).await, 1);
    assert_eq!(stock(&system, c).await, 7);

    // Deleting returns the stored 3 copies, not the 5 taken.
    system.orders.delete_order(order_id).await.unwrap();
    assert_eq!(stock(&system, a).await, 8);
    assert_eq!(stock(&system, c).await, 7);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_over_reservation_leaves_stock_unchanged() {
    let system = BookshopSystem::new();
    let user = seed_user(&system).await;
    let a = seed_book(&system, "Dune", 2).await;

    let err = system
        .orders
        .create_order(user, vec![Item::new(a, 3)])
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::AggregateFailure(_)));
    assert_eq!(err.shortfall(), Some(1));
    assert!(err.to_string().contains("Insufficient stock for book: Dune"));
    assert_eq!(stock(&system, a).await, 2);

    system.shutdown().await.unwrap();
}

/// A failed order keeps the reservations its other lines already made.
#[tokio::test]
async fn test_partial_commit_is_observable() {
    let system = BookshopSystem::new();
    let user = seed_user(&system).await;
    let a = seed_book(&system, "A", 5).await;
    let b = seed_book(&system, "B", 1).await;

    let err = system
        .orders
        .create_order(user, vec![Item::new(a, 2), Item::new(b, 3)])
        .await
        .unwrap_err();
    assert!(matches!(
        err.root_cause(),
        OrderError::InsufficientStock { book, .. } if *book == b
    ));

    // The A task may finish after the batch has already failed.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(stock(&system, a).await, 3);
    assert_eq!(stock(&system, b).await, 1);
    assert_eq!(
        system.orders.get_order(OrderId(1)).await,
        Err(OrderError::OrderNotFound(OrderId(1)))
    );

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_rejected_requests() {
    let system = BookshopSystem::new();
    let user = seed_user(&system).await;
    let a = seed_book(&system, "A", 5).await;

    assert_eq!(
        system.orders.create_order(user, vec![]).await,
        Err(OrderError::EmptyOrder)
    );
    assert_eq!(
        system.orders.create_order(user, vec![Item::new(a, 0)]).await,
        Err(OrderError::InvalidQuantity { book: a, quantity: 0 })
    );
    assert_eq!(
        system
            .orders
            .create_order(UserId(42), vec![Item::new(a, 1)])
            .await,
        Err(OrderError::UserNotFound(UserId(42)))
    );
    assert_eq!(
        system.orders.update_order(OrderId(7), vec![Item::new(a, 1)]).await,
        Err(OrderError::OrderNotFound(OrderId(7)))
    );
    assert_eq!(
        system.orders.delete_order(OrderId(7)).await,
        Err(OrderError::OrderNotFound(OrderId(7)))
    );

    let err = system
        .orders
        .create_order(user, vec![Item::new(BookId(99), 1)])
        .await
        .unwrap_err();
    assert_eq!(err.root_cause(), &OrderError::BookNotFound(BookId(99)));

    assert_eq!(stock(&system, a).await, 5);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_recommendations_after_order() {
    let system = BookshopSystem::new();
    let user = seed_user(&system).await;
    let ordered = seed_book(&system, "Middle", 3).await;
    seed_book(&system, "Zebra", 3).await;
    seed_book(&system, "Apple", 3).await;
    seed_book(&system, "Banana", 3).await;

    let order = system
        .orders
        .create_order(user, vec![Item::new(ordered, 1)])
        .await
        .unwrap();
    let titles: Vec<String> = system
        .recommendations
        .recommend(&order.items)
        .await
        .into_iter()
        .map(|b| b.title)
        .collect();

    assert_eq!(titles, vec!["Apple", "Banana", "Middle"]);
    system.shutdown().await.unwrap();
}
