use bookshop::lifecycle::BookshopSystem;
use bookshop::model::{BookCreate, Item, UserCreate};
use order_engine::tracing::setup_tracing;
use order_engine::EngineConfig;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();

    info!("Starting bookshop");
    let system = BookshopSystem::with_config(EngineConfig::from_env());

    let span = tracing::info_span!("seeding");
    let (user_id, books) = async {
        let user_id = system
            .store
            .add_user(UserCreate {
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
            })
            .await?;

        let mut books = vec![];
        for (title, author, genre, stock) in [
            ("Dune", "Frank Herbert", "scifi", 10),
            ("Neuromancer", "William Gibson", "scifi", 4),
            ("Foundation", "Isaac Asimov", "scifi", 7),
            ("Emma", "Jane Austen", "classic", 3),
        ] {
            books.push(
                system
                    .store
                    .add_book(BookCreate::new(title, author, genre, stock))
                    .await?,
            );
        }
        Ok::<_, bookshop::store::StoreError>((user_id, books))
    }
    .instrument(span)
    .await?;

    info!(user = %user_id, books = books.len(), "Catalogue seeded");

    let span = tracing::info_span!("order_processing");
    let order = async {
        info!("Placing order");
        system
            .orders
            .create_order(
                user_id,
                vec![
                    Item::new(books[0], 2),
                    Item::new(books[3], 1),
                    Item::new(books[0], 1),
                ],
            )
            .await
    }
    .instrument(span)
    .await?;

    let order_id = order.id.ok_or("saved order has no id")?;
    info!(order = %order_id, items = order.items.len(), "Order placed");

    let suggestions = system.recommendations.recommend(&order.items).await;
    for book in &suggestions {
        info!(title = %book.title, genre = %book.genre, "Recommended");
    }

    let span = tracing::info_span!("order_update");
    let update = async {
        system
            .orders
            .update_order(order_id, vec![Item::new(books[0], 1), Item::new(books[1], 2)])
            .await
    }
    .instrument(span)
    .await;
    match update {
        Ok(order) => info!(order = %order_id, items = order.items.len(), "Order updated"),
        Err(e) => error!(error = %e, "Order update failed"),
    }

    // More copies than exist: rejected, stock untouched.
    if let Err(e) = system
        .orders
        .create_order(user_id, vec![Item::new(books[3], 50)])
        .await
    {
        info!(error = %e, shortfall = ?e.shortfall(), "Order rejected as expected");
    }

    system.orders.delete_order(order_id).await?;
    info!(order = %order_id, "Order deleted");

    system.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}
