use crate::model::BookId;
use crate::order::OrderService;
use crate::recommendation::RecommendationService;
use crate::store::{BookStore, StoreActor, StoreClient, UserDirectory};
use order_engine::{EngineConfig, PoolError, ResourceLockRegistry, TaskOrchestrator, WorkerPool};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Mailbox size of the store actor.
const STORE_BUFFER: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum ShutdownError {
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("Store task failed: {0}")]
    Store(String),
}

/// A running bookshop: store actor, order engine and the services on top.
///
/// # Example
///
/// ```ignore
/// let system = BookshopSystem::new();
///
/// let user = system.store.add_user(user_data).await?;
/// let book = system.store.add_book(book_data).await?;
/// let order = system.orders.create_order(user, vec![Item::new(book, 2)]).await?;
///
/// system.shutdown().await?;
/// ```
pub struct BookshopSystem {
    /// Seeding and direct reads.
    pub store: StoreClient,

    pub orders: OrderService,

    pub recommendations: RecommendationService,

    pub config: EngineConfig,

    order_pool: WorkerPool,
    recommendation_pool: WorkerPool,
    handles: Vec<JoinHandle<()>>,
}

impl BookshopSystem {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Starts the store actor and both pools sized from `config`.
    pub fn with_config(config: EngineConfig) -> Self {
        let (store_actor, store) = StoreActor::new(STORE_BUFFER);
        let store_handle = tokio::spawn(store_actor.run());

        let books: Arc<dyn BookStore> = Arc::new(store.clone());
        let users: Arc<dyn UserDirectory> = Arc::new(store.clone());

        let order_pool = WorkerPool::new("orders", config.workers, config.queue_capacity);
        let orchestrator = TaskOrchestrator::<BookId>::new(
            order_pool.clone(),
            ResourceLockRegistry::new(),
            config.batch_timeout(),
        );
        let orders = OrderService::new(
            Arc::clone(&books),
            users,
            orchestrator,
            config.request_timeout(),
        );

        let recommendation_pool = WorkerPool::new(
            "recommendations",
            config.recommendation_workers,
            config.queue_capacity,
        );
        let recommendations =
            RecommendationService::new(books, recommendation_pool.clone(), config.batch_timeout());

        info!(?config, "Bookshop started");

        Self {
            store,
            orders,
            recommendations,
            config,
            order_pool,
            recommendation_pool,
            handles: vec![store_handle],
        }
    }

    /// Drains both pools, then stops the store actor.
    pub async fn shutdown(self) -> Result<(), ShutdownError> {
        info!("Shutting down system...");

        self.order_pool.shutdown().await?;
        self.recommendation_pool.shutdown().await?;

        drop(self.orders);
        drop(self.recommendations);
        drop(self.store);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Store task failed: {:?}", e);
                return Err(ShutdownError::Store(e.to_string()));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}

impl Default for BookshopSystem {
    fn default() -> Self {
        Self::new()
    }
}
