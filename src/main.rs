use actix::prelude::*;
use actix_web::web;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fruitmart_orders::actors::ReceiptActor;
use fruitmart_orders::config::{AppConfig, StoreBackend};
use fruitmart_orders::domain::order::{OrderCommandHandler, OrderEvent, OrderProjection};
use fruitmart_orders::event_sourcing::{EventStore, InMemoryEventStore, ScyllaEventStore};
use fruitmart_orders::metrics::{self, Metrics};
use fruitmart_orders::receipts::TextReceiptGenerator;
use fruitmart_orders::service::OrderService;
use fruitmart_orders::utils::RetryConfig;
use fruitmart_orders::api;

#[actix::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,fruitmart_orders=debug"))
        )
        .init();

    tracing::info!("🚀 Starting FruitMart order service");

    let config = AppConfig::from_env()?;
    tracing::debug!(?config, "Configuration loaded");

    // === 1. Initialize Prometheus metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 2. Event store ===
    let store = open_event_store(&config).await?;

    // === 3. Rebuild the read model ===
    let projection = Arc::new(OrderProjection::new());
    let restored = projection.rebuild(store.as_ref()).await?;
    tracing::info!("📚 Projection rebuilt with {} orders", restored);

    // === 4. Receipt actor ===
    let receipts = ReceiptActor::new(
        Arc::new(TextReceiptGenerator::default()),
        RetryConfig::for_receipts(config.receipt_max_attempts),
        metrics.clone(),
    )
    .with_capacity(config.receipt_archive_capacity, config.receipt_dead_letter_capacity)
    .start();

    // === 5. Order service ===
    let service = web::Data::new(OrderService::new(
        OrderCommandHandler::new(store, metrics.clone()),
        projection,
        receipts,
        metrics.clone(),
    ));

    // === 6. Serve API and metrics side by side ===
    let api_server = api::start_api_server(service, config.host, config.port);
    let metrics_server = metrics::start_metrics_server(
        metrics.registry().clone(),
        config.host.to_string(),
        config.metrics_port,
    );
    tokio::try_join!(api_server, metrics_server)?;

    tracing::info!("👋 Shut down cleanly");
    Ok(())
}

async fn open_event_store(config: &AppConfig) -> anyhow::Result<Arc<dyn EventStore<OrderEvent>>> {
    match config.store {
        StoreBackend::Memory => {
            tracing::info!("🧠 Using in-memory event store");
            Ok(Arc::new(InMemoryEventStore::<OrderEvent>::new()))
        }
        StoreBackend::Scylla => {
            tracing::info!(nodes = ?config.scylla.nodes, "Connecting to ScyllaDB...");
            let session: Session = SessionBuilder::new()
                .known_nodes(&config.scylla.nodes)
                .build()
                .await?;

            let store = ScyllaEventStore::<OrderEvent>::new(
                Arc::new(session),
                &config.scylla.keyspace,
                "Order",
                "order_events",
            );
            store.ensure_schema(&config.scylla.keyspace).await?;
            tracing::info!("✅ Connected to ScyllaDB keyspace {}", config.scylla.keyspace);
            Ok(Arc::new(store))
        }
    }
}
