// region:    --- Imports
use crate::bidding::engine::AuctionBiddingEngine;
use crate::database::DatabaseManager;
use crate::handlers::AppState;
use crate::lifecycle::AuctionLifecycleService;
use crate::message_broker::{KafkaManager, AUCTION_EVENTS_TOPIC};
use crate::store::PostgresAuctionStore;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
mod auction;
mod bidding;
mod database;
mod handlers;
mod lifecycle;
mod message_broker;
mod scheduler;
mod store;

// endregion: --- Modules

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let db_manager = Arc::new(DatabaseManager::new().await?);

    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> database initialization failed: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> database ready", "Main");

    let kafka_manager = match KafkaManager::new() {
        Ok(manager) => manager,
        Err(e) => {
            error!("{:<12} --> Kafka initialization failed: {}", "Main", e);
            return Err(e.into());
        }
    };
    kafka_manager
        .create_topic(AUCTION_EVENTS_TOPIC, 5, 1)
        .await?;
    info!("{:<12} --> Kafka ready", "Main");

    let publisher = kafka_manager.get_producer();
    let store = Arc::new(PostgresAuctionStore::new(Arc::clone(&db_manager)));
    let engine = Arc::new(AuctionBiddingEngine::with_publisher(
        Arc::clone(&store),
        publisher.clone(),
    ));
    let lifecycle = Arc::new(AuctionLifecycleService::with_publisher(
        Arc::clone(&store),
        publisher,
    ));

    let status_scheduler = scheduler::AuctionScheduler::new(db_manager.get_pool());
    status_scheduler.start().await;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = AppState {
        engine,
        lifecycle,
        store,
    };

    let routes_all = Router::new()
        .route("/bid", post(handlers::handle_bid))
        .route(
            "/auctions",
            get(handlers::handle_list_auctions).post(handlers::handle_create_listing),
        )
        .route("/auctions/:id", get(handlers::handle_get_auction))
        .route("/auctions/:id/bids", get(handlers::handle_get_bids))
        .route(
            "/auctions/:id/time-left",
            get(handlers::handle_get_time_left),
        )
        .route(
            "/auctions/:id/conclude",
            post(handlers::handle_conclude_auction),
        )
        .layer(cors)
        .with_state(state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
