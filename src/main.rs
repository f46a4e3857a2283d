use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod domain;
mod error;
mod messaging;
mod store;
mod transport;

use config::Config;
use domain::order::OrderService;
use messaging::NatsProductValidator;
use store::PostgresOrderStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Structured logging with environment-based filtering.
    // Default to INFO level, can be overridden with RUST_LOG.
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,orders_service=debug")),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Connecting to Postgres...");
    let store = Arc::new(PostgresOrderStore::connect(&config.database_url).await?);
    tracing::info!("Database connected");

    tracing::info!(url = %config.nats_url, "Connecting to NATS...");
    let client = async_nats::connect(&config.nats_url).await?;

    let validator = Arc::new(NatsProductValidator::new(
        client.clone(),
        config.rpc_timeout,
    ));
    let service = OrderService::new(store.clone(), validator);

    tokio::select! {
        result = transport::serve(client, service) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    store.close().await;

    Ok(())
}
