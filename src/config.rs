use std::time::Duration;

use anyhow::Context;

// ============================================================================
// Configuration - read once from the environment at startup
// ============================================================================

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub nats_url: String,
    /// Upper bound on the product validation round trip.
    pub rpc_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let nats_url = std::env::var("NATS_URL")
            .unwrap_or_else(|_| "nats://127.0.0.1:4222".to_string());

        let rpc_timeout = match std::env::var("PRODUCT_RPC_TIMEOUT_MS") {
            Ok(raw) => Duration::from_millis(
                raw.parse()
                    .context("PRODUCT_RPC_TIMEOUT_MS must be an integer")?,
            ),
            Err(_) => Duration::from_millis(5_000),
        };

        Ok(Self {
            database_url,
            nats_url,
            rpc_timeout,
        })
    }
}
