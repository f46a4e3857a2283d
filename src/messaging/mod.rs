use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RpcError;

pub mod nats;

pub use nats::NatsProductValidator;

// ============================================================================
// Product Validation Port
// ============================================================================

/// Product record as the remote product service returns it. Ephemeral:
/// fetched per request, never persisted or cached locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
}

/// Asks the product service which of the given ids exist, and at what price
/// and name. One batched round trip for the whole id set.
#[async_trait]
pub trait ProductValidator: Send + Sync {
    async fn validate(&self, product_ids: &[Uuid]) -> Result<Vec<Product>, RpcError>;
}
