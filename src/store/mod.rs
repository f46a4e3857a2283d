use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::{NewOrder, Order, OrderDetail, OrderStatus, UnknownStatus};

pub mod postgres;

pub use postgres::PostgresOrderStore;

// ============================================================================
// Order Store Port
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    CorruptStatus(#[from] UnknownStatus),
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist the order row and every item row atomically: all visible
    /// together or not at all.
    async fn create_order_with_items(&self, order: NewOrder) -> Result<OrderDetail, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OrderDetail>, StoreError>;

    async fn count_by_status(&self, status: Option<OrderStatus>) -> Result<i64, StoreError>;

    /// Page slice under the same filter as [`count_by_status`], oldest first.
    async fn find_page(
        &self,
        status: Option<OrderStatus>,
        skip: i64,
        take: i64,
    ) -> Result<Vec<Order>, StoreError>;

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, StoreError>;
}
