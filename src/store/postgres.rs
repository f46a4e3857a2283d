use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::order::{NewOrder, Order, OrderDetail, OrderItem, OrderStatus};

use super::{OrderStore, StoreError};

// ============================================================================
// Postgres Order Store
// ============================================================================

const CREATE_ORDERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS orders (
    id UUID PRIMARY KEY,
    total_amount NUMERIC NOT NULL,
    total_items INTEGER NOT NULL,
    status TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
)";

const CREATE_ORDER_ITEMS_TABLE: &str = "CREATE TABLE IF NOT EXISTS order_items (
    order_id UUID NOT NULL REFERENCES orders (id),
    product_id UUID NOT NULL,
    quantity INTEGER NOT NULL,
    price NUMERIC NOT NULL
)";

const ORDER_COLUMNS: &str = "id, total_amount, total_items, status, created_at";

/// Owns the connection pool. Construct with [`connect`](Self::connect) at
/// startup, pass into the service, and call [`close`](Self::close) on
/// shutdown; nothing here connects implicitly.
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;

        sqlx::query(CREATE_ORDERS_TABLE).execute(&pool).await?;
        sqlx::query(CREATE_ORDER_ITEMS_TABLE).execute(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    total_amount: Decimal,
    total_items: i32,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, StoreError> {
        Ok(Order {
            id: row.id,
            total_amount: row.total_amount,
            total_items: row.total_items,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    product_id: Uuid,
    quantity: i32,
    price: Decimal,
}

impl From<ItemRow> for OrderItem {
    fn from(row: ItemRow) -> Self {
        OrderItem {
            product_id: row.product_id,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn create_order_with_items(&self, order: NewOrder) -> Result<OrderDetail, StoreError> {
        let id = Uuid::new_v4();
        let status = OrderStatus::Pending;
        let created_at = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (id, total_amount, total_items, status, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(order.total_amount)
        .bind(order.total_items)
        .bind(status.as_str())
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, price) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(order_id = %id, items = order.items.len(), "order persisted");

        Ok(OrderDetail {
            order: Order {
                id,
                total_amount: order.total_amount,
                total_items: order.total_items,
                status,
                created_at,
            },
            items: order.items,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OrderDetail>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let order = Order::try_from(row)?;

        let items = sqlx::query_as::<_, ItemRow>(
            "SELECT product_id, quantity, price FROM order_items WHERE order_id = $1",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

        Ok(Some(OrderDetail { order, items }))
    }

    async fn count_by_status(&self, status: Option<OrderStatus>) -> Result<i64, StoreError> {
        let count = match status {
            Some(status) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = $1")
                    .bind(status.as_str())
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM orders")
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        Ok(count)
    }

    async fn find_page(
        &self,
        status: Option<OrderStatus>,
        skip: i64,
        take: i64,
    ) -> Result<Vec<Order>, StoreError> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, OrderRow>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders WHERE status = $1 \
                     ORDER BY created_at, id OFFSET $2 LIMIT $3"
                ))
                .bind(status.as_str())
                .bind(skip)
                .bind(take)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, OrderRow>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders \
                     ORDER BY created_at, id OFFSET $1 LIMIT $2"
                ))
                .bind(skip)
                .bind(take)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET status = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Order::try_from(row)
    }
}
