use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Order Domain Model
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub total_amount: Decimal,
    pub total_items: i32,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// An item row as persisted: quantity plus the price snapshotted from the
/// product service at creation time. Later remote price changes never alter
/// historical orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

// ============================================================================
// Requests and Views
// ============================================================================

/// Creation request. Clients only say what and how many; prices always come
/// from the product service.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<RequestedItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestedItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// What the store needs to persist a new order in one atomic write.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub total_amount: Decimal,
    pub total_items: i32,
    pub items: Vec<OrderItem>,
}

/// An order together with its stored item rows.
#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Presentation view: each item carries the product name fetched from the
/// remote product set. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedOrder {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<EnrichedItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrichedItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
    pub name: String,
}

/// Listing filter; `page` is 1-based.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderFilter {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            status: None,
        }
    }
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub total: i64,
    pub page: u32,
    pub last_page: i64,
}
