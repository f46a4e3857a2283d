use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::messaging::{Product, ProductValidator};
use crate::store::OrderStore;

use super::errors::OrderError;
use super::model::{
    CreateOrderRequest, EnrichedItem, EnrichedOrder, NewOrder, Order, OrderDetail, OrderFilter,
    OrderItem, OrderStatus, PageMeta, Paginated, RequestedItem,
};

// ============================================================================
// Order Workflow Engine
// ============================================================================
//
// Orchestrates: remote product validation → totals → atomic persistence →
// name enrichment. The remote call always precedes the local write, so a
// failed or timed-out validation leaves the store untouched and no partial
// order ever exists.
//
// ============================================================================

pub struct OrderService<S, V> {
    store: Arc<S>,
    validator: Arc<V>,
}

impl<S, V> Clone for OrderService<S, V> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            validator: self.validator.clone(),
        }
    }
}

impl<S: OrderStore, V: ProductValidator> OrderService<S, V> {
    pub fn new(store: Arc<S>, validator: Arc<V>) -> Self {
        Self { store, validator }
    }

    /// Create an order from requested (product, quantity) pairs.
    ///
    /// One batched validation round trip covers every distinct product id;
    /// prices are snapshotted from the response and whatever the client may
    /// have sent is ignored. The order row and all item rows are written in
    /// a single transaction.
    pub async fn create(&self, request: CreateOrderRequest) -> Result<EnrichedOrder, OrderError> {
        validate_items(&request.items)?;

        let product_ids = distinct_ids(request.items.iter().map(|item| item.product_id));
        let products = index_by_id(self.validator.validate(&product_ids).await?);

        let mut total_amount = Decimal::ZERO;
        let mut total_items = 0i32;
        let mut items = Vec::with_capacity(request.items.len());

        for requested in &request.items {
            let product = products
                .get(&requested.product_id)
                .ok_or(OrderError::UnknownProduct(requested.product_id))?;

            total_amount += product.price * Decimal::from(requested.quantity);
            total_items += requested.quantity;
            items.push(OrderItem {
                product_id: requested.product_id,
                quantity: requested.quantity,
                price: product.price,
            });
        }

        let detail = self
            .store
            .create_order_with_items(NewOrder {
                total_amount,
                total_items,
                items,
            })
            .await?;

        tracing::info!(
            order_id = %detail.order.id,
            total_amount = %detail.order.total_amount,
            total_items = detail.order.total_items,
            "order created"
        );

        enrich(detail, &products)
    }

    /// Fetch one order with every item's product name merged in. Enrichment
    /// is mandatory: if the product service is down, the read fails even
    /// though the order row exists.
    pub async fn find_one(&self, id: Uuid) -> Result<EnrichedOrder, OrderError> {
        let detail = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(OrderError::NotFound(id))?;

        let product_ids = distinct_ids(detail.items.iter().map(|item| item.product_id));
        let products = index_by_id(self.validator.validate(&product_ids).await?);

        enrich(detail, &products)
    }

    /// Paginated listing. List views return bare order rows: no items, no
    /// enrichment.
    pub async fn find_all(&self, filter: OrderFilter) -> Result<Paginated<Order>, OrderError> {
        if filter.page == 0 || filter.limit == 0 {
            return Err(OrderError::InvalidPagination);
        }

        let total = self.store.count_by_status(filter.status).await?;
        let limit = i64::from(filter.limit);
        let last_page = (total + limit - 1) / limit;
        let skip = i64::from(filter.page - 1) * limit;

        let data = self.store.find_page(filter.status, skip, limit).await?;

        Ok(Paginated {
            data,
            meta: PageMeta {
                total,
                page: filter.page,
                last_page,
            },
        })
    }

    /// Change an order's status. Loads (and enriches) the order first, so
    /// not-found and remote failures surface exactly as in [`find_one`].
    /// Requesting the current status is a no-op and issues no write.
    pub async fn change_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<EnrichedOrder, OrderError> {
        let current = self.find_one(id).await?;

        if current.order.status == status {
            return Ok(current);
        }

        let updated = self.store.update_status(id, status).await?;

        tracing::info!(
            order_id = %id,
            from = %current.order.status,
            to = %status,
            "order status changed"
        );

        Ok(EnrichedOrder {
            order: updated,
            items: current.items,
        })
    }
}

fn validate_items(items: &[RequestedItem]) -> Result<(), OrderError> {
    if items.is_empty() {
        return Err(OrderError::EmptyItems);
    }

    for item in items {
        if item.quantity <= 0 {
            return Err(OrderError::InvalidQuantity {
                product_id: item.product_id,
                quantity: item.quantity,
            });
        }
    }

    Ok(())
}

/// Distinct ids in first-seen order. Requests are small, so a linear scan
/// beats hashing here.
fn distinct_ids(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let mut out = Vec::new();
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

fn index_by_id(products: Vec<Product>) -> HashMap<Uuid, Product> {
    products
        .into_iter()
        .map(|product| (product.id, product))
        .collect()
}

fn enrich(
    detail: OrderDetail,
    products: &HashMap<Uuid, Product>,
) -> Result<EnrichedOrder, OrderError> {
    let mut items = Vec::with_capacity(detail.items.len());

    for item in detail.items {
        let product = products
            .get(&item.product_id)
            .ok_or(OrderError::UnknownProduct(item.product_id))?;

        items.push(EnrichedItem {
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
            name: product.name.clone(),
        });
    }

    Ok(EnrichedOrder {
        order: detail.order,
        items,
    })
}

// ============================================================================
// Unit Tests
// ============================================================================
