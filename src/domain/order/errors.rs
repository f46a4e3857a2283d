use uuid::Uuid;

use crate::error::RpcError;
use crate::store::StoreError;

// ============================================================================
// Order Workflow Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order with id {0} not found")]
    NotFound(Uuid),

    #[error("Order items cannot be empty")]
    EmptyItems,

    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: Uuid, quantity: i32 },

    #[error("Product {0} was not returned by the product service")]
    UnknownProduct(Uuid),

    #[error("Page and limit must be positive")]
    InvalidPagination,

    /// Remote validation failed; the product service's own error passes
    /// through untouched.
    #[error(transparent)]
    Remote(#[from] RpcError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Boundary translation: everything crossing the bus becomes the structured
/// form. Storage internals are logged here and never leave the process.
impl From<OrderError> for RpcError {
    fn from(err: OrderError) -> Self {
        match &err {
            OrderError::Remote(remote) => remote.clone(),
            OrderError::NotFound(_) => RpcError::not_found(err.to_string()),
            OrderError::Store(inner) => {
                tracing::error!(error = %inner, "storage failure crossing the service boundary");
                RpcError::internal("internal storage error")
            }
            OrderError::EmptyItems
            | OrderError::InvalidQuantity { .. }
            | OrderError::UnknownProduct(_)
            | OrderError::InvalidPagination => RpcError::bad_request(err.to_string()),
        }
    }
}
