use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RpcError;

use super::{Product, ProductValidator};

// ============================================================================
// NATS Product Validator - request/reply over the bus
// ============================================================================

pub const VALIDATE_PRODUCTS_SUBJECT: &str = "products.validate";

pub struct NatsProductValidator {
    client: async_nats::Client,
    subject: String,
    timeout: Duration,
}

impl NatsProductValidator {
    pub fn new(client: async_nats::Client, timeout: Duration) -> Self {
        Self {
            client,
            subject: VALIDATE_PRODUCTS_SUBJECT.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl ProductValidator for NatsProductValidator {
    async fn validate(&self, product_ids: &[Uuid]) -> Result<Vec<Product>, RpcError> {
        let payload = serde_json::to_vec(product_ids)
            .map_err(|e| RpcError::internal(format!("failed to encode product ids: {e}")))?;

        let request = self.client.request(self.subject.clone(), payload.into());
        let response = match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(message)) => message,
            Ok(Err(e)) => {
                tracing::error!(
                    error = %e,
                    subject = %self.subject,
                    "product validation request failed"
                );
                return Err(RpcError::unavailable(format!(
                    "product service unreachable: {e}"
                )));
            }
            Err(_) => {
                tracing::error!(
                    subject = %self.subject,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "product validation timed out"
                );
                return Err(RpcError::unavailable("product validation timed out"));
            }
        };

        decode_reply(&response.payload)
    }
}

/// The product service replies with either the matched product records or
/// its own structured `{status, message}` error, which passes through to
/// our caller verbatim.
fn decode_reply(payload: &[u8]) -> Result<Vec<Product>, RpcError> {
    if let Ok(products) = serde_json::from_slice::<Vec<Product>>(payload) {
        return Ok(products);
    }

    match serde_json::from_slice::<RpcError>(payload) {
        Ok(remote) => Err(remote),
        Err(e) => Err(RpcError::internal(format!(
            "malformed product service reply: {e}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_decode_product_list_reply() {
        let payload = serde_json::json!([
            {"id": Uuid::new_v4(), "name": "Widget", "price": "10.50"}
        ]);

        let products = decode_reply(payload.to_string().as_bytes()).unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Widget");
        assert_eq!(products[0].price, dec!(10.50));
    }

    #[test]
    fn test_decode_remote_error_reply() {
        let payload = br#"{"status": 400, "message": "some products were not found"}"#;

        let error = decode_reply(payload).unwrap_err();

        assert_eq!(error.status, 400);
        assert_eq!(error.message, "some products were not found");
    }

    #[test]
    fn test_decode_garbage_reply() {
        let error = decode_reply(b"not json at all").unwrap_err();
        assert_eq!(error.status, 500);
    }
}
