use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::{CreateOrderRequest, OrderFilter, OrderService, OrderStatus};
use crate::error::RpcError;
use crate::messaging::ProductValidator;
use crate::store::OrderStore;

// ============================================================================
// Bus Transport - thin dispatch over NATS request/reply
// ============================================================================
//
// One queue-group subscription covers all order subjects; each request is
// handled in its own task so slow remote validations never block other
// requests. Replies are either the operation's payload or `{"error":
// {status, message}}`.
//
// ============================================================================

pub const CREATE_SUBJECT: &str = "orders.create";
pub const GET_SUBJECT: &str = "orders.get";
pub const LIST_SUBJECT: &str = "orders.list";
pub const SET_STATUS_SUBJECT: &str = "orders.set_status";

const QUEUE_GROUP: &str = "orders";

#[derive(Debug, Deserialize)]
struct GetOrderRequest {
    id: Uuid,
}

#[derive(Debug, Deserialize)]
struct SetStatusRequest {
    id: Uuid,
    status: OrderStatus,
}

#[derive(Serialize)]
struct ErrorReply<'a> {
    error: &'a RpcError,
}

/// Serve order requests until the bus connection closes.
pub async fn serve<S, V>(
    client: async_nats::Client,
    service: OrderService<S, V>,
) -> anyhow::Result<()>
where
    S: OrderStore + 'static,
    V: ProductValidator + 'static,
{
    let mut requests = client
        .queue_subscribe("orders.*", QUEUE_GROUP.to_string())
        .await?;

    tracing::info!(subject = "orders.*", queue = QUEUE_GROUP, "listening for order requests");

    while let Some(message) = requests.next().await {
        let service = service.clone();
        let client = client.clone();

        tokio::spawn(async move {
            let reply = handle(&service, message.subject.as_str(), &message.payload).await;

            let Some(reply_to) = message.reply else {
                tracing::warn!(subject = %message.subject, "request without reply subject dropped");
                return;
            };

            if let Err(e) = client.publish(reply_to, reply.into()).await {
                tracing::warn!(error = %e, "failed to publish reply");
            }
        });
    }

    Ok(())
}

async fn handle<S, V>(service: &OrderService<S, V>, subject: &str, payload: &[u8]) -> Vec<u8>
where
    S: OrderStore,
    V: ProductValidator,
{
    match subject {
        CREATE_SUBJECT => match parse::<CreateOrderRequest>(payload) {
            Ok(request) => encode(service.create(request).await),
            Err(error) => encode_error(&error),
        },
        GET_SUBJECT => match parse::<GetOrderRequest>(payload) {
            Ok(request) => encode(service.find_one(request.id).await),
            Err(error) => encode_error(&error),
        },
        LIST_SUBJECT => match parse_or_default::<OrderFilter>(payload) {
            Ok(filter) => encode(service.find_all(filter).await),
            Err(error) => encode_error(&error),
        },
        SET_STATUS_SUBJECT => match parse::<SetStatusRequest>(payload) {
            Ok(request) => encode(service.change_status(request.id, request.status).await),
            Err(error) => encode_error(&error),
        },
        other => encode_error(&RpcError::bad_request(format!("unknown subject: {other}"))),
    }
}

fn parse<T: DeserializeOwned>(payload: &[u8]) -> Result<T, RpcError> {
    serde_json::from_slice(payload)
        .map_err(|e| RpcError::bad_request(format!("malformed request: {e}")))
}

/// An empty payload on the list subject means "default filter".
fn parse_or_default<T: DeserializeOwned + Default>(payload: &[u8]) -> Result<T, RpcError> {
    if payload.is_empty() {
        return Ok(T::default());
    }
    parse(payload)
}

fn encode<T, E>(result: Result<T, E>) -> Vec<u8>
where
    T: Serialize,
    E: Into<RpcError>,
{
    match result {
        Ok(value) => serde_json::to_vec(&value).unwrap_or_else(|e| {
            encode_error(&RpcError::internal(format!("failed to encode reply: {e}")))
        }),
        Err(error) => encode_error(&error.into()),
    }
}

fn encode_error(error: &RpcError) -> Vec<u8> {
    serde_json::to_vec(&ErrorReply { error }).unwrap_or_default()
}
