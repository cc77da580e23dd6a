//! Shopify webhook endpoints.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use serde_json::{Value, json};

use crate::services::webhooks::handle_webhook;
use crate::state::AppState;

const TOPIC_HEADER: &str = "x-shopify-topic";
const SHOP_HEADER: &str = "x-shopify-shop-domain";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/webhooks", post(by_header))
        .route("/webhooks/orders/create", post(orders_create))
        .route("/webhooks/draft_orders/finalized", post(draft_orders_finalized))
}

async fn by_header(
    state: State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    receive(state, headers, body, None).await
}

async fn orders_create(
    state: State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    receive(state, headers, body, Some("orders/create")).await
}

async fn draft_orders_finalized(
    state: State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    receive(state, headers, body, Some("draft_orders/finalized")).await
}

/// Handle a delivery. `topic` overrides the topic header for the
/// per-topic paths.
async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
    topic: Option<&'static str>,
) -> (StatusCode, Json<Value>) {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let topic = match topic {
        Some(topic) => Some(topic),
        None => header(TOPIC_HEADER),
    };
    let payload: Option<Value> = serde_json::from_slice(&body).ok();

    let outcome = handle_webhook(state.pool(), topic, header(SHOP_HEADER), payload.as_ref()).await;
    (outcome.status, Json(json!({ "message": outcome.message })))
}
