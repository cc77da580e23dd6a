//! Shopify webhook processing.
//!
//! Two topics close the loop on a custom order:
//!
//! - `draft_orders/finalized`: the draft order was paid; every block and
//!   token pointing at it is marked purchased.
//! - `orders/create`: an order was placed from a block's draft order; the
//!   block is found through its `draft-order-app-id-<uuid>` tag.
//!
//! Signatures are not verified here.

use axum::http::StatusCode;
use custom_order_core::{DraftOrderId, OrderBlockId, ShopDomain};
use serde_json::Value;
use sqlx::PgPool;
use tracing::instrument;

use crate::db::{OrderBlockRepository, OrderTokenRepository, RepositoryError};
use crate::services::orders::attributes::BLOCK_TAG_PREFIX;

/// Webhook topics this app handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookTopic {
    OrdersCreate,
    DraftOrdersFinalized,
}

impl WebhookTopic {
    /// Parse a topic in either header form (`orders/create`) or enum form
    /// (`ORDERS_CREATE`).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().replace('/', "_").to_ascii_uppercase().as_str() {
            "ORDERS_CREATE" => Some(Self::OrdersCreate),
            "DRAFT_ORDERS_FINALIZED" => Some(Self::DraftOrdersFinalized),
            _ => None,
        }
    }
}

/// Status and message returned to Shopify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebhookOutcome {
    pub status: StatusCode,
    pub message: &'static str,
}

impl WebhookOutcome {
    const PROCESSED: Self = Self::new(StatusCode::OK, "Webhook processed");
    const NO_BLOCK_TAG: Self = Self::new(StatusCode::OK, "No matching OrderBlock ID tag found");
    const MISSING_PAYLOAD: Self = Self::new(StatusCode::BAD_REQUEST, "Payload or ID missing");
    const INVALID_SHOP: Self = Self::new(StatusCode::BAD_REQUEST, "Missing or invalid shop domain");
    const UNHANDLED: Self = Self::new(StatusCode::NOT_FOUND, "Unhandled webhook topic");
    const FAILED: Self = Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process webhook");

    const fn new(status: StatusCode, message: &'static str) -> Self {
        Self { status, message }
    }
}

/// Payload `id`, as a number or numeric string.
fn payload_id(payload: Option<&Value>) -> Option<u64> {
    match payload?.get("id")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => DraftOrderId::parse(s).ok().map(|id| id.as_u64()),
        _ => None,
    }
}

/// The order block id tagged onto an order.
///
/// `tags` may be Shopify's comma-separated string or an array of strings.
#[must_use]
pub fn block_id_from_tags(tags: Option<&Value>) -> Option<OrderBlockId> {
    let tags: Vec<&str> = match tags? {
        Value::String(s) => s.split(',').collect(),
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => return None,
    };

    tags.into_iter()
        .map(str::trim)
        .find_map(|tag| tag.strip_prefix(BLOCK_TAG_PREFIX))
        .and_then(|id| OrderBlockId::parse(id.trim()).ok())
}

/// Process one webhook delivery.
#[instrument(skip(pool, topic, payload), fields(topic = topic.unwrap_or("")))]
pub async fn handle_webhook(
    pool: &PgPool,
    topic: Option<&str>,
    shop: Option<&str>,
    payload: Option<&Value>,
) -> WebhookOutcome {
    let Some(id) = payload_id(payload) else {
        tracing::error!("Webhook received without payload or ID");
        return WebhookOutcome::MISSING_PAYLOAD;
    };

    let Some(topic) = topic.and_then(WebhookTopic::parse) else {
        tracing::warn!("Unhandled webhook topic");
        return WebhookOutcome::UNHANDLED;
    };

    let Some(shop) = shop.and_then(|s| ShopDomain::parse(s).ok()) else {
        tracing::warn!(shop = shop.unwrap_or(""), "Webhook without a valid shop domain");
        return WebhookOutcome::INVALID_SHOP;
    };

    let result = match topic {
        WebhookTopic::DraftOrdersFinalized => {
            draft_order_finalized(pool, &shop, DraftOrderId::new(id)).await
        }
        WebhookTopic::OrdersCreate => {
            let tags = payload.and_then(|p| p.get("tags"));
            let Some(block_id) = block_id_from_tags(tags) else {
                tracing::warn!(order_id = id, "Order has no order block tag");
                return WebhookOutcome::NO_BLOCK_TAG;
            };
            order_created(pool, &shop, id, block_id).await
        }
    };

    match result {
        Ok(()) => WebhookOutcome::PROCESSED,
        Err(e) => {
            tracing::error!(error = %e, "Failed to process webhook");
            WebhookOutcome::FAILED
        }
    }
}

async fn draft_order_finalized(
    pool: &PgPool,
    shop: &ShopDomain,
    draft_order_id: DraftOrderId,
) -> Result<(), RepositoryError> {
    let blocks = OrderBlockRepository::new(pool)
        .mark_purchased_by_draft_order(shop, draft_order_id)
        .await?;
    let tokens = OrderTokenRepository::new(pool)
        .mark_purchased_by_draft_order(shop, draft_order_id)
        .await?;

    if blocks + tokens == 0 {
        tracing::warn!(gid = %draft_order_id.gid(), shop = %shop, "No order matches finalized draft order");
    } else {
        tracing::info!(gid = %draft_order_id.gid(), blocks, tokens, "Marked order purchased");
    }
    Ok(())
}

async fn order_created(
    pool: &PgPool,
    shop: &ShopDomain,
    order_id: u64,
    block_id: OrderBlockId,
) -> Result<(), RepositoryError> {
    let updated = OrderBlockRepository::new(pool)
        .mark_purchased_by_id(shop, block_id)
        .await?;

    if updated == 0 {
        tracing::warn!(order_id, block_id = %block_id, shop = %shop, "No order block matches order tag");
    } else {
        tracing::info!(order_id, block_id = %block_id, "Marked order block purchased");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_topic_forms() {
        assert_eq!(WebhookTopic::parse("orders/create"), Some(WebhookTopic::OrdersCreate));
        assert_eq!(WebhookTopic::parse("ORDERS_CREATE"), Some(WebhookTopic::OrdersCreate));
        assert_eq!(
            WebhookTopic::parse("draft_orders/finalized"),
            Some(WebhookTopic::DraftOrdersFinalized)
        );
        assert_eq!(WebhookTopic::parse("app/uninstalled"), None);
    }

    #[test]
    fn test_payload_id() {
        assert_eq!(payload_id(Some(&json!({"id": 42}))), Some(42));
        assert_eq!(payload_id(Some(&json!({"id": "42"}))), Some(42));
        assert_eq!(payload_id(Some(&json!({"name": "#1001"}))), None);
        assert_eq!(payload_id(None), None);
    }

    #[test]
    fn test_block_id_from_string_tags() {
        let tags = json!("custom, draft-order-app-id-6f1c2b4e-9d3a-4c5e-8f7a-1b2c3d4e5f60");
        assert_eq!(
            block_id_from_tags(Some(&tags)).unwrap().to_string(),
            "6f1c2b4e-9d3a-4c5e-8f7a-1b2c3d4e5f60"
        );
    }

    #[test]
    fn test_block_id_from_array_tags() {
        let tags = json!(["custom", "draft-order-app-id-6f1c2b4e-9d3a-4c5e-8f7a-1b2c3d4e5f60"]);
        assert!(block_id_from_tags(Some(&tags)).is_some());
    }

    #[test]
    fn test_block_id_missing_or_garbage() {
        assert!(block_id_from_tags(Some(&json!("custom, vip"))).is_none());
        assert!(block_id_from_tags(Some(&json!("draft-order-app-id-nope"))).is_none());
        assert!(block_id_from_tags(None).is_none());
    }

    // Outcomes decided before any database access; the lazy pool never connects.
    fn lazy_pool() -> PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_payload_is_bad_request() {
        let outcome = handle_webhook(&lazy_pool(), Some("orders/create"), Some("acme.myshopify.com"), None).await;
        assert_eq!(outcome, WebhookOutcome::MISSING_PAYLOAD);
        assert_eq!(outcome.message, "Payload or ID missing");
    }

    #[tokio::test]
    async fn test_unknown_topic_is_not_found() {
        let payload = json!({"id": 1});
        let outcome = handle_webhook(&lazy_pool(), Some("products/update"), Some("acme.myshopify.com"), Some(&payload)).await;
        assert_eq!(outcome.status, StatusCode::NOT_FOUND);
        assert_eq!(outcome.message, "Unhandled webhook topic");
    }

    #[tokio::test]
    async fn test_order_without_block_tag_is_acknowledged() {
        let payload = json!({"id": 1, "tags": "vip"});
        let outcome = handle_webhook(&lazy_pool(), Some("ORDERS_CREATE"), Some("acme.myshopify.com"), Some(&payload)).await;
        assert_eq!(outcome.status, StatusCode::OK);
        assert_eq!(outcome.message, "No matching OrderBlock ID tag found");
    }
}
