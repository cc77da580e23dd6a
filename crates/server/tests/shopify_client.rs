//! Integration tests for the Shopify Admin REST client.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no
//! real network traffic is made.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

mod common;

use custom_order_core::{DraftOrderId, Price};
use custom_order_server::shopify::{
    DraftOrderInput, DraftOrderLineItemInput, DraftOrderListParams, DraftOrderStatus,
    ShopifyError,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{api_path, client, draft_order, token_attributes};

// ---------------------------------------------------------------------------
// Draft order CRUD
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_draft_order_sends_token_header_and_wrapped_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(api_path("draft_orders.json")))
        .and(header("X-Shopify-Access-Token", "shpat_test_token"))
        .and(body_partial_json(json!({
            "draft_order": {
                "tags": "custom,t_0a1b2c3d",
                "line_items": [{"title": "Custom Ring", "price": "0.00", "quantity": 1, "custom": true}]
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "draft_order": draft_order(1001, "custom, t_0a1b2c3d", &token_attributes("0a1b2c3d"))
        })))
        .expect(1)
        .mount(&server)
        .await;

    let input = DraftOrderInput {
        line_items: Some(vec![DraftOrderLineItemInput::custom("Custom Ring", Price::ZERO)]),
        tags: Some("custom,t_0a1b2c3d".to_string()),
        ..DraftOrderInput::default()
    };
    let created = client(&server.uri()).create_draft_order(&input).await.unwrap();

    assert_eq!(created.id, DraftOrderId::new(1001));
    assert!(created.has_tag("t_0a1b2c3d"));
    assert_eq!(created.note_attribute("_title"), Some("Custom Ring"));
}

#[tokio::test]
async fn create_draft_order_surfaces_validation_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(api_path("draft_orders.json")))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "errors": {"customer": ["email is invalid"]}
        })))
        .mount(&server)
        .await;

    let err = client(&server.uri())
        .create_draft_order(&DraftOrderInput::default())
        .await
        .unwrap_err();

    match err {
        ShopifyError::Api { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "customer: email is invalid");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn get_draft_order_returns_none_on_404() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("draft_orders/404.json")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"errors": "Not Found"})))
        .mount(&server)
        .await;

    let found = client(&server.uri())
        .get_draft_order(DraftOrderId::new(404))
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn update_draft_order_replaces_line_items() {
    let server = MockServer::start().await;

    let mut updated = draft_order(1001, "custom", &json!([]));
    updated["total_price"] = json!("45.00");

    Mock::given(method("PUT"))
        .and(path(api_path("draft_orders/1001.json")))
        .and(body_partial_json(json!({
            "draft_order": {"line_items": [{"title": "Ring - Metal: Silver", "price": "45.00"}]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"draft_order": updated})))
        .expect(1)
        .mount(&server)
        .await;

    let input = DraftOrderInput {
        line_items: Some(vec![DraftOrderLineItemInput::custom(
            "Ring - Metal: Silver",
            Price::parse("45").unwrap(),
        )]),
        ..DraftOrderInput::default()
    };
    let result = client(&server.uri())
        .update_draft_order(DraftOrderId::new(1001), &input)
        .await
        .unwrap();
    assert_eq!(result.total_price.to_money_string(), "45.00");
}

#[tokio::test]
async fn delete_draft_order_reports_missing() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(api_path("draft_orders/7.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(api_path("draft_orders/8.json")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let shopify = client(&server.uri());
    assert!(shopify.delete_draft_order(DraftOrderId::new(7)).await.unwrap());
    assert!(!shopify.delete_draft_order(DraftOrderId::new(8)).await.unwrap());
}

// ---------------------------------------------------------------------------
// Listing and pagination
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_draft_orders_reads_next_cursor_from_link_header() {
    let server = MockServer::start().await;
    let next = format!(
        "<{}{}?limit=250&page_info=abc123>; rel=\"next\"",
        server.uri(),
        api_path("draft_orders.json")
    );

    Mock::given(method("GET"))
        .and(path(api_path("draft_orders.json")))
        .and(query_param("limit", "250"))
        .and(query_param("status", "open"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Link", next.as_str())
                .set_body_json(json!({"draft_orders": [draft_order(1, "app_template", &json!([]))]})),
        )
        .mount(&server)
        .await;

    let page = client(&server.uri())
        .list_draft_orders(&DraftOrderListParams::open(500))
        .await
        .unwrap();

    assert_eq!(page.draft_orders.len(), 1);
    assert_eq!(page.draft_orders[0].status, DraftOrderStatus::Open);
    assert_eq!(page.next_page_info.as_deref(), Some("abc123"));
}

#[tokio::test]
async fn list_draft_orders_follows_cursor_without_filters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("draft_orders.json")))
        .and(query_param("page_info", "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"draft_orders": []})))
        .expect(1)
        .mount(&server)
        .await;

    let params = DraftOrderListParams::open(250).after("abc123".to_string());
    let page = client(&server.uri()).list_draft_orders(&params).await.unwrap();

    assert!(page.draft_orders.is_empty());
    assert!(page.next_page_info.is_none());
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rate_limit_uses_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("draft_orders.json")))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "4.0"))
        .mount(&server)
        .await;

    let err = client(&server.uri())
        .list_draft_orders(&DraftOrderListParams::any(10))
        .await
        .unwrap_err();
    assert!(matches!(err, ShopifyError::RateLimited(4)), "got {err:?}");
}

#[tokio::test]
async fn rate_limit_without_header_defaults() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("draft_orders.json")))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = client(&server.uri())
        .list_draft_orders(&DraftOrderListParams::any(10))
        .await
        .unwrap_err();
    assert!(matches!(err, ShopifyError::RateLimited(2)), "got {err:?}");
}

#[tokio::test]
async fn invalid_token_is_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("draft_orders/1.json")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"errors": "[API] Invalid API key"})))
        .mount(&server)
        .await;

    let err = client(&server.uri())
        .get_draft_order(DraftOrderId::new(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ShopifyError::Unauthorized(_)), "got {err:?}");
}

// ---------------------------------------------------------------------------
// Metafields
// ---------------------------------------------------------------------------

#[tokio::test]
async fn metafield_lookup_matches_namespace_and_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("draft_orders/1001/metafields.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metafields": [
                {"namespace": "other", "key": "product_image", "value": "wrong"},
                {"namespace": "custom_order", "key": "product_image", "value": "https://cdn.example.com/m.png"}
            ]
        })))
        .mount(&server)
        .await;

    let value = client(&server.uri())
        .get_draft_order_metafield(DraftOrderId::new(1001), "custom_order", "product_image")
        .await
        .unwrap();
    assert_eq!(value.as_deref(), Some("https://cdn.example.com/m.png"));
}
