//! Shared fixtures for server integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use custom_order_core::ShopDomain;
use custom_order_server::config::{ServerConfig, ShopifyConfig};
use custom_order_server::shopify::ShopifyClient;
use custom_order_server::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;

pub const SHOP: &str = "acme.myshopify.com";
pub const ADMIN_TOKEN: &str = "k8Jw2mQ9xR4vT7nB3cF6hL1pZ5sD0gYe";
pub const API_VERSION: &str = "2024-10";

/// Path of a REST endpoint on the mock server.
pub fn api_path(resource: &str) -> String {
    format!("/admin/api/{API_VERSION}/{resource}")
}

pub fn shop() -> ShopDomain {
    ShopDomain::parse(SHOP).unwrap()
}

/// A client for the default shop pointed at `base_url`.
pub fn client(base_url: &str) -> ShopifyClient {
    ShopifyClient::new(
        reqwest::Client::new(),
        shop(),
        SecretString::from("shpat_test_token"),
        API_VERSION,
        Some(base_url),
    )
}

/// Application state backed by a mock Shopify at `base_url` and a database
/// that is never reachable. Repository calls fail fast; handlers that treat
/// the token index as best-effort still succeed.
pub fn state(base_url: &str) -> AppState {
    let config = ServerConfig {
        database_url: SecretString::from("postgres://127.0.0.1:1/unreachable"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        admin_api_token: SecretString::from(ADMIN_TOKEN),
        shopify: ShopifyConfig {
            store: shop(),
            access_token: SecretString::from("shpat_test_token"),
            api_version: API_VERSION.to_string(),
            api_base_url: Some(base_url.to_string()),
            scan_pages: 2,
        },
        customer_page_path: "/pages/custom-order".to_string(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
        tls: None,
    };

    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(250))
        .connect_lazy("postgres://127.0.0.1:1/unreachable")
        .unwrap();

    AppState::new(config, pool).unwrap()
}

/// A REST draft order fixture.
pub fn draft_order(id: u64, tags: &str, attributes: &Value) -> Value {
    json!({
        "id": id,
        "name": format!("#D{id}"),
        "status": "open",
        "tags": tags,
        "note": "Please engrave",
        "note_attributes": attributes,
        "line_items": [{"id": 1, "title": "Custom Ring", "price": "0.00", "quantity": 1}],
        "email": "jane@example.com",
        "invoice_url": format!("https://{SHOP}/invoices/{id}"),
        "total_price": "0.00",
        "currency": "USD",
        "completed_at": null
    })
}

/// Note attributes of a token order with one option group.
pub fn token_attributes(token: &str) -> Value {
    json!([
        {"name": "_title", "value": "Custom Ring"},
        {"name": "_img", "value": "https://cdn.example.com/ring.png"},
        {"name": "_option_groups", "value": r#"[{"name":"Metal","values":[{"id":"g","label":"Gold","price":"120.00"},{"id":"s","label":"Silver","price":"45"}]}]"#},
        {"name": "_token", "value": token}
    ])
}
