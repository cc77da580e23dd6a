//! Repository tests against a migrated database.
//!
//! These tests require a `PostgreSQL` database migrated with
//! `co-cli migrate` and `DATABASE_URL` pointing at it.
//!
//! Run with: cargo test -p custom-order-integration-tests -- --ignored

use custom_order_core::{
    DraftOrderId, Email, OptionGroup, OptionValue, OrderStatus, OrderToken, Price, ShopDomain,
};
use std::net::{IpAddr, Ipv4Addr};

use custom_order_integration_tests::{scratch_shop, test_pool};
use custom_order_server::config::{ServerConfig, ShopifyConfig};
use custom_order_server::db::settings::next_reference;
use custom_order_server::db::{
    NewOrderBlock, OrderBlockRepository, OrderTokenRepository, ShopTokenRepository,
};
use custom_order_server::services::orders::resolve_order;
use custom_order_server::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::PgPool;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn shop() -> ShopDomain {
    ShopDomain::parse(&scratch_shop()).expect("scratch shop is valid")
}

fn new_block(shop: &ShopDomain, reference: String) -> NewOrderBlock {
    NewOrderBlock {
        reference,
        shop: shop.clone(),
        product_title: "Oak Table".to_string(),
        customer_email: Some(Email::parse("buyer@example.com").expect("valid email")),
        customer_name: Some("Ada Buyer".to_string()),
        note: Some("Oiled finish".to_string()),
        images: vec!["https://cdn.example.com/oak.jpg".to_string()],
        option_groups: vec![OptionGroup {
            name: "Size".to_string(),
            values: vec![OptionValue {
                id: "large".to_string(),
                label: "Large".to_string(),
                price: Price::parse("250.00").expect("valid price"),
            }],
        }],
    }
}

// ============================================================================
// Order blocks
// ============================================================================

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_order_block_lifecycle() {
    let pool = test_pool().await;
    let repo = OrderBlockRepository::new(&pool);
    let shop = shop();

    let reference = next_reference(&pool).await.expect("reference");
    let created = repo
        .create(&new_block(&shop, reference.clone()))
        .await
        .expect("create block");
    assert_eq!(created.reference, reference);
    assert_eq!(created.status(), OrderStatus::Pending);
    assert_eq!(created.option_groups.len(), 1);

    let draft_order_id = DraftOrderId::new(1_024_000_001);
    repo.set_draft_order(created.id, draft_order_id)
        .await
        .expect("link draft order");

    let fetched = repo
        .get(&shop, created.id)
        .await
        .expect("get block")
        .expect("block exists");
    assert_eq!(fetched.draft_order_id, Some(draft_order_id));
    assert_eq!(fetched.status(), OrderStatus::Pending);

    let marked = repo
        .mark_purchased_by_draft_order(&shop, draft_order_id)
        .await
        .expect("mark purchased");
    assert_eq!(marked, 1);

    let listed = repo.list_by_shop(&shop).await.expect("list blocks");
    assert_eq!(listed.len(), 1);
    assert!(
        listed
            .first()
            .is_some_and(|b| b.status() == OrderStatus::Purchased)
    );

    assert!(repo.delete(&shop, created.id).await.expect("delete"));
    assert!(!repo.delete(&shop, created.id).await.expect("second delete"));
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_blocks_are_scoped_to_shop() {
    let pool = test_pool().await;
    let repo = OrderBlockRepository::new(&pool);
    let owner = shop();
    let other = shop();

    let reference = next_reference(&pool).await.expect("reference");
    let created = repo
        .create(&new_block(&owner, reference))
        .await
        .expect("create block");

    assert!(repo.get(&other, created.id).await.expect("get").is_none());
    assert!(!repo.delete(&other, created.id).await.expect("delete"));
    assert_eq!(
        repo.mark_purchased_by_id(&other, created.id)
            .await
            .expect("mark"),
        0
    );

    repo.delete(&owner, created.id).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_references_are_unique() {
    let pool = test_pool().await;

    let first = next_reference(&pool).await.expect("reference");
    let second = next_reference(&pool).await.expect("reference");
    assert_ne!(first, second);
    assert!(first.starts_with("npdf"));
}

// ============================================================================
// Token index
// ============================================================================

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_token_index_upsert_and_purchase() {
    let pool = test_pool().await;
    let repo = OrderTokenRepository::new(&pool);
    let shop = shop();
    let token = OrderToken::generate();

    assert!(repo.find(&shop, &token).await.expect("find").is_none());

    repo.upsert(&shop, &token, DraftOrderId::new(11))
        .await
        .expect("upsert");
    repo.upsert(&shop, &token, DraftOrderId::new(12))
        .await
        .expect("upsert again");

    let entry = repo
        .find(&shop, &token)
        .await
        .expect("find")
        .expect("entry exists");
    assert_eq!(entry.draft_order_id, DraftOrderId::new(12));
    assert!(!entry.is_purchased);

    let marked = repo
        .mark_purchased_by_draft_order(&shop, DraftOrderId::new(12))
        .await
        .expect("mark");
    assert_eq!(marked, 1);

    assert!(repo.delete(&shop, &token).await.expect("delete"));
}

// ============================================================================
// Shop tokens
// ============================================================================

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_shop_token_save_replaces() {
    let pool = test_pool().await;
    let repo = ShopTokenRepository::new(&pool);
    let shop = shop();

    repo.save(&shop, "shpat_first", &["read_draft_orders".to_string()], 1)
        .await
        .expect("save");
    repo.save(&shop, "shpat_second", &["write_draft_orders".to_string()], 2)
        .await
        .expect("save again");

    let stored = repo
        .get_by_shop(&shop)
        .await
        .expect("get")
        .expect("token exists");
    assert_eq!(stored.scopes, vec!["write_draft_orders".to_string()]);
    assert_eq!(stored.obtained_at, 2);

    assert!(repo.delete(&shop).await.expect("delete"));
}

// ============================================================================
// Token resolution
// ============================================================================

const API_VERSION: &str = "2024-10";

/// State for `shop` talking to a mock Shopify at `base_url`.
fn mock_state(pool: PgPool, shop: &ShopDomain, base_url: &str) -> AppState {
    let config = ServerConfig {
        database_url: SecretString::from("postgres://unused"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        admin_api_token: SecretString::from("k8Jw2mQ9xR4vT7nB3cF6hL1pZ5sD0gYe"),
        shopify: ShopifyConfig {
            store: shop.clone(),
            access_token: SecretString::from("shpat_test_token"),
            api_version: API_VERSION.to_string(),
            api_base_url: Some(base_url.to_string()),
            scan_pages: 1,
        },
        customer_page_path: "/pages/custom-order".to_string(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
        tls: None,
    };
    AppState::new(config, pool).expect("build state")
}

fn rest_draft_order(id: u64, tags: &str) -> Value {
    json!({
        "id": id,
        "name": format!("#D{id}"),
        "status": "open",
        "tags": tags,
        "note_attributes": [{"name": "_title", "value": "Oak Table"}],
        "line_items": [],
        "invoice_url": format!("https://example.com/invoices/{id}"),
        "total_price": "0.00",
        "currency": "USD"
    })
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_stale_token_entry_is_replaced_by_scan() {
    let pool = test_pool().await;
    let shop = shop();
    let token = OrderToken::generate();
    let tokens = OrderTokenRepository::new(&pool);

    // The indexed draft order no longer carries the token's tag.
    tokens
        .upsert(&shop, &token, DraftOrderId::new(77))
        .await
        .expect("seed index");

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/admin/api/{API_VERSION}/draft_orders/77.json")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"draft_order": rest_draft_order(77, "custom")})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/admin/api/{API_VERSION}/draft_orders.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "draft_orders": [rest_draft_order(78, &format!("custom, {}", token.tag()))]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = mock_state(pool.clone(), &shop, &server.uri());
    let resolved = resolve_order(&state, Some(token.as_str()), Some(shop.as_str()))
        .await
        .expect("resolve by scan");
    assert_eq!(resolved.draft_order_id, Some(DraftOrderId::new(78)));

    let entry = tokens
        .find(&shop, &token)
        .await
        .expect("find")
        .expect("entry rewritten");
    assert_eq!(entry.draft_order_id, DraftOrderId::new(78));

    tokens.delete(&shop, &token).await.expect("cleanup");
}
