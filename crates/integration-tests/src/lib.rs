//! Integration tests for custom order links.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate a scratch database and start the server against it
//! cargo run -p custom-order-cli -- migrate
//! cargo run -p custom-order-server
//!
//! # Run the ignored tests
//! cargo test -p custom-order-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `repositories` - Repository queries against `DATABASE_URL`
//! - `live_api` - HTTP flows against `SERVER_BASE_URL` (needs real Shopify
//!   credentials on the server)
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - Migrated `PostgreSQL` database
//! - `SERVER_BASE_URL` - Running server (default `http://localhost:3000`)
//! - `ADMIN_API_TOKEN` - The server's admin bearer token
//! - `SHOPIFY_STORE` - The server's default store

use reqwest::Client;
use serde_json::Value;
use sqlx::PgPool;

/// Connection details for a running server.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub admin_token: String,
    pub shop: String,
}

impl TestContext {
    /// Build a context from the environment.
    ///
    /// # Panics
    ///
    /// Panics if `ADMIN_API_TOKEN` or `SHOPIFY_STORE` is unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            client: Client::new(),
            base_url: std::env::var("SERVER_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            admin_token: std::env::var("ADMIN_API_TOKEN").expect("ADMIN_API_TOKEN must be set"),
            shop: std::env::var("SHOPIFY_STORE").expect("SHOPIFY_STORE must be set"),
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// POST JSON to an admin route.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the response is not JSON.
    pub async fn admin_post(&self, path: &str, body: &Value) -> (u16, Value) {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.admin_token)
            .json(body)
            .send()
            .await
            .expect("request failed");
        let status = response.status().as_u16();
        (status, response.json().await.expect("response is not JSON"))
    }

    /// GET a route without credentials.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the response is not JSON.
    pub async fn public_get(&self, path: &str) -> (u16, Value) {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("request failed");
        let status = response.status().as_u16();
        (status, response.json().await.expect("response is not JSON"))
    }
}

/// Connect to `DATABASE_URL`.
///
/// # Panics
///
/// Panics if `DATABASE_URL` is unset or unreachable.
pub async fn test_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgPool::connect(&url)
        .await
        .expect("failed to connect to DATABASE_URL")
}

/// A shop domain unique to one test run.
#[must_use]
pub fn scratch_shop() -> String {
    format!("it-{}.myshopify.com", uuid::Uuid::new_v4().simple())
}
