//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use custom_order_core::ShopDomain;
use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::db::ShopTokenRepository;
use crate::error::AppError;
use crate::shopify::ShopifyClient;

/// Timeout applied to every Shopify request.
const SHOPIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state shared across all handlers.
///
/// Cheap to clone (inner data is reference-counted).
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    http: reqwest::Client,
    default_shopify: ShopifyClient,
}

impl AppState {
    /// Create the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(SHOPIFY_TIMEOUT)
            .user_agent(concat!("custom-order-server/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let default_shopify = ShopifyClient::new(
            http.clone(),
            config.shopify.store.clone(),
            config.shopify.access_token.clone(),
            &config.shopify.api_version,
            config.shopify.api_base_url.as_deref(),
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                http,
                default_shopify,
            }),
        })
    }

    /// Get the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get the database pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The configured default shop.
    #[must_use]
    pub fn default_shop(&self) -> &ShopDomain {
        &self.inner.config.shopify.store
    }

    /// Get a Shopify client for `shop`.
    ///
    /// The default store uses the configured access token; any other shop
    /// must have a token in `shop_tokens`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` if the shop has no credentials, or
    /// `AppError::Database` if the lookup fails.
    pub async fn shopify_for(&self, shop: &ShopDomain) -> Result<ShopifyClient, AppError> {
        if shop == self.default_shop() {
            return Ok(self.inner.default_shopify.clone());
        }

        let token = ShopTokenRepository::new(self.pool())
            .get_by_shop(shop)
            .await?
            .ok_or_else(|| {
                tracing::warn!(shop = %shop, "Request for shop without credentials");
                AppError::Unauthorized("Shop is not installed".to_string())
            })?;

        let shopify = &self.inner.config.shopify;
        Ok(ShopifyClient::new(
            self.inner.http.clone(),
            token.shop,
            token.access_token,
            &shopify.api_version,
            shopify.api_base_url.as_deref(),
        ))
    }
}
