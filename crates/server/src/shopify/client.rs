//! Shopify Admin REST client.

use std::sync::Arc;

use custom_order_core::{DraftOrderId, ShopDomain};
use reqwest::header::{ACCEPT, LINK, RETRY_AFTER};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;

use super::draft_order::{
    DraftOrder, DraftOrderEnvelope, DraftOrderInput, DraftOrderInputEnvelope,
    DraftOrderListParams, DraftOrderPage, DraftOrdersEnvelope, MetafieldsEnvelope,
};
use super::pagination::next_page_info;
use super::{DEFAULT_RETRY_AFTER_SECS, ShopifyError, render_errors};

/// Shopify Admin REST client bound to one shop.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

struct ShopifyClientInner {
    http: reqwest::Client,
    shop: ShopDomain,
    /// `https://<shop>` or a configured override
    base_url: String,
    api_version: String,
    access_token: SecretString,
}

impl std::fmt::Debug for ShopifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyClient")
            .field("shop", &self.inner.shop)
            .field("base_url", &self.inner.base_url)
            .field("api_version", &self.inner.api_version)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl ShopifyClient {
    /// Create a client for `shop`.
    ///
    /// `base_url` replaces `https://<shop>` when set (local mocks).
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        shop: ShopDomain,
        access_token: SecretString,
        api_version: &str,
        base_url: Option<&str>,
    ) -> Self {
        let base_url = base_url.map_or_else(
            || format!("https://{shop}"),
            |url| url.trim_end_matches('/').to_string(),
        );

        Self {
            inner: Arc::new(ShopifyClientInner {
                http,
                shop,
                base_url,
                api_version: api_version.to_string(),
                access_token,
            }),
        }
    }

    /// The shop this client talks to.
    #[must_use]
    pub fn shop(&self) -> &ShopDomain {
        &self.inner.shop
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/admin/api/{}/{path}",
            self.inner.base_url, self.inner.api_version
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.inner
            .http
            .request(method, self.endpoint(path))
            .header("X-Shopify-Access-Token", self.inner.access_token.expose_secret())
            .header(ACCEPT, "application/json")
    }

    /// Send a request and map error statuses.
    async fn execute(&self, request: RequestBuilder, path: &str) -> Result<Response, ShopifyError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_retry_after)
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                Err(ShopifyError::RateLimited(retry_after))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ShopifyError::Unauthorized(
                "Invalid or expired access token".to_string(),
            )),
            StatusCode::NOT_FOUND => Err(ShopifyError::NotFound(path.to_string())),
            _ => {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<serde_json::Value>(&body)
                    .ok()
                    .and_then(|v| v.get("errors").map(render_errors))
                    .unwrap_or(body);
                Err(ShopifyError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, ShopifyError> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    // =========================================================================
    // Draft orders
    // =========================================================================

    /// Create a draft order.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Api` with Shopify's message if the input is
    /// rejected, or another `ShopifyError` if the request fails.
    #[instrument(skip(self, input), fields(shop = %self.inner.shop))]
    pub async fn create_draft_order(
        &self,
        input: &DraftOrderInput,
    ) -> Result<DraftOrder, ShopifyError> {
        let path = "draft_orders.json";
        let request = self
            .request(Method::POST, path)
            .json(&DraftOrderInputEnvelope { draft_order: input });
        let response = self.execute(request, path).await?;
        let envelope: DraftOrderEnvelope = Self::json(response).await?;

        tracing::info!(draft_order_id = %envelope.draft_order.id, "Created draft order");
        Ok(envelope.draft_order)
    }

    /// Update a draft order. Fields left `None` are untouched.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if the draft order does not exist,
    /// or another `ShopifyError` if the request fails.
    #[instrument(skip(self, input), fields(shop = %self.inner.shop, draft_order_id = %id))]
    pub async fn update_draft_order(
        &self,
        id: DraftOrderId,
        input: &DraftOrderInput,
    ) -> Result<DraftOrder, ShopifyError> {
        let path = format!("draft_orders/{id}.json");
        let request = self
            .request(Method::PUT, &path)
            .json(&DraftOrderInputEnvelope { draft_order: input });
        let response = self.execute(request, &path).await?;
        let envelope: DraftOrderEnvelope = Self::json(response).await?;
        Ok(envelope.draft_order)
    }

    /// Get a draft order, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(shop = %self.inner.shop, draft_order_id = %id))]
    pub async fn get_draft_order(&self, id: DraftOrderId) -> Result<Option<DraftOrder>, ShopifyError> {
        let path = format!("draft_orders/{id}.json");
        match self.execute(self.request(Method::GET, &path), &path).await {
            Ok(response) => {
                let envelope: DraftOrderEnvelope = Self::json(response).await?;
                Ok(Some(envelope.draft_order))
            }
            Err(ShopifyError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Delete a draft order. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(shop = %self.inner.shop, draft_order_id = %id))]
    pub async fn delete_draft_order(&self, id: DraftOrderId) -> Result<bool, ShopifyError> {
        let path = format!("draft_orders/{id}.json");
        match self.execute(self.request(Method::DELETE, &path), &path).await {
            Ok(_) => Ok(true),
            Err(ShopifyError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// List one page of draft orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(
        skip(self, params),
        fields(shop = %self.inner.shop, limit = params.limit, has_cursor = params.page_info.is_some())
    )]
    pub async fn list_draft_orders(
        &self,
        params: &DraftOrderListParams,
    ) -> Result<DraftOrderPage, ShopifyError> {
        let path = "draft_orders.json";
        let request = self.request(Method::GET, path).query(&params.query());
        let response = self.execute(request, path).await?;

        let next_page_info = next_page_info(
            response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok()),
        );
        let envelope: DraftOrdersEnvelope = Self::json(response).await?;

        Ok(DraftOrderPage {
            draft_orders: envelope.draft_orders,
            next_page_info,
        })
    }

    /// Read a draft order metafield as text, `None` if unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(shop = %self.inner.shop, draft_order_id = %id))]
    pub async fn get_draft_order_metafield(
        &self,
        id: DraftOrderId,
        namespace: &str,
        key: &str,
    ) -> Result<Option<String>, ShopifyError> {
        let path = format!("draft_orders/{id}/metafields.json");
        let request = self
            .request(Method::GET, &path)
            .query(&[("namespace", namespace), ("key", key)]);

        let response = match self.execute(request, &path).await {
            Ok(response) => response,
            Err(ShopifyError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let envelope: MetafieldsEnvelope = Self::json(response).await?;

        Ok(envelope
            .metafields
            .into_iter()
            .find(|m| m.namespace == namespace && m.key == key)
            .and_then(|m| match m.value {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(s),
                other => Some(other.to_string()),
            })
            .filter(|v| !v.is_empty()))
    }
}

/// Parse a `Retry-After` header given in (possibly fractional) seconds.
fn parse_retry_after(value: &str) -> Option<u64> {
    let secs = value.trim().parse::<f64>().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let secs = secs.ceil() as u64;
    Some(secs)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("2.0"), Some(2));
        assert_eq!(parse_retry_after("0.5"), Some(1));
        assert_eq!(parse_retry_after("10"), Some(10));
        assert_eq!(parse_retry_after("soon"), None);
        assert_eq!(parse_retry_after("-1"), None);
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = ShopifyClient::new(
            reqwest::Client::new(),
            ShopDomain::parse("acme.myshopify.com").unwrap(),
            SecretString::from("shpat_secret_value"),
            "2024-10",
            None,
        );
        let debug_output = format!("{client:?}");
        assert!(debug_output.contains("https://acme.myshopify.com"));
        assert!(!debug_output.contains("shpat_secret_value"));
    }
}
