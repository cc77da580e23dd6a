//! Shopify Admin REST API client for draft orders.
//!
//! # Architecture
//!
//! - One [`ShopifyClient`] per shop, built on demand from a shared
//!   `reqwest::Client` (see `AppState::shopify_for`)
//! - Authenticated with the `X-Shopify-Access-Token` header
//! - Cursor pagination via the `Link` response header
//! - Rate limits surface as [`ShopifyError::RateLimited`]; callers decide
//!   whether to retry
//!
//! # Example
//!
//! ```rust,ignore
//! use custom_order_server::shopify::{DraftOrderListParams, ShopifyClient};
//!
//! let client = state.shopify_for(&shop).await?;
//! let page = client.list_draft_orders(&DraftOrderListParams::open(50)).await?;
//! for draft_order in page.draft_orders {
//!     tracing::info!(id = %draft_order.id, tags = %draft_order.tags, "draft order");
//! }
//! ```

mod client;
pub mod draft_order;
pub mod pagination;

pub use client::ShopifyClient;
pub use draft_order::*;

use thiserror::Error;

/// Retry delay assumed when a 429 response carries no usable `Retry-After`.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 2;

/// Errors that can occur when interacting with the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Shopify rejected the request (validation errors and the like).
    #[error("Shopify API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// The `errors` body rendered as text.
        message: String,
    },
}

/// Render a REST `errors` value as text.
///
/// Shopify returns a plain string, a list of strings, or an object mapping
/// field names to lists of messages.
pub(crate) fn render_errors(errors: &serde_json::Value) -> String {
    use serde_json::Value;

    match errors {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_errors)
            .collect::<Vec<_>>()
            .join("; "),
        Value::Object(fields) => fields
            .iter()
            .map(|(field, messages)| {
                let messages = match messages {
                    Value::Array(items) => items
                        .iter()
                        .map(render_errors)
                        .collect::<Vec<_>>()
                        .join(", "),
                    other => render_errors(other),
                };
                if field == "base" {
                    messages
                } else {
                    format!("{field}: {messages}")
                }
            })
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}
