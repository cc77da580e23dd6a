//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                       - Liveness
//! GET    /health/ready                 - Database ping
//!
//! # Admin (Bearer ADMIN_API_TOKEN)
//! POST   /api/draft-order              - Create a customer draft order or template
//! GET    /api/templates                - List templates
//! GET    /api/order-blocks             - List order blocks
//! POST   /api/order-blocks             - Create an order block
//! DELETE /api/order-blocks/{id}        - Delete an order block
//!
//! # Customer (CORS *)
//! GET    /api/get-order                - Resolve a customer link
//! GET    /apps/custom-order/get-order  - Same, behind the Shopify app proxy
//! POST   /api/process-checkout         - Price the selection, return checkout URL
//!
//! # Shopify
//! POST   /webhooks                     - Topic from X-Shopify-Topic
//! POST   /webhooks/orders/create
//! POST   /webhooks/draft_orders/finalized
//! ```
//!
//! Admin routes accept an optional `?shop=` and default to the configured
//! store.

pub mod custom_orders;
pub mod customer;
pub mod health;
pub mod order_blocks;
pub mod webhooks;

use axum::extract::rejection::JsonRejection;
use axum::{Json, Router, middleware as axum_middleware};
use custom_order_core::ShopDomain;
use serde::{Deserialize, Serialize};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::request_id_middleware;
use crate::services::orders::parse_shop;
use crate::state::AppState;

/// A successful JSON response: `{"success": true, ...data}`.
#[derive(Debug, Serialize)]
pub struct ApiSuccess<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> ApiSuccess<T> {
    pub const fn new(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Optional `?shop=` on admin routes.
#[derive(Debug, Default, Deserialize)]
pub struct ShopQuery {
    pub shop: Option<String>,
}

impl ShopQuery {
    /// The requested shop, or the configured store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for an invalid domain.
    pub fn resolve(&self, state: &AppState) -> Result<ShopDomain, AppError> {
        match self.shop.as_deref().map(str::trim) {
            None | Some("") => Ok(state.default_shop().clone()),
            Some(shop) => parse_shop(Some(shop)),
        }
    }
}

/// Unwrap a JSON body, reporting malformed input in the API's error format.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected request body");
        AppError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    })
}

/// All routes, without state.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(custom_orders::router())
        .merge(order_blocks::router())
        .merge(customer::router())
        .merge(webhooks::router())
}

/// The application: routes, request ids and request tracing.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        #[allow(clippy::cast_possible_truncation)]
                        let latency_ms = latency.as_millis() as u64;
                        span.record("latency_ms", latency_ms);
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
