//! HTTP middleware.
//!
//! # Layer order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (recorded on the span, echoed in the response)
//! 4. CORS on the public customer routes only
//!
//! Admin routes authenticate through the [`auth::RequireAdminAuth`]
//! extractor rather than a layer.

pub mod auth;
pub mod request_id;

use axum::http::{Method, header::CONTENT_TYPE};
use tower_http::cors::{Any, CorsLayer};

pub use auth::RequireAdminAuth;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};

/// CORS for the customer-facing routes, which are called from the
/// storefront page of any installed shop.
#[must_use]
pub fn public_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}
