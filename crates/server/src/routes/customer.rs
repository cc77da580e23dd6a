//! Customer-facing handlers, called from the storefront page.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiSuccess, json_body};
use crate::error::AppError;
use crate::middleware::public_cors;
use crate::services::orders::{CheckoutRequest, ResolvedOrder, process_checkout, resolve_order};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/get-order", get(get_order))
        .route("/apps/custom-order/get-order", get(get_order))
        .route("/api/process-checkout", post(checkout))
        .layer(public_cors())
}

/// `?token=&shop=` from a customer link.
#[derive(Debug, Default, Deserialize)]
pub struct LinkQuery {
    pub token: Option<String>,
    pub shop: Option<String>,
}

/// Resolve a customer link.
#[instrument(skip(state, query))]
async fn get_order(
    State(state): State<AppState>,
    Query(query): Query<LinkQuery>,
) -> Result<Json<ApiSuccess<ResolvedOrder>>, AppError> {
    let order = resolve_order(&state, query.token.as_deref(), query.shop.as_deref()).await?;
    Ok(ApiSuccess::new(order))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutResponse {
    checkout_url: String,
}

/// Price the customer's choice and return the invoice URL.
#[instrument(skip(state, body))]
async fn checkout(
    State(state): State<AppState>,
    body: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<ApiSuccess<CheckoutResponse>>, AppError> {
    let request = json_body(body)?;
    let checkout_url = process_checkout(&state, &request).await?;
    Ok(ApiSuccess::new(CheckoutResponse { checkout_url }))
}
