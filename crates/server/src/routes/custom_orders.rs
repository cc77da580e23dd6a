//! Admin draft order and template handlers.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;

use super::{ApiSuccess, ShopQuery, json_body};
use crate::error::AppError;
use crate::middleware::RequireAdminAuth;
use crate::services::orders::{
    CreateDraftOrderRequest, CreatedOrder, TemplateSummary, create_draft_order, list_templates,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/draft-order", post(create))
        .route("/api/templates", get(templates))
}

/// Create a customer draft order or a template.
///
/// Customer orders respond with the draft order and the link to send:
///
/// ```json
/// {"success": true, "draftOrder": {...}, "customerLink": "https://..."}
/// ```
async fn create(
    _admin: RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
    body: Result<Json<CreateDraftOrderRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let request = json_body(body)?;
    let shop = query.resolve(&state)?;

    let response = match create_draft_order(&state, &shop, &request).await? {
        CreatedOrder::Template(_) => json!({ "success": true, "isTemplate": true }),
        CreatedOrder::Customer {
            draft_order,
            token,
            customer_link,
        } => json!({
            "success": true,
            "draftOrder": draft_order,
            "token": token,
            "customerLink": customer_link,
        }),
    };
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct TemplatesResponse {
    templates: Vec<TemplateSummary>,
}

/// List templates for the picker.
async fn templates(
    _admin: RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
) -> Result<Json<ApiSuccess<TemplatesResponse>>, AppError> {
    let shop = query.resolve(&state)?;
    let templates = list_templates(&state, &shop).await?;
    Ok(ApiSuccess::new(TemplatesResponse { templates }))
}
