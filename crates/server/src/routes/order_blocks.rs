//! Admin order block handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{delete, get},
};
use custom_order_core::{DraftOrderId, OrderBlockId};
use serde::Serialize;

use super::{ApiSuccess, ShopQuery, json_body};
use crate::error::AppError;
use crate::middleware::RequireAdminAuth;
use crate::services::orders::{
    BlockView, CreateBlockRequest, create_block, delete_block, list_blocks,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/order-blocks", get(list).post(create))
        .route("/api/order-blocks/{id}", delete(remove))
}

#[derive(Debug, Serialize)]
struct BlocksResponse {
    blocks: Vec<BlockView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedResponse {
    block: BlockView,
    customer_link: String,
    draft_order_id: Option<DraftOrderId>,
}

async fn list(
    _admin: RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
) -> Result<Json<ApiSuccess<BlocksResponse>>, AppError> {
    let shop = query.resolve(&state)?;
    let blocks = list_blocks(&state, &shop).await?;
    Ok(ApiSuccess::new(BlocksResponse { blocks }))
}

async fn create(
    _admin: RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
    body: Result<Json<CreateBlockRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiSuccess<CreatedResponse>>), AppError> {
    let request = json_body(body)?;
    let shop = query.resolve(&state)?;
    let created = create_block(&state, &shop, &request).await?;

    Ok((
        StatusCode::CREATED,
        ApiSuccess::new(CreatedResponse {
            customer_link: created.block.customer_link.clone(),
            block: created.block,
            draft_order_id: created.draft_order_id,
        }),
    ))
}

async fn remove(
    _admin: RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
    Path(id): Path<String>,
) -> Result<Json<ApiSuccess<serde_json::Value>>, AppError> {
    let id = OrderBlockId::parse(&id)
        .map_err(|_| AppError::BadRequest("Invalid order block id".to_string()))?;
    let shop = query.resolve(&state)?;
    delete_block(&state, &shop, id).await?;
    Ok(ApiSuccess::new(serde_json::json!({})))
}
