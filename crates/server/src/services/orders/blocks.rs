//! Order block management.
//!
//! Blocks are created by the merchant and linked to customers by their id;
//! the Shopify draft order is created at checkout unless asked for up front.

use chrono::{DateTime, Utc};
use custom_order_core::{
    DraftOrderId, Email, OptionGroup, OrderBlockId, OrderStatus, Price, ShopDomain,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::block_draft_order_input;
use crate::db::{NewOrderBlock, OrderBlock, OrderBlockRepository, settings};
use crate::error::AppError;
use crate::shopify::{DraftOrderLineItemInput, DraftOrderStatus};
use crate::state::AppState;

/// Body of `POST /api/order-blocks`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlockRequest {
    #[serde(default)]
    pub product_title: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    /// Image URLs.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub option_groups: Vec<OptionGroup>,
    /// Create the Shopify draft order now instead of at checkout.
    #[serde(default)]
    pub create_draft_order: bool,
}

/// An order block as listed for the merchant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockView {
    pub id: OrderBlockId,
    pub reference: String,
    pub shop: ShopDomain,
    pub product_title: String,
    pub customer_email: Option<Email>,
    pub customer_name: Option<String>,
    pub note: Option<String>,
    pub images: Vec<String>,
    pub option_groups: Vec<OptionGroup>,
    /// Linked draft order gid.
    pub shopify_draft_order_id: Option<String>,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub customer_link: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlockView {
    /// Present a block with its customer link.
    #[must_use]
    pub fn new(block: OrderBlock, customer_link: String) -> Self {
        let status = block.status();
        Self {
            id: block.id,
            reference: block.reference,
            shop: block.shop,
            product_title: block.product_title,
            customer_email: block.customer_email,
            customer_name: block.customer_name,
            note: block.note,
            images: block.images,
            option_groups: block.option_groups,
            shopify_draft_order_id: block.draft_order_id.map(|id| id.gid()),
            status,
            status_label: status.label(),
            customer_link,
            created_at: block.created_at,
            updated_at: block.updated_at,
        }
    }
}

/// A newly created block.
#[derive(Debug, Clone)]
pub struct CreatedBlock {
    pub block: BlockView,
    pub draft_order_id: Option<DraftOrderId>,
}

/// Validate a create request into an insertable block (reference unset).
fn validate(shop: &ShopDomain, request: &CreateBlockRequest) -> Result<NewOrderBlock, AppError> {
    let product_title = request.product_title.trim();
    if product_title.is_empty() {
        return Err(AppError::BadRequest("Product title is required".to_string()));
    }

    let option_groups: Vec<OptionGroup> = request
        .option_groups
        .iter()
        .cloned()
        .map(OptionGroup::clean)
        .collect();
    if option_groups.is_empty() || option_groups.iter().any(|g| g.values.is_empty()) {
        return Err(AppError::BadRequest(
            "At least one option group with at least one value is required".to_string(),
        ));
    }
    if option_groups.iter().any(|g| g.name.is_empty()) {
        return Err(AppError::BadRequest("Option groups need a name".to_string()));
    }

    let customer_email = request
        .customer_email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(Email::parse)
        .transpose()
        .map_err(|e| AppError::BadRequest(format!("Invalid customer email: {e}")))?;

    let images = request
        .images
        .iter()
        .map(|raw| raw.trim())
        .filter(|raw| !raw.is_empty())
        .map(|raw| match url::Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url.to_string()),
            _ => Err(AppError::BadRequest(format!("Invalid image URL: {raw}"))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let text = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    };

    Ok(NewOrderBlock {
        reference: String::new(),
        shop: shop.clone(),
        product_title: product_title.to_string(),
        customer_email,
        customer_name: text(&request.customer_name),
        note: text(&request.note),
        images,
        option_groups,
    })
}

/// Create an order block, optionally with its draft order.
///
/// Draft order creation is best-effort: on failure the block is returned
/// unlinked and the draft order is created at checkout.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for invalid input or a database error.
#[instrument(skip(state, request), fields(shop = %shop))]
pub async fn create_block(
    state: &AppState,
    shop: &ShopDomain,
    request: &CreateBlockRequest,
) -> Result<CreatedBlock, AppError> {
    let mut new_block = validate(shop, request)?;
    new_block.reference = settings::next_reference(state.pool()).await?;

    let repo = OrderBlockRepository::new(state.pool());
    let mut block = repo.create(&new_block).await?;
    tracing::info!(block_id = %block.id, reference = %block.reference, "Created order block");

    let mut draft_order_id = None;
    if request.create_draft_order {
        match eager_draft_order(state, &block).await {
            Ok(id) => {
                block.draft_order_id = Some(id);
                draft_order_id = Some(id);
            }
            Err(e) => {
                tracing::warn!(block_id = %block.id, error = %e, "Deferring draft order to checkout");
            }
        }
    }

    let link = state.config().customer_link(shop, &block.id.to_string());
    Ok(CreatedBlock {
        block: BlockView::new(block, link),
        draft_order_id,
    })
}

async fn eager_draft_order(state: &AppState, block: &OrderBlock) -> Result<DraftOrderId, AppError> {
    let client = state.shopify_for(&block.shop).await?;
    let line_item = DraftOrderLineItemInput::custom(&block.product_title, Price::ZERO);
    let draft_order = client
        .create_draft_order(&block_draft_order_input(block, line_item))
        .await?;
    OrderBlockRepository::new(state.pool())
        .set_draft_order(block.id, draft_order.id)
        .await?;
    Ok(draft_order.id)
}

/// List a shop's blocks, newest first.
///
/// # Errors
///
/// Returns a database error.
#[instrument(skip(state), fields(shop = %shop))]
pub async fn list_blocks(state: &AppState, shop: &ShopDomain) -> Result<Vec<BlockView>, AppError> {
    let blocks = OrderBlockRepository::new(state.pool())
        .list_by_shop(shop)
        .await?;

    Ok(blocks
        .into_iter()
        .map(|block| {
            let link = state.config().customer_link(&block.shop, &block.id.to_string());
            BlockView::new(block, link)
        })
        .collect())
}

/// Delete a block, and its draft order if still open.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the block does not exist, or a database
/// error.
#[instrument(skip(state), fields(shop = %shop, block_id = %id))]
pub async fn delete_block(
    state: &AppState,
    shop: &ShopDomain,
    id: OrderBlockId,
) -> Result<(), AppError> {
    let repo = OrderBlockRepository::new(state.pool());
    let block = repo
        .get(shop, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order block not found".to_string()))?;

    if !repo.delete(shop, id).await? {
        return Err(AppError::NotFound("Order block not found".to_string()));
    }
    tracing::info!(reference = %block.reference, "Deleted order block");

    if let Some(draft_order_id) = block.draft_order_id
        && let Err(e) = delete_open_draft_order(state, shop, draft_order_id).await
    {
        tracing::warn!(draft_order_id = %draft_order_id, error = %e, "Failed to delete draft order");
    }

    Ok(())
}

async fn delete_open_draft_order(
    state: &AppState,
    shop: &ShopDomain,
    id: DraftOrderId,
) -> Result<(), AppError> {
    let client = state.shopify_for(shop).await?;
    match client.get_draft_order(id).await? {
        Some(draft_order) if draft_order.status == DraftOrderStatus::Open => {
            client.delete_draft_order(id).await?;
            tracing::info!(draft_order_id = %id, "Deleted open draft order");
        }
        Some(draft_order) => {
            tracing::debug!(draft_order_id = %id, status = draft_order.status.as_str(), "Keeping draft order");
        }
        None => {}
    }
    Ok(())
}
