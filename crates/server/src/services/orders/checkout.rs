//! Customer checkout.
//!
//! Prices are always computed here from the stored order. The customer only
//! says *what* they picked; anything price-like in the request is ignored.

use custom_order_core::{LegacyVariant, OptionGroup, Price, Selection, price_selection};
use serde::Deserialize;
use tracing::instrument;

use super::attributes::OrderAttributes;
use super::block_draft_order_input;
use super::resolve::{DEFAULT_PRODUCT_TITLE, Resolution, resolve};
use crate::db::OrderBlockRepository;
use crate::error::AppError;
use crate::shopify::{DraftOrder, DraftOrderInput, DraftOrderLineItemInput, ShopifyClient};
use crate::state::AppState;

/// Checkout request from the customer page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub shop: Option<String>,
    /// One pick per option group.
    #[serde(default)]
    pub selections: Option<Vec<Selection>>,
    /// Legacy variant id (string or number).
    #[serde(default)]
    pub variant_id: Option<serde_json::Value>,
    /// Legacy variant name.
    #[serde(default)]
    pub variant_name: Option<String>,
}

impl CheckoutRequest {
    fn variant_id(&self) -> Option<String> {
        match self.variant_id.as_ref()? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn variant_name(&self) -> Option<&str> {
        self.variant_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

/// Turn the customer's choice into a checkout URL.
///
/// # Errors
///
/// Returns the resolution errors, `AppError::Conflict` if the order is
/// already purchased, `AppError::BadRequest` for an invalid choice, and
/// `AppError::BadGateway` if Shopify returns no invoice URL.
#[instrument(skip(state, request))]
pub async fn process_checkout(
    state: &AppState,
    request: &CheckoutRequest,
) -> Result<String, AppError> {
    let (client, resolution) =
        resolve(state, request.token.as_deref(), request.shop.as_deref()).await?;

    if resolution.is_purchased() {
        return Err(AppError::Conflict(
            "This order has already been purchased".to_string(),
        ));
    }

    let draft_order = match resolution {
        Resolution::Block { block, draft_order } => {
            let line_item = choose_line_item(
                &block.product_title,
                &block.option_groups,
                &[],
                request,
            )?;

            match draft_order {
                Some(existing) => replace_line_items(&client, &existing, line_item).await?,
                None => {
                    let created = client
                        .create_draft_order(&block_draft_order_input(&block, line_item))
                        .await?;
                    tracing::info!(
                        block_id = %block.id,
                        draft_order_id = %created.id,
                        "Created draft order for order block"
                    );
                    OrderBlockRepository::new(state.pool())
                        .set_draft_order(block.id, created.id)
                        .await?;
                    created
                }
            }
        }
        Resolution::Token { draft_order, .. } => {
            let attrs = OrderAttributes::from_draft_order(&draft_order);
            let title = attrs.product_title(&draft_order, DEFAULT_PRODUCT_TITLE);
            let line_item =
                choose_line_item(&title, &attrs.option_groups, &attrs.variants, request)?;
            replace_line_items(&client, &draft_order, line_item).await?
        }
    };

    draft_order
        .invoice_url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| {
            tracing::error!(draft_order_id = %draft_order.id, "Draft order has no invoice URL");
            AppError::BadGateway("Checkout is not available for this order".to_string())
        })
}

async fn replace_line_items(
    client: &ShopifyClient,
    draft_order: &DraftOrder,
    line_item: DraftOrderLineItemInput,
) -> Result<DraftOrder, AppError> {
    let input = DraftOrderInput {
        line_items: Some(vec![line_item]),
        ..DraftOrderInput::default()
    };
    Ok(client.update_draft_order(draft_order.id, &input).await?)
}

/// Pick and price the single line item for a checkout.
///
/// Option-group selections win; then a legacy variant by id or name; an
/// order with nothing to choose checks out as one free item.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the choice does not match the order.
pub fn choose_line_item(
    product_title: &str,
    groups: &[OptionGroup],
    variants: &[LegacyVariant],
    request: &CheckoutRequest,
) -> Result<DraftOrderLineItemInput, AppError> {
    if let Some(selections) = &request.selections {
        let priced = price_selection(groups, selections)
            .map_err(|e| AppError::BadRequest(format!("Invalid selection: {e}")))?;
        let title = if priced.title.is_empty() {
            product_title.to_string()
        } else {
            format!("{product_title} - {}", priced.title)
        };
        return Ok(DraftOrderLineItemInput::custom(title, priced.total));
    }

    let by_id = request.variant_id();
    let by_name = request.variant_name();
    if by_id.is_some() || by_name.is_some() {
        let variant = variants
            .iter()
            .find(|v| match by_id.as_deref() {
                Some(id) => v.id == id,
                None => Some(v.name.as_str()) == by_name,
            })
            .ok_or_else(|| AppError::BadRequest("Unknown variant".to_string()))?;
        let title = if variant.name.trim().is_empty() {
            product_title.to_string()
        } else {
            variant.name.clone()
        };
        return Ok(DraftOrderLineItemInput::custom(title, variant.price));
    }

    let has_choices = groups.iter().any(|g| !g.values.is_empty()) || !variants.is_empty();
    if has_choices {
        return Err(AppError::BadRequest("Please select your options".to_string()));
    }

    Ok(DraftOrderLineItemInput::custom(product_title, Price::ZERO))
}
