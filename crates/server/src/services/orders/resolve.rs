//! Order-token resolution.
//!
//! A customer link carries `?token=<t>&shop=<shop>`. The token is either an
//! order block id (UUID) or a short hex token tagged onto a draft order as
//! `t_<token>`. Hex tokens are looked up in the `order_tokens` index first;
//! on a miss or a stale entry, recent draft orders are scanned for the tag
//! and a hit is written back into the index.

use custom_order_core::{
    DraftOrderId, LegacyVariant, OptionGroup, OrderBlockId, OrderRef, OrderToken, Price,
    ShopDomain,
};
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use super::attributes::{self, OrderAttributes};
use super::parse_shop;
use crate::db::{OrderBlock, OrderBlockRepository, OrderTokenRepository};
use crate::error::AppError;
use crate::shopify::{DraftOrder, DraftOrderListParams, MAX_PAGE_SIZE, ShopifyClient};
use crate::state::AppState;

/// Title used when a draft order carries none.
pub(crate) const DEFAULT_PRODUCT_TITLE: &str = "Custom Order";

/// Where a customer link led.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// A local order block, with its draft order if one is linked and still
    /// exists.
    Block {
        block: OrderBlock,
        draft_order: Option<DraftOrder>,
    },
    /// A draft order found through its token.
    Token {
        token: OrderToken,
        draft_order: DraftOrder,
        /// Purchase flag from the token index.
        purchased: bool,
    },
}

impl Resolution {
    /// The linked draft order, if any.
    #[must_use]
    pub const fn draft_order(&self) -> Option<&DraftOrder> {
        match self {
            Self::Block { draft_order, .. } => draft_order.as_ref(),
            Self::Token { draft_order, .. } => Some(draft_order),
        }
    }

    /// Whether the order has been paid for, by any account.
    #[must_use]
    pub fn is_purchased(&self) -> bool {
        let completed = self.draft_order().is_some_and(DraftOrder::is_completed);
        match self {
            Self::Block { block, .. } => block.is_purchased || completed,
            Self::Token { purchased, .. } => *purchased || completed,
        }
    }
}

/// The customer-facing view of a resolved order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedOrder {
    pub draft_order_id: Option<DraftOrderId>,
    pub block_id: Option<OrderBlockId>,
    pub product_title: String,
    pub product_image: Option<String>,
    pub images: Vec<String>,
    pub note: String,
    pub option_groups: Vec<OptionGroup>,
    pub variants: Vec<LegacyVariant>,
    pub price: Price,
    pub currency: Option<String>,
    pub customer_email: Option<String>,
    pub shop: ShopDomain,
    pub is_purchased: bool,
}

/// Validate the raw link parameters.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if either is missing or malformed.
pub fn parse_link(
    token: Option<&str>,
    shop: Option<&str>,
) -> Result<(ShopDomain, OrderRef), AppError> {
    let (Some(token), Some(shop)) = (
        token.filter(|t| !t.trim().is_empty()),
        shop.filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(AppError::BadRequest("Missing token or shop".to_string()));
    };

    let shop = parse_shop(Some(shop))?;
    let order_ref = OrderRef::parse(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected order token");
        AppError::BadRequest("Invalid token".to_string())
    })?;
    Ok((shop, order_ref))
}

/// Find the order a customer link points at.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for malformed input, `AppError::Unauthorized`
/// if the shop is not installed, `AppError::NotFound` if nothing matches, or
/// a Shopify/database error.
#[instrument(skip(state, token, shop))]
pub async fn resolve(
    state: &AppState,
    token: Option<&str>,
    shop: Option<&str>,
) -> Result<(ShopifyClient, Resolution), AppError> {
    let (shop, order_ref) = parse_link(token, shop)?;
    let client = state.shopify_for(&shop).await?;

    let resolution = match order_ref {
        OrderRef::Block(id) => resolve_block(state.pool(), &client, id).await?,
        OrderRef::Token(token) => {
            resolve_token(
                state.pool(),
                &client,
                token,
                state.config().shopify.scan_pages,
            )
            .await?
        }
    };

    Ok((client, resolution))
}

/// Resolve a customer link into its customer-facing view.
///
/// # Errors
///
/// See [`resolve`].
pub async fn resolve_order(
    state: &AppState,
    token: Option<&str>,
    shop: Option<&str>,
) -> Result<ResolvedOrder, AppError> {
    let (client, resolution) = resolve(state, token, shop).await?;
    Ok(view(&client, resolution).await)
}

async fn resolve_block(
    pool: &PgPool,
    client: &ShopifyClient,
    id: OrderBlockId,
) -> Result<Resolution, AppError> {
    let block = OrderBlockRepository::new(pool)
        .get(client.shop(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    let draft_order = match block.draft_order_id {
        Some(draft_order_id) => {
            let found = client.get_draft_order(draft_order_id).await?;
            if found.is_none() {
                tracing::warn!(
                    block_id = %block.id,
                    draft_order_id = %draft_order_id,
                    "Linked draft order no longer exists"
                );
            }
            found
        }
        None => None,
    };

    Ok(Resolution::Block { block, draft_order })
}

async fn resolve_token(
    pool: &PgPool,
    client: &ShopifyClient,
    token: OrderToken,
    scan_pages: u32,
) -> Result<Resolution, AppError> {
    let shop = client.shop();
    let tokens = OrderTokenRepository::new(pool);
    let tag = token.tag();

    match tokens.find(shop, &token).await {
        Ok(Some(entry)) => match client.get_draft_order(entry.draft_order_id).await? {
            Some(draft_order) if draft_order.has_tag(&tag) => {
                return Ok(Resolution::Token {
                    token,
                    draft_order,
                    purchased: entry.is_purchased,
                });
            }
            _ => {
                tracing::info!(
                    token = %token,
                    draft_order_id = %entry.draft_order_id,
                    "Dropping stale token index entry"
                );
                if let Err(e) = tokens.delete(shop, &token).await {
                    tracing::error!(token = %token, error = %e, "Failed to delete stale token");
                }
            }
        },
        Ok(None) => {}
        Err(e) => {
            tracing::error!(token = %token, error = %e, "Token index lookup failed, scanning");
        }
    }

    let Some(draft_order) = scan_for_tag(client, &tag, scan_pages).await? else {
        return Err(AppError::NotFound("Order not found".to_string()));
    };

    if let Err(e) = tokens.upsert(shop, &token, draft_order.id).await {
        tracing::error!(token = %token, error = %e, "Failed to index token");
    }

    Ok(Resolution::Token {
        token,
        draft_order,
        purchased: false,
    })
}

/// Page through draft orders looking for one carrying `tag`.
#[instrument(skip(client), fields(shop = %client.shop()))]
async fn scan_for_tag(
    client: &ShopifyClient,
    tag: &str,
    max_pages: u32,
) -> Result<Option<DraftOrder>, AppError> {
    let mut params = DraftOrderListParams::any(MAX_PAGE_SIZE);

    for page_number in 1..=max_pages {
        let page = client.list_draft_orders(&params).await?;
        let scanned = page.draft_orders.len();

        if let Some(found) = page.draft_orders.into_iter().find(|d| d.has_tag(tag)) {
            tracing::info!(draft_order_id = %found.id, page = page_number, "Found draft order by tag");
            return Ok(Some(found));
        }

        match page.next_page_info {
            Some(cursor) if scanned > 0 => params = params.after(cursor),
            _ => break,
        }
    }

    tracing::info!(max_pages, "No draft order carries the tag");
    Ok(None)
}

/// Build the customer-facing view.
async fn view(client: &ShopifyClient, resolution: Resolution) -> ResolvedOrder {
    let is_purchased = resolution.is_purchased();

    match resolution {
        Resolution::Block { block, draft_order } => ResolvedOrder {
            draft_order_id: draft_order.as_ref().map(|d| d.id),
            block_id: Some(block.id),
            product_title: block.product_title,
            product_image: block.images.first().cloned(),
            images: block.images,
            note: block.note.unwrap_or_default(),
            option_groups: block.option_groups,
            variants: Vec::new(),
            price: draft_order.as_ref().map_or(Price::ZERO, |d| d.total_price),
            currency: draft_order.and_then(|d| d.currency),
            customer_email: block.customer_email.map(|e| e.as_str().to_string()),
            shop: block.shop,
            is_purchased,
        },
        Resolution::Token { draft_order, .. } => {
            let attrs = OrderAttributes::from_draft_order(&draft_order);
            let product_image = product_image(client, &draft_order, attrs.image.as_deref()).await;

            ResolvedOrder {
                draft_order_id: Some(draft_order.id),
                block_id: attrs.block_id,
                product_title: attrs.product_title(&draft_order, DEFAULT_PRODUCT_TITLE),
                images: product_image.iter().cloned().collect(),
                product_image,
                note: draft_order.note.unwrap_or_default(),
                option_groups: attrs.option_groups,
                variants: attrs.variants,
                price: draft_order.total_price,
                currency: draft_order.currency,
                customer_email: draft_order.email,
                shop: client.shop().clone(),
                is_purchased,
            }
        }
    }
}

/// The `_img` attribute as a URL, reading the metafield for the legacy
/// `yes` marker. Metafield failures only lose the image.
async fn product_image(
    client: &ShopifyClient,
    draft_order: &DraftOrder,
    image: Option<&str>,
) -> Option<String> {
    match image {
        None => None,
        Some(attributes::IMAGE_IN_METAFIELD) => {
            let (namespace, key) = attributes::IMAGE_METAFIELD;
            client
                .get_draft_order_metafield(draft_order.id, namespace, key)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(
                        draft_order_id = %draft_order.id,
                        error = %e,
                        "Failed to read product image metafield"
                    );
                    None
                })
        }
        Some(url) => Some(url.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_link_requires_both() {
        let err = parse_link(None, Some("acme.myshopify.com")).unwrap_err();
        assert_eq!(err.to_string(), "Missing token or shop");
        let err = parse_link(Some("0a1b2c3d"), Some("")).unwrap_err();
        assert_eq!(err.to_string(), "Missing token or shop");
    }

    #[test]
    fn test_parse_link_forms() {
        let (shop, order_ref) = parse_link(Some("0a1b2c3d"), Some("acme.myshopify.com")).unwrap();
        assert_eq!(shop.as_str(), "acme.myshopify.com");
        assert!(matches!(order_ref, OrderRef::Token(_)));

        let (_, order_ref) = parse_link(
            Some("6f1c2b4e-9d3a-4c5e-8f7a-1b2c3d4e5f60"),
            Some("acme.myshopify.com"),
        )
        .unwrap();
        assert!(matches!(order_ref, OrderRef::Block(_)));
    }

    #[test]
    fn test_parse_link_rejects_bad_input() {
        assert_eq!(
            parse_link(Some("not a token!"), Some("acme.myshopify.com"))
                .unwrap_err()
                .to_string(),
            "Invalid token"
        );
        assert_eq!(
            parse_link(Some("0a1b2c3d"), Some("example.com"))
                .unwrap_err()
                .to_string(),
            "Invalid shop domain"
        );
    }
}
