//! Custom order services.
//!
//! A custom order lives in one of two places:
//!
//! - a Shopify draft order created up front and found again through the
//!   `t_<token>` tag (`create`), or
//! - a local order block that only becomes a draft order when the customer
//!   checks out (`blocks`).
//!
//! Customer links carry either form; `resolve` turns them back into an
//! order and `checkout` prices the customer's choice and hands back a
//! Shopify invoice URL.

pub mod attributes;
pub mod blocks;
pub mod checkout;
pub mod create;
pub mod resolve;
pub mod templates;

pub use attributes::OrderAttributes;
pub use blocks::{
    BlockView, CreateBlockRequest, CreatedBlock, create_block, delete_block, list_blocks,
};
pub use checkout::{CheckoutRequest, process_checkout};
pub use create::{CreateDraftOrderRequest, CreatedOrder, create_draft_order};
pub use resolve::{Resolution, ResolvedOrder, resolve_order};
pub use templates::{TemplateSummary, list_templates};

use custom_order_core::ShopDomain;

use crate::db::OrderBlock;
use crate::error::AppError;
use crate::shopify::{
    CustomerInput, DraftOrderInput, DraftOrderLineItemInput, NoteAttribute, ShopifyError,
};

/// Parse a shop domain supplied by a caller.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the value is missing or not a
/// `*.myshopify.com` domain.
pub fn parse_shop(raw: Option<&str>) -> Result<ShopDomain, AppError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
        AppError::BadRequest("Missing shop".to_string())
    })?;
    ShopDomain::parse(raw).map_err(|e| {
        tracing::debug!(shop = raw, error = %e, "Rejected shop domain");
        AppError::BadRequest("Invalid shop domain".to_string())
    })
}

/// Map a Shopify failure on merchant input: any error response with a body
/// becomes a 400 carrying Shopify's own message. Rate limits, credential
/// and transport failures keep their own status.
pub(crate) fn rejected_by_shopify(err: ShopifyError) -> AppError {
    match err {
        ShopifyError::Api { status, message } => {
            tracing::warn!(status, message = %message, "Shopify rejected draft order");
            AppError::BadRequest(message)
        }
        other => AppError::Shopify(other),
    }
}

/// Draft order input for an order block, with `line_item` as its only item.
#[must_use]
pub(crate) fn block_draft_order_input(
    block: &OrderBlock,
    line_item: DraftOrderLineItemInput,
) -> DraftOrderInput {
    let image = block.images.first().cloned().unwrap_or_default();

    DraftOrderInput {
        line_items: Some(vec![line_item]),
        note: Some(block.note.clone().unwrap_or_default()),
        note_attributes: Some(vec![
            NoteAttribute::new(attributes::TITLE, &block.product_title),
            NoteAttribute::new(attributes::IMAGE, image),
            attributes::option_groups_attribute(&block.option_groups),
            NoteAttribute::new(attributes::BLOCK_ID, block.id.to_string()),
        ]),
        tags: Some(format!(
            "{},{}",
            attributes::CUSTOM_TAG,
            attributes::block_tag(block.id)
        )),
        email: block.customer_email.as_ref().map(|e| e.as_str().to_string()),
        customer: block.customer_email.as_ref().map(|email| {
            CustomerInput::from_full_name(
                email.as_str(),
                block.customer_name.as_deref().unwrap_or_default(),
            )
        }),
        use_customer_default_address: Some(false),
    }
}
