//! Admin creation of draft orders and templates.

use custom_order_core::{Email, OptionGroup, OrderToken, Price, ShopDomain};
use serde::Deserialize;
use tracing::instrument;

use super::attributes::{self, option_groups_attribute};
use super::rejected_by_shopify;
use crate::db::OrderTokenRepository;
use crate::error::AppError;
use crate::shopify::{
    CustomerInput, DraftOrder, DraftOrderInput, DraftOrderLineItemInput, NoteAttribute,
};
use crate::state::AppState;

/// Body of `POST /api/draft-order`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDraftOrderRequest {
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub product_title: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub option_groups: Option<Vec<OptionGroup>>,
    /// Image URL.
    #[serde(default)]
    pub product_image: Option<String>,
    #[serde(default)]
    pub is_template: bool,
    #[serde(default)]
    pub template_name: Option<String>,
}

/// What was created.
#[derive(Debug, Clone)]
pub enum CreatedOrder {
    Template(DraftOrder),
    Customer {
        draft_order: DraftOrder,
        token: OrderToken,
        customer_link: String,
    },
}

/// A validated request.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Plan {
    Template {
        name: String,
        title: String,
    },
    Customer {
        email: Email,
        name: String,
        title: String,
    },
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate(request: &CreateDraftOrderRequest) -> Result<Plan, AppError> {
    let title = non_empty(request.product_title.as_ref());

    if request.is_template {
        let (Some(name), Some(title)) = (non_empty(request.template_name.as_ref()), title) else {
            return Err(AppError::BadRequest(
                "Template Name and Product Title required".to_string(),
            ));
        };
        return Ok(Plan::Template { name, title });
    }

    let (Some(email), Some(name), Some(title), Some(_)) = (
        non_empty(request.customer_email.as_ref()),
        non_empty(request.customer_name.as_ref()),
        title,
        request.option_groups.as_ref(),
    ) else {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    };

    let email = Email::parse(&email)
        .map_err(|e| AppError::BadRequest(format!("Invalid customer email: {e}")))?;
    Ok(Plan::Customer { email, name, title })
}

/// Build the draft order input for a validated request.
fn build_input(
    plan: &Plan,
    request: &CreateDraftOrderRequest,
    token: Option<&OrderToken>,
) -> DraftOrderInput {
    let groups: Vec<OptionGroup> = request
        .option_groups
        .clone()
        .unwrap_or_default()
        .into_iter()
        .map(OptionGroup::clean)
        .collect();
    let image = non_empty(request.product_image.as_ref()).unwrap_or_default();

    let (title, tags, extra) = match (plan, token) {
        (Plan::Template { name, title }, _) => (
            title,
            attributes::TEMPLATE_TAG.to_string(),
            NoteAttribute::new(attributes::TEMPLATE_NAME, name),
        ),
        (Plan::Customer { title, .. }, token) => (
            title,
            format!(
                "{},{}",
                attributes::CUSTOM_TAG,
                token.map(OrderToken::tag).unwrap_or_default()
            ),
            NoteAttribute::new(
                attributes::TOKEN,
                token.map(OrderToken::as_str).unwrap_or_default(),
            ),
        ),
    };

    let (email, customer) = match plan {
        Plan::Customer { email, name, .. } => (
            Some(email.as_str().to_string()),
            Some(CustomerInput::from_full_name(email.as_str(), name)),
        ),
        Plan::Template { .. } => (None, None),
    };

    DraftOrderInput {
        line_items: Some(vec![DraftOrderLineItemInput::custom(title, Price::ZERO)]),
        note: Some(request.note.clone().unwrap_or_default()),
        note_attributes: Some(vec![
            NoteAttribute::new(attributes::TITLE, title),
            NoteAttribute::new(attributes::IMAGE, image),
            option_groups_attribute(&groups),
            extra,
        ]),
        tags: Some(tags),
        email,
        customer,
        use_customer_default_address: Some(false),
    }
}

/// Create a customer draft order (with its link) or a template.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for missing fields or when Shopify rejects
/// the draft order, or another error if Shopify is unreachable.
#[instrument(skip(state, request), fields(shop = %shop, is_template = request.is_template))]
pub async fn create_draft_order(
    state: &AppState,
    shop: &ShopDomain,
    request: &CreateDraftOrderRequest,
) -> Result<CreatedOrder, AppError> {
    let plan = validate(request)?;
    let client = state.shopify_for(shop).await?;

    if matches!(plan, Plan::Template { .. }) {
        let draft_order = client
            .create_draft_order(&build_input(&plan, request, None))
            .await
            .map_err(rejected_by_shopify)?;
        tracing::info!(draft_order_id = %draft_order.id, "Created template");
        return Ok(CreatedOrder::Template(draft_order));
    }

    let token = OrderToken::generate();
    let draft_order = client
        .create_draft_order(&build_input(&plan, request, Some(&token)))
        .await
        .map_err(rejected_by_shopify)?;

    if let Err(e) = OrderTokenRepository::new(state.pool())
        .upsert(shop, &token, draft_order.id)
        .await
    {
        // Resolution falls back to scanning tags.
        tracing::error!(token = %token, draft_order_id = %draft_order.id, error = %e, "Failed to index token");
    }

    let customer_link = state.config().customer_link(shop, token.as_str());
    tracing::info!(draft_order_id = %draft_order.id, token = %token, "Created custom order");

    Ok(CreatedOrder::Customer {
        draft_order,
        token,
        customer_link,
    })
}
