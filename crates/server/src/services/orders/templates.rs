//! Reusable order templates: open draft orders tagged `app_template`.

use custom_order_core::{DraftOrderId, OptionGroup, ShopDomain};
use serde::Serialize;
use tracing::instrument;

use super::attributes::{OrderAttributes, TEMPLATE_TAG};
use crate::error::AppError;
use crate::shopify::{DraftOrder, DraftOrderListParams};
use crate::state::AppState;

/// Page size for the template listing.
const TEMPLATE_PAGE_SIZE: u32 = 50;

/// A template as shown in the admin picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    pub id: DraftOrderId,
    pub name: String,
    pub option_groups: Vec<OptionGroup>,
    pub product_title: Option<String>,
    pub img: Option<String>,
}

impl TemplateSummary {
    /// Summarize a template draft order.
    #[must_use]
    pub fn from_draft_order(draft_order: &DraftOrder) -> Self {
        let attrs = OrderAttributes::from_draft_order(draft_order);
        let name = match attrs.template_name {
            Some(name) => name,
            None => OrderAttributes::default().product_title(draft_order, "Untitled Template"),
        };

        Self {
            id: draft_order.id,
            name,
            option_groups: attrs.option_groups,
            product_title: attrs.title,
            img: attrs.image,
        }
    }
}

/// List the shop's templates.
///
/// # Errors
///
/// Returns an error if the shop is not installed or Shopify fails.
#[instrument(skip(state), fields(shop = %shop))]
pub async fn list_templates(
    state: &AppState,
    shop: &ShopDomain,
) -> Result<Vec<TemplateSummary>, AppError> {
    let client = state.shopify_for(shop).await?;
    let page = client
        .list_draft_orders(&DraftOrderListParams::open(TEMPLATE_PAGE_SIZE))
        .await?;

    Ok(page
        .draft_orders
        .iter()
        .filter(|d| d.has_tag(TEMPLATE_TAG))
        .map(TemplateSummary::from_draft_order)
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template(attributes: serde_json::Value, line_title: &str) -> DraftOrder {
        serde_json::from_value(json!({
            "id": 77,
            "tags": "app_template",
            "note_attributes": attributes,
            "line_items": [{"title": line_title, "price": "0.00", "quantity": 1}]
        }))
        .unwrap()
    }

    #[test]
    fn test_summary_uses_template_name() {
        let order = template(
            json!([
                {"name": "_template_name", "value": "Ring sizes"},
                {"name": "_title", "value": "Ring"},
                {"name": "_img", "value": "https://cdn.example.com/r.png"},
                {"name": "_option_groups", "value": r#"[{"name":"Size","values":[]}]"#}
            ]),
            "Ring",
        );
        let summary = TemplateSummary::from_draft_order(&order);
        assert_eq!(summary.id, DraftOrderId::new(77));
        assert_eq!(summary.name, "Ring sizes");
        assert_eq!(summary.product_title.as_deref(), Some("Ring"));
        assert_eq!(summary.option_groups.len(), 1);
        assert_eq!(summary.img.as_deref(), Some("https://cdn.example.com/r.png"));
    }

    #[test]
    fn test_summary_name_fallbacks() {
        let order = template(json!([{"name": "_title", "value": "Ignored"}]), "Line Title");
        assert_eq!(TemplateSummary::from_draft_order(&order).name, "Line Title");

        let order = template(json!([]), "");
        assert_eq!(
            TemplateSummary::from_draft_order(&order).name,
            "Untitled Template"
        );
    }

    #[test]
    fn test_serializes_camel_case() {
        let order = template(json!([]), "Desk");
        let value = serde_json::to_value(TemplateSummary::from_draft_order(&order)).unwrap();
        assert!(value.get("optionGroups").is_some());
        assert!(value.get("productTitle").is_some());
    }
}
