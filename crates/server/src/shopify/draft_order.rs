//! Draft order wire types for the Admin REST API.

use chrono::{DateTime, Utc};
use custom_order_core::{DraftOrderId, Price};
use serde::{Deserialize, Deserializer, Serialize};

/// Maximum page size accepted by REST list endpoints.
pub const MAX_PAGE_SIZE: u32 = 250;

/// Draft order status as reported by the REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DraftOrderStatus {
    #[default]
    Open,
    InvoiceSent,
    Completed,
    #[serde(other)]
    Unknown,
}

impl DraftOrderStatus {
    /// Query parameter form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InvoiceSent => "invoice_sent",
            Self::Completed => "completed",
            Self::Unknown => "any",
        }
    }
}

/// A `{name, value}` pair from a draft order's `note_attributes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteAttribute {
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub value: String,
}

impl NoteAttribute {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A draft order line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub quantity: u32,
}

/// A draft order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftOrder {
    pub id: DraftOrderId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: DraftOrderStatus,
    /// Comma-separated tags.
    #[serde(default, deserialize_with = "nullable_string")]
    pub tags: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub note_attributes: Vec<NoteAttribute>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub invoice_url: Option<String>,
    #[serde(default)]
    pub total_price: Price,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Id of the order created on completion.
    #[serde(default)]
    pub order_id: Option<u64>,
}

impl DraftOrder {
    /// Individual tags, trimmed, empty entries dropped.
    pub fn tag_list(&self) -> impl Iterator<Item = &str> {
        self.tags.split(',').map(str::trim).filter(|t| !t.is_empty())
    }

    /// Whether the draft order carries `tag` as a whole tag.
    ///
    /// `t_abc` does not match a draft order tagged `t_abcd`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_list().any(|t| t == tag)
    }

    /// Look a note attribute up by name.
    #[must_use]
    pub fn note_attribute(&self, name: &str) -> Option<&str> {
        self.note_attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Whether checkout has completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == DraftOrderStatus::Completed || self.completed_at.is_some()
    }
}

/// Fields for creating or updating a draft order. `None` fields are left
/// untouched by Shopify.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DraftOrderInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_items: Option<Vec<DraftOrderLineItemInput>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_attributes: Option<Vec<NoteAttribute>>,
    /// Comma-separated tags; replaces existing tags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_customer_default_address: Option<bool>,
}

/// A custom (non-catalog) line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftOrderLineItemInput {
    pub title: String,
    pub price: Price,
    pub quantity: u32,
    pub custom: bool,
}

impl DraftOrderLineItemInput {
    /// A single custom item at `price`.
    #[must_use]
    pub fn custom(title: impl Into<String>, price: Price) -> Self {
        Self {
            title: title.into(),
            price,
            quantity: 1,
            custom: true,
        }
    }
}

/// Customer pre-fill for a draft order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerInput {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl CustomerInput {
    /// Build from an email and a full name split on the first whitespace run.
    #[must_use]
    pub fn from_full_name(email: impl Into<String>, full_name: &str) -> Self {
        let mut parts = full_name.trim().splitn(2, char::is_whitespace);
        let first = parts.next().filter(|s| !s.is_empty()).map(String::from);
        let last = parts
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        Self {
            email: email.into(),
            first_name: first,
            last_name: last,
        }
    }
}

/// Parameters for listing draft orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftOrderListParams {
    /// Page size, capped at [`MAX_PAGE_SIZE`].
    pub limit: u32,
    pub status: Option<DraftOrderStatus>,
    /// Cursor from a previous page. Shopify ignores filters when set.
    pub page_info: Option<String>,
}

impl DraftOrderListParams {
    /// First page of open draft orders.
    #[must_use]
    pub fn open(limit: u32) -> Self {
        Self {
            limit: limit.min(MAX_PAGE_SIZE),
            status: Some(DraftOrderStatus::Open),
            page_info: None,
        }
    }

    /// First page of draft orders in any status.
    #[must_use]
    pub fn any(limit: u32) -> Self {
        Self {
            limit: limit.min(MAX_PAGE_SIZE),
            status: None,
            page_info: None,
        }
    }

    /// The same listing, continued from `cursor`.
    #[must_use]
    pub fn after(&self, cursor: String) -> Self {
        Self {
            page_info: Some(cursor),
            ..self.clone()
        }
    }

    /// Query string pairs.
    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("limit", self.limit.min(MAX_PAGE_SIZE).to_string())];
        if let Some(cursor) = &self.page_info {
            query.push(("page_info", cursor.clone()));
        } else if let Some(status) = self.status {
            query.push(("status", status.as_str().to_string()));
        }
        query
    }
}

/// One page of draft orders.
#[derive(Debug, Clone, Default)]
pub struct DraftOrderPage {
    pub draft_orders: Vec<DraftOrder>,
    /// Cursor of the next page, `None` on the last page.
    pub next_page_info: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DraftOrderEnvelope {
    pub draft_order: DraftOrder,
}

#[derive(Debug, Serialize)]
pub(crate) struct DraftOrderInputEnvelope<'a> {
    pub draft_order: &'a DraftOrderInput,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DraftOrdersEnvelope {
    #[serde(default)]
    pub draft_orders: Vec<DraftOrder>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Metafield {
    pub namespace: String,
    pub key: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MetafieldsEnvelope {
    #[serde(default)]
    pub metafields: Vec<Metafield>,
}

/// Treat JSON `null` as an empty string.
fn nullable_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> DraftOrder {
        serde_json::from_value(json!({
            "id": 994118539,
            "name": "#D2",
            "status": "open",
            "tags": "custom, t_0a1b2c3d",
            "note": null,
            "note_attributes": [
                {"name": "_title", "value": "Walnut Desk"},
                {"name": "_img", "value": null}
            ],
            "line_items": [{"id": 1, "title": "Walnut Desk", "price": "0.00", "quantity": 1}],
            "email": "buyer@example.com",
            "invoice_url": "https://acme.myshopify.com/invoices/abc",
            "total_price": "0.00",
            "currency": "USD",
            "completed_at": null
        }))
        .unwrap()
    }

    #[test]
    fn test_deserialize_rest_payload() {
        let draft_order = sample();
        assert_eq!(draft_order.id, DraftOrderId::new(994_118_539));
        assert_eq!(draft_order.note_attribute("_title"), Some("Walnut Desk"));
        assert_eq!(draft_order.note_attribute("_img"), Some(""));
        assert!(!draft_order.is_completed());
    }

    #[test]
    fn test_unknown_status_is_tolerated() {
        let draft_order: DraftOrder =
            serde_json::from_value(json!({"id": 1, "status": "archived"})).unwrap();
        assert_eq!(draft_order.status, DraftOrderStatus::Unknown);
    }

    #[test]
    fn test_has_tag_matches_whole_tags() {
        let draft_order = sample();
        assert!(draft_order.has_tag("t_0a1b2c3d"));
        assert!(draft_order.has_tag("custom"));
        assert!(!draft_order.has_tag("t_0a1b2c"));
        assert!(!draft_order.has_tag("cust"));
        assert!(!draft_order.has_tag("T_0A1B2C3D"));
    }

    #[test]
    fn test_input_omits_unset_fields() {
        let input = DraftOrderInput {
            tags: Some("custom".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&input).unwrap(), json!({"tags": "custom"}));
    }

    #[test]
    fn test_line_item_input_serializes_price_as_string() {
        let item = DraftOrderLineItemInput::custom("Desk - Size: Large", Price::parse("12.5").unwrap());
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({"title": "Desk - Size: Large", "price": "12.50", "quantity": 1, "custom": true})
        );
    }

    #[test]
    fn test_customer_name_split() {
        let customer = CustomerInput::from_full_name("a@b.c", "  Ada   King Lovelace ");
        assert_eq!(customer.first_name.as_deref(), Some("Ada"));
        assert_eq!(customer.last_name.as_deref(), Some("King Lovelace"));

        let single = CustomerInput::from_full_name("a@b.c", "Cher");
        assert_eq!(single.first_name.as_deref(), Some("Cher"));
        assert!(single.last_name.is_none());
    }

    #[test]
    fn test_list_params_query() {
        let params = DraftOrderListParams::open(500);
        assert_eq!(
            params.query(),
            vec![("limit", "250".to_string()), ("status", "open".to_string())]
        );

        let next = params.after("CURSOR".to_string());
        assert_eq!(
            next.query(),
            vec![("limit", "250".to_string()), ("page_info", "CURSOR".to_string())]
        );
    }
}
