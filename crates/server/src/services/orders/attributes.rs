//! Note attributes carried by the draft orders this app creates.
//!
//! Shopify keeps arbitrary `{name, value}` pairs on a draft order. The app
//! stores everything a customer link needs there, so a draft order can be
//! resolved without any local state:
//!
//! | Key | Value |
//! |---|---|
//! | `_title` | product title |
//! | `_img` | image URL, or the legacy marker `yes` (see metafield) |
//! | `_option_groups` | JSON array of option groups |
//! | `_token` | the customer-link token |
//! | `_template_name` | template name (templates only) |
//! | `_variants` | legacy JSON array of flat variants |
//! | `_block_id` | the order block this draft order was created for |

use custom_order_core::{LegacyVariant, OptionGroup, OrderBlockId};
use serde::de::DeserializeOwned;

use crate::shopify::{DraftOrder, NoteAttribute};

pub const TITLE: &str = "_title";
pub const IMAGE: &str = "_img";
pub const OPTION_GROUPS: &str = "_option_groups";
pub const TOKEN: &str = "_token";
pub const TEMPLATE_NAME: &str = "_template_name";
pub const VARIANTS: &str = "_variants";
pub const BLOCK_ID: &str = "_block_id";

/// `_img` value meaning "the image lives in a metafield".
pub const IMAGE_IN_METAFIELD: &str = "yes";

/// Metafield namespace and key holding the legacy product image.
pub const IMAGE_METAFIELD: (&str, &str) = ("custom_order", "product_image");

/// Tag marking a draft order as a reusable template.
pub const TEMPLATE_TAG: &str = "app_template";

/// Tag marking a draft order created by this app.
pub const CUSTOM_TAG: &str = "custom";

/// Prefix of the tag linking a draft order (and the order it becomes) to an
/// order block.
pub const BLOCK_TAG_PREFIX: &str = "draft-order-app-id-";

/// The tag linking a draft order to `id`.
#[must_use]
pub fn block_tag(id: OrderBlockId) -> String {
    format!("{BLOCK_TAG_PREFIX}{id}")
}

/// Decoded note attributes of a draft order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderAttributes {
    pub title: Option<String>,
    pub image: Option<String>,
    pub option_groups: Vec<OptionGroup>,
    pub token: Option<String>,
    pub template_name: Option<String>,
    pub variants: Vec<LegacyVariant>,
    pub block_id: Option<OrderBlockId>,
}

impl OrderAttributes {
    /// Extract the app's attributes from a draft order.
    ///
    /// Empty values count as absent. JSON lists that fail to decode are
    /// logged and read as empty.
    #[must_use]
    pub fn from_draft_order(draft_order: &DraftOrder) -> Self {
        let text = |name: &str| {
            draft_order
                .note_attribute(name)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };

        Self {
            title: text(TITLE),
            image: text(IMAGE),
            option_groups: json_list(draft_order, OPTION_GROUPS),
            token: text(TOKEN),
            template_name: text(TEMPLATE_NAME),
            variants: json_list(draft_order, VARIANTS),
            block_id: text(BLOCK_ID).and_then(|id| OrderBlockId::parse(&id).ok()),
        }
    }

    /// Product title with the usual fallbacks: the `_title` attribute, then
    /// the first line item, then `default`.
    #[must_use]
    pub fn product_title(&self, draft_order: &DraftOrder, default: &str) -> String {
        self.title
            .clone()
            .or_else(|| {
                draft_order
                    .line_items
                    .first()
                    .map(|item| item.title.trim().to_string())
                    .filter(|t| !t.is_empty())
            })
            .unwrap_or_else(|| default.to_string())
    }
}

/// Serialize option groups for the `_option_groups` attribute.
#[must_use]
pub fn option_groups_attribute(groups: &[OptionGroup]) -> NoteAttribute {
    // A Vec of plain structs always serializes.
    let value = serde_json::to_string(groups).unwrap_or_else(|_| "[]".to_string());
    NoteAttribute::new(OPTION_GROUPS, value)
}

fn json_list<T: DeserializeOwned>(draft_order: &DraftOrder, name: &str) -> Vec<T> {
    let Some(raw) = draft_order.note_attribute(name).filter(|v| !v.trim().is_empty()) else {
        return Vec::new();
    };

    match serde_json::from_str(raw) {
        Ok(list) => list,
        Err(e) => {
            tracing::error!(
                draft_order_id = %draft_order.id,
                attribute = name,
                error = %e,
                "Malformed note attribute JSON"
            );
            Vec::new()
        }
    }
}
