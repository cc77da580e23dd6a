//! Option groups, legacy variants and customer selections.
//!
//! A custom order carries a list of option groups, each a named set of
//! values with a label and a price delta:
//!
//! ```json
//! [{"name": "Size", "values": [{"id": "1", "label": "Large", "price": "5"}]}]
//! ```
//!
//! Older links carry a flat list of variants (`{id, name, price}`) instead.

use serde::{Deserialize, Deserializer, Serialize};

use super::price::Price;

/// Separator between the parts of a selection title.
const TITLE_SEPARATOR: &str = " / ";

/// One selectable value within an [`OptionGroup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionValue {
    /// Client-assigned identifier, unique within its group.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Text shown to the customer.
    #[serde(default)]
    pub label: String,
    /// Amount added to the order total when selected.
    #[serde(default)]
    pub price: Price,
}

/// A named set of values the customer picks exactly one of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionGroup {
    /// Group name, e.g. "Size".
    #[serde(default)]
    pub name: String,
    /// Selectable values.
    #[serde(default)]
    pub values: Vec<OptionValue>,
}

impl OptionGroup {
    /// Normalize a group as entered by the merchant: names, labels and ids
    /// are trimmed. Missing prices already deserialize as zero.
    #[must_use]
    pub fn clean(self) -> Self {
        Self {
            name: self.name.trim().to_owned(),
            values: self
                .values
                .into_iter()
                .map(|v| OptionValue {
                    id: v.id.trim().to_owned(),
                    label: v.label.trim().to_owned(),
                    price: v.price,
                })
                .collect(),
        }
    }

    /// Look up a value by id.
    #[must_use]
    pub fn find_value(&self, id: &str) -> Option<&OptionValue> {
        self.values.iter().find(|v| v.id == id)
    }
}

/// A flat variant from links created before option groups existed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyVariant {
    /// Client-assigned identifier.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Variant name, used as the line item title.
    #[serde(default)]
    pub name: String,
    /// Variant price.
    #[serde(default)]
    pub price: Price,
}

/// The customer's pick within one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Group name.
    pub group: String,
    /// Id of the chosen value.
    #[serde(deserialize_with = "string_or_number")]
    pub value_id: String,
}

/// A priced set of selections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedSelection {
    /// Sum of the chosen values' prices.
    pub total: Price,
    /// `"Group: Label / Group2: Label"`, in group order.
    pub title: String,
}

/// Errors that can occur when pricing selections.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// A group has no selection.
    #[error("no option selected for {0}")]
    MissingGroup(String),
    /// A group was selected more than once.
    #[error("more than one option selected for {0}")]
    DuplicateGroup(String),
    /// A selection names a group that does not exist.
    #[error("unknown option group {0}")]
    UnknownGroup(String),
    /// A selection names a value that does not exist in its group.
    #[error("unknown option {value_id} for {group}")]
    UnknownValue {
        /// Group name.
        group: String,
        /// Requested value id.
        value_id: String,
    },
    /// The selected prices add up to more than a price can hold.
    #[error("total price is too large")]
    Overflow,
}

/// Price a customer's selections against the stored option groups.
///
/// Every group must be answered exactly once with an existing value, and
/// only known groups may be named. Groups without values are skipped.
///
/// # Errors
///
/// Returns the first [`SelectionError`] found, checking groups in order.
pub fn price_selection(
    groups: &[OptionGroup],
    selections: &[Selection],
) -> Result<PricedSelection, SelectionError> {
    if let Some(unknown) = selections
        .iter()
        .find(|s| !groups.iter().any(|g| g.name == s.group))
    {
        return Err(SelectionError::UnknownGroup(unknown.group.clone()));
    }

    let mut total = Price::ZERO;
    let mut parts = Vec::with_capacity(groups.len());

    for group in groups.iter().filter(|g| !g.values.is_empty()) {
        let mut picks = selections.iter().filter(|s| s.group == group.name);
        let pick = picks
            .next()
            .ok_or_else(|| SelectionError::MissingGroup(group.name.clone()))?;
        if picks.next().is_some() {
            return Err(SelectionError::DuplicateGroup(group.name.clone()));
        }

        let value =
            group
                .find_value(&pick.value_id)
                .ok_or_else(|| SelectionError::UnknownValue {
                    group: group.name.clone(),
                    value_id: pick.value_id.clone(),
                })?;

        total = total
            .checked_add(value.price)
            .ok_or(SelectionError::Overflow)?;
        parts.push(format!("{}: {}", group.name, value.label));
    }

    Ok(PricedSelection {
        total,
        title: parts.join(TITLE_SEPARATOR),
    })
}

/// Accept ids written either as JSON strings or numbers.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn groups() -> Vec<OptionGroup> {
        serde_json::from_str(
            r#"[
                {"name": "Size", "values": [
                    {"id": "s", "label": "Small", "price": "0"},
                    {"id": "l", "label": "Large", "price": "5.50"}
                ]},
                {"name": "Finish", "values": [
                    {"id": 1, "label": "Matte"},
                    {"id": 2, "label": "Gloss", "price": 2}
                ]}
            ]"#,
        )
        .unwrap()
    }

    fn pick(group: &str, value_id: &str) -> Selection {
        Selection {
            group: group.to_string(),
            value_id: value_id.to_string(),
        }
    }

    #[test]
    fn test_deserialize_defaults_missing_price_and_numeric_ids() {
        let groups = groups();
        let matte = &groups[1].values[0];
        assert_eq!(matte.id, "1");
        assert_eq!(matte.price, Price::ZERO);
    }

    #[test]
    fn test_price_selection_sums_and_titles() {
        let priced = price_selection(&groups(), &[pick("Size", "l"), pick("Finish", "2")]).unwrap();
        assert_eq!(priced.total.to_string(), "7.50");
        assert_eq!(priced.title, "Size: Large / Finish: Gloss");
    }

    #[test]
    fn test_price_selection_title_follows_group_order() {
        let priced = price_selection(&groups(), &[pick("Finish", "1"), pick("Size", "s")]).unwrap();
        assert_eq!(priced.title, "Size: Small / Finish: Matte");
    }

    #[test]
    fn test_price_selection_missing_group() {
        let err = price_selection(&groups(), &[pick("Size", "l")]).unwrap_err();
        assert_eq!(err, SelectionError::MissingGroup("Finish".to_string()));
    }

    #[test]
    fn test_price_selection_duplicate_group() {
        let err = price_selection(
            &groups(),
            &[pick("Size", "l"), pick("Size", "s"), pick("Finish", "1")],
        )
        .unwrap_err();
        assert_eq!(err, SelectionError::DuplicateGroup("Size".to_string()));
    }

    #[test]
    fn test_price_selection_unknown_group_and_value() {
        let err = price_selection(&groups(), &[pick("Color", "red")]).unwrap_err();
        assert_eq!(err, SelectionError::UnknownGroup("Color".to_string()));

        let err =
            price_selection(&groups(), &[pick("Size", "xl"), pick("Finish", "1")]).unwrap_err();
        assert!(matches!(err, SelectionError::UnknownValue { .. }));
    }

    #[test]
    fn test_price_selection_overflowing_total() {
        let groups: Vec<OptionGroup> = serde_json::from_str(
            r#"[
                {"name": "Frame", "values": [
                    {"id": "a", "label": "Gold", "price": "79228162514264337593543950335"}
                ]},
                {"name": "Stone", "values": [
                    {"id": "b", "label": "Ruby", "price": "79228162514264337593543950335"}
                ]}
            ]"#,
        )
        .unwrap();

        let err = price_selection(&groups, &[pick("Frame", "a"), pick("Stone", "b")]).unwrap_err();
        assert_eq!(err, SelectionError::Overflow);
    }

    #[test]
    fn test_price_selection_skips_empty_groups() {
        let groups = vec![OptionGroup {
            name: "Engraving".to_string(),
            values: vec![],
        }];
        let priced = price_selection(&groups, &[]).unwrap();
        assert_eq!(priced.total, Price::ZERO);
        assert!(priced.title.is_empty());
    }

    #[test]
    fn test_clean_trims() {
        let group = OptionGroup {
            name: "  Size ".to_string(),
            values: vec![OptionValue {
                id: " a ".to_string(),
                label: " Large ".to_string(),
                price: Price::ZERO,
            }],
        }
        .clean();
        assert_eq!(group.name, "Size");
        assert_eq!(group.values[0].label, "Large");
        assert!(group.find_value("a").is_some());
    }
}
