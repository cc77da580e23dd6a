//! Order lifecycle status.

use serde::{Deserialize, Serialize};

/// Where a custom order is in its lifecycle.
///
/// Only two states are tracked locally. Everything between link creation and
/// the purchase webhook is `Pending`; the platform owns the finer-grained
/// draft order states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Waiting for the customer to check out.
    #[default]
    Pending,
    /// A purchase webhook has been received.
    Purchased,
}

impl OrderStatus {
    /// Derive the status from a stored `is_purchased` flag.
    #[must_use]
    pub const fn from_purchased(is_purchased: bool) -> Self {
        if is_purchased {
            Self::Purchased
        } else {
            Self::Pending
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending Checkout",
            Self::Purchased => "Purchased",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Purchased => write!(f, "purchased"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_purchased() {
        assert_eq!(OrderStatus::from_purchased(true), OrderStatus::Purchased);
        assert_eq!(OrderStatus::from_purchased(false), OrderStatus::Pending);
    }

    #[test]
    fn test_serialized_form() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Purchased).ok().as_deref(),
            Some(r#""purchased""#)
        );
    }
}
