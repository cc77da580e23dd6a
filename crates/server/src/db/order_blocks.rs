//! Order block repository.
//!
//! An order block is a custom order stored locally. It becomes a Shopify
//! draft order lazily, at checkout (or eagerly on request), and the draft
//! order's gid is written back onto the block.

use chrono::{DateTime, Utc};
use custom_order_core::{DraftOrderId, Email, OptionGroup, OrderBlockId, OrderStatus, ShopDomain};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tracing::instrument;

use super::RepositoryError;

// =============================================================================
// Types
// =============================================================================

/// A stored order block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBlock {
    pub id: OrderBlockId,
    /// Human-readable reference (`npdf001`).
    pub reference: String,
    pub shop: ShopDomain,
    pub product_title: String,
    pub customer_email: Option<Email>,
    pub customer_name: Option<String>,
    pub note: Option<String>,
    /// Image URLs.
    pub images: Vec<String>,
    pub option_groups: Vec<OptionGroup>,
    /// Linked draft order, once created.
    pub draft_order_id: Option<DraftOrderId>,
    pub is_purchased: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderBlock {
    /// Lifecycle status derived from the purchase flag.
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        OrderStatus::from_purchased(self.is_purchased)
    }
}

/// Fields needed to insert a block.
#[derive(Debug, Clone)]
pub struct NewOrderBlock {
    pub reference: String,
    pub shop: ShopDomain,
    pub product_title: String,
    pub customer_email: Option<Email>,
    pub customer_name: Option<String>,
    pub note: Option<String>,
    pub images: Vec<String>,
    pub option_groups: Vec<OptionGroup>,
}

/// Internal row type for `PostgreSQL` queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderBlockRow {
    id: uuid::Uuid,
    reference: String,
    shop: String,
    product_title: String,
    customer_email: Option<String>,
    customer_name: Option<String>,
    note: Option<String>,
    images: JsonValue,
    option_groups: JsonValue,
    shopify_draft_order_id: Option<String>,
    is_purchased: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderBlockRow> for OrderBlock {
    type Error = RepositoryError;

    fn try_from(row: OrderBlockRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, err: &dyn std::fmt::Display| {
            RepositoryError::DataCorruption(format!("order block {} {field}: {err}", row.id))
        };

        let shop = ShopDomain::parse(&row.shop).map_err(|e| corrupt("shop", &e))?;
        let customer_email = row
            .customer_email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| corrupt("customer_email", &e))?;
        let images: Vec<String> =
            serde_json::from_value(row.images).map_err(|e| corrupt("images", &e))?;
        let option_groups: Vec<OptionGroup> = serde_json::from_value(row.option_groups)
            .map_err(|e| corrupt("option_groups", &e))?;
        let draft_order_id = row
            .shopify_draft_order_id
            .as_deref()
            .map(DraftOrderId::parse)
            .transpose()
            .map_err(|e| corrupt("shopify_draft_order_id", &e))?;

        Ok(Self {
            id: OrderBlockId::from_uuid(row.id),
            reference: row.reference,
            shop,
            product_title: row.product_title,
            customer_email,
            customer_name: row.customer_name,
            note: row.note,
            images,
            option_groups,
            draft_order_id,
            is_purchased: row.is_purchased,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = r"
    id, reference, shop, product_title, customer_email, customer_name, note,
    images, option_groups, shopify_draft_order_id, is_purchased,
    created_at, updated_at
";

// =============================================================================
// Repository
// =============================================================================

/// Repository for order block database operations.
pub struct OrderBlockRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderBlockRepository<'a> {
    /// Create a new order block repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new block.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the reference is taken, or
    /// `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, block), fields(shop = %block.shop, reference = %block.reference))]
    pub async fn create(&self, block: &NewOrderBlock) -> Result<OrderBlock, RepositoryError> {
        let images = serde_json::to_value(&block.images)
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
        let option_groups = serde_json::to_value(&block.option_groups)
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        let row = sqlx::query_as::<_, OrderBlockRow>(&format!(
            r"
            INSERT INTO order_blocks (
                id, reference, shop, product_title, customer_email, customer_name,
                note, images, option_groups
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {SELECT_COLUMNS}
            "
        ))
        .bind(OrderBlockId::new_v4())
        .bind(&block.reference)
        .bind(&block.shop)
        .bind(&block.product_title)
        .bind(block.customer_email.as_ref())
        .bind(block.customer_name.as_deref())
        .bind(block.note.as_deref())
        .bind(images)
        .bind(option_groups)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "order block reference"))?;

        row.try_into()
    }

    /// Get a block by id, scoped to a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if stored JSON does not decode.
    #[instrument(skip(self), fields(shop = %shop, block_id = %id))]
    pub async fn get(
        &self,
        shop: &ShopDomain,
        id: OrderBlockId,
    ) -> Result<Option<OrderBlock>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderBlockRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM order_blocks WHERE id = $1 AND shop = $2"
        ))
        .bind(id)
        .bind(shop)
        .fetch_optional(self.pool)
        .await?;

        row.map(OrderBlock::try_from).transpose()
    }

    /// List a shop's blocks, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if stored JSON does not decode.
    #[instrument(skip(self), fields(shop = %shop))]
    pub async fn list_by_shop(&self, shop: &ShopDomain) -> Result<Vec<OrderBlock>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderBlockRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM order_blocks WHERE shop = $1 ORDER BY created_at DESC"
        ))
        .bind(shop)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderBlock::try_from).collect()
    }

    /// List every block across shops, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if stored JSON does not decode.
    pub async fn list_all(&self) -> Result<Vec<OrderBlock>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderBlockRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM order_blocks ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderBlock::try_from).collect()
    }

    /// Delete a block. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(shop = %shop, block_id = %id))]
    pub async fn delete(&self, shop: &ShopDomain, id: OrderBlockId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM order_blocks WHERE id = $1 AND shop = $2")
            .bind(id)
            .bind(shop)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Link a block to its draft order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the block no longer exists, or
    /// `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(block_id = %id, draft_order_id = %draft_order_id))]
    pub async fn set_draft_order(
        &self,
        id: OrderBlockId,
        draft_order_id: DraftOrderId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE order_blocks
            SET shopify_draft_order_id = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(draft_order_id.gid())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Mark every block of a shop linked to a draft order as purchased.
    /// Returns the number of blocks updated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(shop = %shop, draft_order_id = %draft_order_id))]
    pub async fn mark_purchased_by_draft_order(
        &self,
        shop: &ShopDomain,
        draft_order_id: DraftOrderId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE order_blocks
            SET is_purchased = TRUE, updated_at = NOW()
            WHERE shopify_draft_order_id = $1 AND shop = $2
            ",
        )
        .bind(draft_order_id.gid())
        .bind(shop)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Mark a single block as purchased. Returns the number of blocks updated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(shop = %shop, block_id = %id))]
    pub async fn mark_purchased_by_id(
        &self,
        shop: &ShopDomain,
        id: OrderBlockId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE order_blocks
            SET is_purchased = TRUE, updated_at = NOW()
            WHERE id = $1 AND shop = $2
            ",
        )
        .bind(id)
        .bind(shop)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> OrderBlockRow {
        OrderBlockRow {
            id: uuid::Uuid::new_v4(),
            reference: "npdf001".to_string(),
            shop: "acme.myshopify.com".to_string(),
            product_title: "Walnut Desk".to_string(),
            customer_email: Some("buyer@example.com".to_string()),
            customer_name: None,
            note: None,
            images: json!(["https://cdn.example.com/a.jpg"]),
            option_groups: json!([{"name": "Size", "values": [{"id": "l", "label": "Large", "price": "10"}]}]),
            shopify_draft_order_id: Some("gid://shopify/DraftOrder/42".to_string()),
            is_purchased: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_conversion() {
        let block = OrderBlock::try_from(row()).unwrap();
        assert_eq!(block.draft_order_id, Some(DraftOrderId::new(42)));
        assert_eq!(block.option_groups[0].values[0].label, "Large");
        assert_eq!(block.images.len(), 1);
        assert_eq!(block.status(), OrderStatus::Pending);
    }

    #[test]
    fn test_row_conversion_reports_corrupt_json() {
        let mut bad = row();
        bad.option_groups = json!({"not": "a list"});
        let err = OrderBlock::try_from(bad).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(msg) if msg.contains("option_groups")));
    }

    #[test]
    fn test_row_conversion_reports_bad_draft_order_id() {
        let mut bad = row();
        bad.shopify_draft_order_id = Some("gid://shopify/Order/1x".to_string());
        assert!(matches!(
            OrderBlock::try_from(bad),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
