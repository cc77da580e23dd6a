//! Token index repository.
//!
//! Maps `(shop, token)` to the draft order carrying the `t_<token>` tag, so
//! customer links resolve without scanning draft orders.

use chrono::{DateTime, Utc};
use custom_order_core::{DraftOrderId, OrderToken, ShopDomain};
use sqlx::PgPool;
use tracing::instrument;

use super::RepositoryError;

/// An indexed token.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TokenEntry {
    pub draft_order_id: DraftOrderId,
    pub is_purchased: bool,
    pub updated_at: DateTime<Utc>,
}

/// Repository for the token index.
pub struct OrderTokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderTokenRepository<'a> {
    /// Create a new token index repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Point a token at a draft order. Last write wins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(shop = %shop, token = %token, draft_order_id = %draft_order_id))]
    pub async fn upsert(
        &self,
        shop: &ShopDomain,
        token: &OrderToken,
        draft_order_id: DraftOrderId,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO order_tokens (shop, token, draft_order_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (shop, token) DO UPDATE SET
                draft_order_id = EXCLUDED.draft_order_id,
                updated_at = NOW()
            ",
        )
        .bind(shop)
        .bind(token.as_str())
        .bind(draft_order_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Look a token up.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(shop = %shop, token = %token))]
    pub async fn find(
        &self,
        shop: &ShopDomain,
        token: &OrderToken,
    ) -> Result<Option<TokenEntry>, RepositoryError> {
        let entry = sqlx::query_as::<_, TokenEntry>(
            r"
            SELECT draft_order_id, is_purchased, updated_at
            FROM order_tokens
            WHERE shop = $1 AND token = $2
            ",
        )
        .bind(shop)
        .bind(token.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(entry)
    }

    /// Drop a stale token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(shop = %shop, token = %token))]
    pub async fn delete(&self, shop: &ShopDomain, token: &OrderToken) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM order_tokens WHERE shop = $1 AND token = $2")
            .bind(shop)
            .bind(token.as_str())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark every token of a shop pointing at a draft order as purchased.
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
            UPDATE order_tokens
            SET is_purchased = TRUE, updated_at = NOW()
            WHERE shop = $1 AND draft_order_id = $2
            ",
        )
        .bind(shop)
        .bind(draft_order_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
