//! Shop access token repository.
//!
//! Admin API tokens for shops other than the configured default store.
//! Tokens are added through the CLI.

use chrono::{DateTime, Utc};
use custom_order_core::ShopDomain;
use secrecy::SecretString;
use sqlx::PgPool;

use super::RepositoryError;

/// A stored shop access token.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopToken {
    pub shop: ShopDomain,
    pub access_token: SecretString,
    /// Granted scopes.
    pub scopes: Vec<String>,
    /// Unix timestamp when the token was obtained.
    pub obtained_at: i64,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for ShopToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopToken")
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("obtained_at", &self.obtained_at)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ShopTokenRow {
    shop: ShopDomain,
    access_token: String,
    scope: String,
    obtained_at: i64,
    updated_at: DateTime<Utc>,
}

impl From<ShopTokenRow> for ShopToken {
    fn from(row: ShopTokenRow) -> Self {
        Self {
            shop: row.shop,
            access_token: SecretString::from(row.access_token),
            scopes: split_scopes(&row.scope),
            obtained_at: row.obtained_at,
            updated_at: row.updated_at,
        }
    }
}

fn split_scopes(scope: &str) -> Vec<String> {
    scope
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Repository for shop access tokens.
pub struct ShopTokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShopTokenRepository<'a> {
    /// Create a new shop token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the token for a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_shop(&self, shop: &ShopDomain) -> Result<Option<ShopToken>, RepositoryError> {
        let row = sqlx::query_as::<_, ShopTokenRow>(
            r"
            SELECT shop, access_token, scope, obtained_at, updated_at
            FROM shop_tokens
            WHERE shop = $1
            ",
        )
        .bind(shop)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ShopToken::from))
    }

    /// Save or replace the token for a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn save(
        &self,
        shop: &ShopDomain,
        access_token: &str,
        scopes: &[String],
        obtained_at: i64,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop_tokens (shop, access_token, scope, obtained_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (shop) DO UPDATE SET
                access_token = EXCLUDED.access_token,
                scope = EXCLUDED.scope,
                obtained_at = EXCLUDED.obtained_at,
                updated_at = NOW()
            ",
        )
        .bind(shop)
        .bind(access_token)
        .bind(scopes.join(","))
        .bind(obtained_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Delete the token for a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, shop: &ShopDomain) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop_tokens WHERE shop = $1")
            .bind(shop)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List every stored token, ordered by shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<ShopToken>, RepositoryError> {
        let rows = sqlx::query_as::<_, ShopTokenRow>(
            r"
            SELECT shop, access_token, scope, obtained_at, updated_at
            FROM shop_tokens
            ORDER BY shop
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ShopToken::from).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_split_scopes() {
        assert_eq!(
            split_scopes("write_draft_orders, read_orders,,"),
            vec!["write_draft_orders", "read_orders"]
        );
        assert!(split_scopes("").is_empty());
    }

    #[test]
    fn test_debug_redacts_token() {
        let token = ShopToken {
            shop: ShopDomain::parse("acme.myshopify.com").unwrap(),
            access_token: SecretString::from("shpat_super_secret"),
            scopes: vec![],
            obtained_at: 0,
            updated_at: Utc::now(),
        };
        let debug_output = format!("{token:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("shpat_super_secret"));
    }
}
