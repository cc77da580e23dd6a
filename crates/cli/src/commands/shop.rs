//! Shop credential commands.
//!
//! The configured `SHOPIFY_STORE` needs no entry here; every other shop the
//! server answers for must have an Admin API token stored.
//!
//! # Usage
//!
//! ```bash
//! co-cli shop add --shop other.myshopify.com --token shpat_... --scope write_draft_orders
//! co-cli shop remove --shop other.myshopify.com
//! co-cli shop list
//! ```

use chrono::Utc;
use custom_order_core::ShopDomain;
use custom_order_server::db::ShopTokenRepository;

use super::{CommandError, connect};

fn parse_shop(shop: &str) -> Result<ShopDomain, CommandError> {
    ShopDomain::parse(shop).map_err(|e| CommandError::InvalidArgument(e.to_string()))
}

/// Store (or replace) a shop's access token.
///
/// # Errors
///
/// Returns an error for an invalid shop or token, or a database error.
pub async fn add(shop: &str, token: &str, scopes: &[String]) -> Result<(), CommandError> {
    let shop = parse_shop(shop)?;
    let token = token.trim();
    if token.is_empty() {
        return Err(CommandError::InvalidArgument(
            "Access token must not be empty".to_string(),
        ));
    }

    let pool = connect().await?;
    ShopTokenRepository::new(&pool)
        .save(&shop, token, scopes, Utc::now().timestamp())
        .await?;

    tracing::info!(shop = %shop, scopes = ?scopes, "Shop credentials saved");
    Ok(())
}

/// Remove a shop's access token.
///
/// # Errors
///
/// Returns an error for an invalid shop or a database error.
pub async fn remove(shop: &str) -> Result<(), CommandError> {
    let shop = parse_shop(shop)?;
    let pool = connect().await?;

    if ShopTokenRepository::new(&pool).delete(&shop).await? {
        tracing::info!(shop = %shop, "Shop credentials removed");
    } else {
        tracing::warn!(shop = %shop, "No credentials stored for shop");
    }
    Ok(())
}

/// Print the shops with stored credentials. Tokens are never printed.
///
/// # Errors
///
/// Returns a database error.
pub async fn list() -> Result<(), CommandError> {
    let pool = connect().await?;
    let shops = ShopTokenRepository::new(&pool).list().await?;

    #[allow(clippy::print_stdout)]
    {
        if shops.is_empty() {
            println!("No shops installed.");
        }
        for shop in shops {
            println!(
                "{:<40} scopes={:<40} updated={}",
                shop.shop.as_str(),
                shop.scopes.join(","),
                shop.updated_at.format("%Y-%m-%d %H:%M")
            );
        }
    }
    Ok(())
}
