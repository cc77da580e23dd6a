//! Order block inspection.
//!
//! # Usage
//!
//! ```bash
//! co-cli blocks list
//! co-cli blocks list --shop acme.myshopify.com
//! ```

use custom_order_core::ShopDomain;
use custom_order_server::db::{OrderBlock, OrderBlockRepository};

use super::{CommandError, connect};

/// One output line for a block.
fn format_block(block: &OrderBlock) -> String {
    format!(
        "{:<9} {} {:<18} {:<30} {}",
        block.reference,
        block.id,
        block.status().label(),
        block.shop.as_str(),
        block.product_title
    )
}

/// Print order blocks, newest first.
///
/// # Errors
///
/// Returns an error for an invalid shop or a database error.
pub async fn list(shop: Option<&str>) -> Result<(), CommandError> {
    let shop = shop
        .map(ShopDomain::parse)
        .transpose()
        .map_err(|e| CommandError::InvalidArgument(e.to_string()))?;

    let pool = connect().await?;
    let repo = OrderBlockRepository::new(&pool);
    let blocks = match &shop {
        Some(shop) => repo.list_by_shop(shop).await?,
        None => repo.list_all().await?,
    };

    #[allow(clippy::print_stdout)]
    {
        if blocks.is_empty() {
            println!("No order blocks.");
        }
        for block in &blocks {
            println!("{}", format_block(block));
        }
    }
    Ok(())
}
