//! Custom order CLI - Database migrations and shop management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! co-cli migrate
//!
//! # Store an Admin API token for an additional shop
//! co-cli shop add --shop other.myshopify.com --token shpat_... --scope write_draft_orders
//!
//! # List order blocks for one shop
//! co-cli blocks list --shop acme.myshopify.com
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `shop add|remove|list` - Manage per-shop credentials
//! - `blocks list` - Inspect stored order blocks

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "co-cli")]
#[command(author, version, about = "Custom order link CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage shop credentials
    Shop {
        #[command(subcommand)]
        action: ShopAction,
    },
    /// Inspect order blocks
    Blocks {
        #[command(subcommand)]
        action: BlocksAction,
    },
}

#[derive(Subcommand)]
enum ShopAction {
    /// Store an Admin API access token for a shop
    Add {
        /// Shop domain (`<name>.myshopify.com`)
        #[arg(short, long)]
        shop: String,

        /// Admin API access token
        #[arg(short, long)]
        token: String,

        /// Granted scope (repeatable)
        #[arg(long = "scope")]
        scopes: Vec<String>,
    },
    /// Remove a shop's access token
    Remove {
        /// Shop domain
        #[arg(short, long)]
        shop: String,
    },
    /// List shops with stored tokens
    List,
}

#[derive(Subcommand)]
enum BlocksAction {
    /// List order blocks, newest first
    List {
        /// Only list blocks for this shop
        #[arg(short, long)]
        shop: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Shop { action } => match action {
            ShopAction::Add {
                shop,
                token,
                scopes,
            } => commands::shop::add(&shop, &token, &scopes).await?,
            ShopAction::Remove { shop } => commands::shop::remove(&shop).await?,
            ShopAction::List => commands::shop::list().await?,
        },
        Commands::Blocks { action } => match action {
            BlocksAction::List { shop } => commands::blocks::list(shop.as_deref()).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_shop_add_with_scopes() {
        let cli = Cli::try_parse_from([
            "co-cli",
            "shop",
            "add",
            "--shop",
            "other.myshopify.com",
            "--token",
            "shpat_abc",
            "--scope",
            "read_draft_orders",
            "--scope",
            "write_draft_orders",
        ]);
        let Ok(Cli {
            command: Commands::Shop {
                action: ShopAction::Add { shop, scopes, .. },
            },
        }) = cli
        else {
            panic!("expected shop add");
        };
        assert_eq!(shop, "other.myshopify.com");
        assert_eq!(scopes, vec!["read_draft_orders", "write_draft_orders"]);
    }
}
