//! Business logic services.
//!
//! # Services
//!
//! - `orders` - Custom order creation, link resolution and checkout
//! - `webhooks` - Purchase notifications from Shopify

pub mod orders;
pub mod webhooks;

pub use webhooks::{WebhookOutcome, WebhookTopic, handle_webhook};
