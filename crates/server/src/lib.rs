//! Custom Order Server library.
//!
//! HTTP API turning a merchant's custom order into a shareable customer
//! link, and the customer's selection into a Shopify checkout.
//!
//! # Security
//!
//! This crate holds Shopify Admin API tokens (draft order write access).
//! Admin routes require the `ADMIN_API_TOKEN` bearer token; customer routes
//! only ever price orders from stored data.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;

pub use routes::app;
