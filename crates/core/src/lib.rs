//! Custom Order Core - Shared domain types.
//!
//! This crate provides the types used across the custom order components:
//! - `server` - HTTP API for merchants, customers and Shopify webhooks
//! - `cli` - Command-line tools for migrations and shop credentials
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and easy to test.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, tokens, shops, emails, prices and
//!   option groups

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
