//! Core types for custom orders.
//!
//! This module provides type-safe wrappers for the domain concepts shared by
//! the server and the CLI.

pub mod email;
pub mod id;
pub mod options;
pub mod price;
pub mod shop;
pub mod status;
pub mod token;

pub use email::{Email, EmailError};
pub use id::*;
pub use options::*;
pub use price::{Price, PriceError};
pub use shop::{ShopDomain, ShopDomainError};
pub use status::OrderStatus;
pub use token::{OrderRef, OrderToken, TokenError};
