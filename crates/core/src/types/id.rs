//! Newtype IDs for type-safe entity references.
//!
//! Local records use UUIDs via the `define_id!` macro. Shopify records use
//! their numeric legacy id, which also has a GraphQL global id (gid) form.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe UUID wrapper.
///
/// Creates a newtype wrapper around [`uuid::Uuid`] with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new_v4()`, `from_uuid()`, `as_uuid()`, `parse()`
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use custom_order_core::define_id;
/// define_id!(InvoiceId);
///
/// let id = InvoiceId::new_v4();
/// assert_eq!(InvoiceId::parse(&id.to_string()).ok(), Some(id));
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Generate a new random ID.
            #[must_use]
            pub fn new_v4() -> Self {
                Self(::uuid::Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(id: ::uuid::Uuid) -> Self {
                Self(id)
            }

            /// Get the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> ::uuid::Uuid {
                self.0
            }

            /// Parse an ID from its hyphenated string form.
            ///
            /// # Errors
            ///
            /// Returns an error if the input is not a valid UUID.
            pub fn parse(s: &str) -> Result<Self, ::uuid::Error> {
                ::uuid::Uuid::parse_str(s).map(Self)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }

        impl From<::uuid::Uuid> for $name {
            fn from(id: ::uuid::Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for ::uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <::uuid::Uuid as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <::uuid::Uuid as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <::uuid::Uuid as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <::uuid::Uuid as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(OrderBlockId);

/// Prefix of a Shopify draft order global id.
const DRAFT_ORDER_GID_PREFIX: &str = "gid://shopify/DraftOrder/";

/// Error returned when a draft order id cannot be parsed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid draft order id: {0}")]
pub struct DraftOrderIdError(String);

/// A Shopify draft order id.
///
/// Stored as the numeric legacy id used by the REST API. The GraphQL global
/// id form (`gid://shopify/DraftOrder/123`) is what order blocks persist and
/// what webhooks are matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftOrderId(u64);

impl DraftOrderId {
    /// Create a draft order id from its numeric value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the numeric value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Render the GraphQL global id.
    #[must_use]
    pub fn gid(&self) -> String {
        format!("{DRAFT_ORDER_GID_PREFIX}{}", self.0)
    }

    /// Parse either the numeric form or the gid form.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is neither a positive integer nor a
    /// draft order gid.
    pub fn parse(s: &str) -> Result<Self, DraftOrderIdError> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix(DRAFT_ORDER_GID_PREFIX)
            .unwrap_or(trimmed);

        match digits.parse::<u64>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(DraftOrderIdError(s.to_owned())),
        }
    }
}

impl fmt::Display for DraftOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DraftOrderId {
    type Err = DraftOrderIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<u64> for DraftOrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// Postgres has no unsigned integers; Shopify ids fit comfortably in BIGINT.
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for DraftOrderId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for DraftOrderId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <i64 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(u64::try_from(id)?))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for DraftOrderId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        let id = i64::try_from(self.0)?;
        <i64 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&id, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_block_id_parse_roundtrip() {
        let id = OrderBlockId::new_v4();
        let parsed = OrderBlockId::parse(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_order_block_id_rejects_garbage() {
        assert!(OrderBlockId::parse("npdf001").is_err());
    }

    #[test]
    fn test_draft_order_gid() {
        let id = DraftOrderId::new(1_069_920_475);
        assert_eq!(id.gid(), "gid://shopify/DraftOrder/1069920475");
    }

    #[test]
    fn test_draft_order_parse_numeric_and_gid() {
        assert_eq!(DraftOrderId::parse("42").unwrap(), DraftOrderId::new(42));
        assert_eq!(
            DraftOrderId::parse("gid://shopify/DraftOrder/42").unwrap(),
            DraftOrderId::new(42)
        );
    }

    #[test]
    fn test_draft_order_parse_rejects_other_resources() {
        assert!(DraftOrderId::parse("gid://shopify/Order/42").is_err());
        assert!(DraftOrderId::parse("0").is_err());
        assert!(DraftOrderId::parse("").is_err());
    }
}
