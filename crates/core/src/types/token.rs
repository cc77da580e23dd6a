//! Customer-link tokens.
//!
//! A customer link carries a single `token` query parameter. Links created
//! from the draft-order form carry a short random hex token that is also
//! stored as a `t_<token>` tag on the draft order. Links created for order
//! blocks carry the block's UUID. [`OrderRef`] tells the two apart.

use core::fmt;

use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, de};

use super::id::OrderBlockId;

/// Number of random bytes in a generated token.
const TOKEN_BYTES: usize = 4;

/// Shortest accepted token (hex characters).
const MIN_TOKEN_LEN: usize = TOKEN_BYTES * 2;

/// Longest accepted token (hex characters).
const MAX_TOKEN_LEN: usize = 64;

/// Length of a hyphenated UUID.
const HYPHENATED_UUID_LEN: usize = 36;

/// Prefix of the draft order tag that carries a token.
pub const TOKEN_TAG_PREFIX: &str = "t_";

/// Errors that can occur when parsing a token.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The input string is empty.
    #[error("token cannot be empty")]
    Empty,
    /// The input is neither a hex token nor an order block id.
    #[error("token is not recognized")]
    Unrecognized,
}

/// A random order token, rendered as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OrderToken(String);

impl OrderToken {
    /// Generate a fresh token from 4 random bytes.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0_u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Parse a token.
    ///
    /// # Errors
    ///
    /// Returns an error unless the input is 8 to 64 lowercase hex characters.
    pub fn parse(s: &str) -> Result<Self, TokenError> {
        if s.is_empty() {
            return Err(TokenError::Empty);
        }
        let valid_len = (MIN_TOKEN_LEN..=MAX_TOKEN_LEN).contains(&s.len());
        let valid_chars = s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if valid_len && valid_chars {
            Ok(Self(s.to_owned()))
        } else {
            Err(TokenError::Unrecognized)
        }
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The draft order tag that carries this token.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("{TOKEN_TAG_PREFIX}{}", self.0)
    }
}

impl fmt::Display for OrderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for OrderToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(de::Error::custom)
    }
}

/// What a customer-link token points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderRef {
    /// An order block stored locally.
    Block(OrderBlockId),
    /// A draft order tagged with `t_<token>`.
    Token(OrderToken),
}

impl OrderRef {
    /// Interpret a raw token from a customer link.
    ///
    /// UUIDs are order block ids; short lowercase hex strings are draft order
    /// tokens.
    ///
    /// # Errors
    ///
    /// Returns an error for empty or unrecognized input.
    pub fn parse(raw: &str) -> Result<Self, TokenError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TokenError::Empty);
        }
        // Only the hyphenated form counts as a block id, so long hex tokens
        // never collide with the simple UUID encoding.
        if raw.len() == HYPHENATED_UUID_LEN
            && let Ok(id) = OrderBlockId::parse(raw)
        {
            return Ok(Self::Block(id));
        }
        OrderToken::parse(raw).map(Self::Token)
    }
}

impl fmt::Display for OrderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block(id) => write!(f, "{id}"),
            Self::Token(token) => write!(f, "{token}"),
        }
    }
}
