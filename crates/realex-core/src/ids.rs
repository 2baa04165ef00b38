//! Identifier types for the gateway client.
//!
//! The acquirer accepts order identifiers made of ASCII letters, digits,
//! hyphens and underscores, up to 50 characters. `OrderReference` enforces
//! that shape once, at construction, so the signer and the XML writer can use
//! the value as-is.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GatewayError;

/// Maximum length of an order reference accepted by the acquirer.
pub const MAX_ORDER_REFERENCE_LEN: usize = 50;

/// A merchant-assigned order reference.
///
/// Each transaction attempt must use a fresh reference. The acquirer treats a
/// reused reference as a duplicate and rejects it.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderReference(String);

impl OrderReference {
    /// Sanitize and validate a caller-supplied reference.
    ///
    /// Characters outside `[A-Za-z0-9_-]` are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing survives sanitizing or the result is longer
    /// than [`MAX_ORDER_REFERENCE_LEN`].
    pub fn new(raw: impl AsRef<str>) -> Result<Self, IdError> {
        let sanitized: String = raw
            .as_ref()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();

        if sanitized.is_empty() {
            return Err(IdError::Empty);
        }
        if sanitized.len() > MAX_ORDER_REFERENCE_LEN {
            return Err(IdError::TooLong {
                len: sanitized.len(),
            });
        }
        Ok(Self(sanitized))
    }

    /// Generate a fresh reference: a UTC timestamp followed by a random suffix.
    #[must_use]
    pub fn generate() -> Self {
        let timestamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("{timestamp}-{suffix}"))
    }

    /// Return the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderReference {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Debug for OrderReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OrderReference({})", self.0)
    }
}

impl fmt::Display for OrderReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OrderReference {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OrderReference> for String {
    fn from(id: OrderReference) -> Self {
        id.0
    }
}

impl AsRef<str> for OrderReference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The reference is empty once invalid characters are removed.
    #[error("order reference is empty")]
    Empty,

    /// The reference exceeds the acquirer's length limit.
    #[error("order reference is {len} characters, limit is 50")]
    TooLong {
        /// Length after sanitizing.
        len: usize,
    },
}

impl From<IdError> for GatewayError {
    fn from(err: IdError) -> Self {
        Self::Validation(err.to_string())
    }
}
