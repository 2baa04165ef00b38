//! Merchant credentials.

use std::fmt;

use crate::error::GatewayError;

/// Merchant credentials issued by the acquirer.
///
/// Immutable once built. The gateway holds one instance for its lifetime and
/// shares it read-only across concurrent calls.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    merchant_id: String,
    shared_secret: String,
    account: Option<String>,
    rebate_secret: Option<String>,
}

impl Credentials {
    /// Create credentials from a merchant id and shared secret.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] if either value is blank.
    pub fn new(
        merchant_id: impl Into<String>,
        shared_secret: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let merchant_id = merchant_id.into().trim().to_string();
        let shared_secret = shared_secret.into();

        if merchant_id.is_empty() {
            return Err(GatewayError::Configuration("merchant id is not set".into()));
        }
        if shared_secret.trim().is_empty() {
            return Err(GatewayError::Configuration(
                "shared secret is not set".into(),
            ));
        }

        Ok(Self {
            merchant_id,
            shared_secret,
            account: None,
            rebate_secret: None,
        })
    }

    /// Route traffic through a sub-account. Blank values are ignored.
    #[must_use]
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into()).filter(|a| !a.trim().is_empty());
        self
    }

    /// Set the rebate password needed for refunds. Blank values are ignored.
    #[must_use]
    pub fn with_rebate_secret(mut self, secret: impl Into<String>) -> Self {
        self.rebate_secret = Some(secret.into()).filter(|s| !s.trim().is_empty());
        self
    }

    /// The merchant identifier.
    #[must_use]
    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    /// The shared secret used to sign requests.
    #[must_use]
    pub fn shared_secret(&self) -> &str {
        &self.shared_secret
    }

    /// The sub-account, if configured.
    #[must_use]
    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    /// The rebate password, if configured.
    #[must_use]
    pub fn rebate_secret(&self) -> Option<&str> {
        self.rebate_secret.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("merchant_id", &self.merchant_id)
            .field("shared_secret", &"[redacted]")
            .field("account", &self.account)
            .field(
                "rebate_secret",
                &self.rebate_secret.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}
