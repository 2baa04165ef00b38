//! Request signing and response verification.
//!
//! The acquirer authenticates a request by a two-pass digest. First it hashes
//! the dot-joined fields `timestamp.merchantid.orderid.amount.currency.cardnumber`,
//! with absent fields left empty. Then it hashes that hex digest joined with the
//! shared secret. Responses are signed the same way over
//! `timestamp.merchantid.orderid.result.message.pasref.authcode`.

use std::sync::Arc;

use md5::Md5;
use realex_core::{Credentials, GatewayError, TransactionRequest};
use sha1::{Digest, Sha1};

/// Hash function used for request and response digests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DigestAlgorithm {
    /// SHA-1, sent as `<sha1hash>`.
    #[default]
    Sha1,
    /// MD5, sent as `<md5hash>`. Legacy accounts only.
    Md5,
}

impl DigestAlgorithm {
    /// Hex digest of `data`.
    #[must_use]
    pub fn hex(self, data: &str) -> String {
        match self {
            Self::Sha1 => hex::encode(Sha1::digest(data.as_bytes())),
            Self::Md5 => hex::encode(Md5::digest(data.as_bytes())),
        }
    }
}

/// Signed fields of an acquirer response.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseFields<'a> {
    /// `timestamp` attribute of `<response>`.
    pub timestamp: &'a str,
    /// `<merchantid>`.
    pub merchant_id: &'a str,
    /// `<orderid>`.
    pub order_id: &'a str,
    /// `<result>`.
    pub result: &'a str,
    /// `<message>`.
    pub message: &'a str,
    /// `<pasref>`.
    pub pasref: &'a str,
    /// `<authcode>`.
    pub authcode: &'a str,
}

/// Computes and checks digests with the merchant's shared secret.
#[derive(Debug, Clone)]
pub struct Signer {
    credentials: Arc<Credentials>,
    algorithm: DigestAlgorithm,
}

impl Signer {
    /// Create a signer.
    #[must_use]
    pub fn new(credentials: Arc<Credentials>, algorithm: DigestAlgorithm) -> Self {
        Self {
            credentials,
            algorithm,
        }
    }

    /// The credentials this signer uses.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The digest algorithm.
    #[must_use]
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Sign a request.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] if the merchant id or shared
    /// secret is unset.
    pub fn sign(&self, request: &TransactionRequest) -> Result<String, GatewayError> {
        self.ensure_configured()?;

        let amount = request.amount.map(|a| a.to_string()).unwrap_or_default();
        let fields = [
            request.timestamp.as_str(),
            self.credentials.merchant_id(),
            request.order_reference.as_str(),
            amount.as_str(),
            request.currency.as_deref().unwrap_or_default(),
            request
                .card
                .as_ref()
                .map(|c| c.number.as_str())
                .unwrap_or_default(),
        ];

        Ok(self.seal(&fields.join(".")))
    }

    /// Check a response digest.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ResponseVerification`] if `received` does not
    /// match the recomputed digest, or [`GatewayError::Configuration`] if the
    /// credentials are incomplete.
    pub fn verify_response(
        &self,
        fields: &ResponseFields<'_>,
        received: &str,
    ) -> Result<(), GatewayError> {
        self.ensure_configured()?;

        let joined = [
            fields.timestamp,
            fields.merchant_id,
            fields.order_id,
            fields.result,
            fields.message,
            fields.pasref,
            fields.authcode,
        ]
        .join(".");
        let expected = self.seal(&joined);

        if constant_time_eq(&expected, &received.trim().to_ascii_lowercase()) {
            Ok(())
        } else {
            Err(GatewayError::ResponseVerification(format!(
                "{:?} digest does not match for order {}",
                self.algorithm, fields.order_id
            )))
        }
    }

    /// Hash of the rebate password, sent as `<refundhash>` with refunds.
    ///
    /// Always SHA-1, whatever the signing algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] if no rebate password is set.
    pub fn refund_hash(&self) -> Result<String, GatewayError> {
        let secret = self.credentials.rebate_secret().ok_or_else(|| {
            GatewayError::Configuration("refunds need a rebate secret".into())
        })?;
        Ok(DigestAlgorithm::Sha1.hex(secret))
    }

    fn seal(&self, joined: &str) -> String {
        let inner = self.algorithm.hex(joined);
        self.algorithm
            .hex(&format!("{inner}.{}", self.credentials.shared_secret()))
    }

    fn ensure_configured(&self) -> Result<(), GatewayError> {
        if self.credentials.merchant_id().is_empty() {
            return Err(GatewayError::Configuration("merchant id is not set".into()));
        }
        if self.credentials.shared_secret().is_empty() {
            return Err(GatewayError::Configuration(
                "shared secret is not set".into(),
            ));
        }
        Ok(())
    }
}

/// Constant-time string comparison.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
