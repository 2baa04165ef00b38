//! Transaction types.
//!
//! This module defines what the caller sends in (`TransactionOptions`), what
//! goes to the acquirer (`TransactionRequest`) and what comes back
//! (`TransactionResult`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::card::CardDetails;
use crate::error::GatewayError;
use crate::ids::OrderReference;

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of free-text comments the acquirer stores per transaction.
pub const MAX_COMMENTS: usize = 2;

/// Separator used in the composite authorization reference.
const REFERENCE_SEPARATOR: char = ';';

/// Result code the acquirer uses for an approved transaction.
const SUCCESS_CODE: &str = "00";

// ============================================================================
// Kind and state
// ============================================================================

/// The operations the gateway can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Reserve funds without settling.
    Authorize,
    /// Settle a prior authorization.
    Capture,
    /// Authorize and settle in one request.
    Purchase,
    /// Cancel an unsettled authorization or capture.
    Void,
    /// Return funds for a settled transaction.
    Refund,
}

impl TransactionKind {
    /// The acquirer's request `type` attribute.
    #[must_use]
    pub const fn wire_type(self) -> &'static str {
        match self {
            Self::Authorize | Self::Purchase => "auth",
            Self::Capture => "settle",
            Self::Void => "void",
            Self::Refund => "rebate",
        }
    }

    /// Whether the request carries card details.
    #[must_use]
    pub const fn requires_card(self) -> bool {
        matches!(self, Self::Authorize | Self::Purchase)
    }

    /// Whether the request references a prior transaction.
    #[must_use]
    pub const fn requires_prior_reference(self) -> bool {
        !self.requires_card()
    }

    /// Whether the request carries an amount.
    #[must_use]
    pub const fn carries_amount(self) -> bool {
        !matches!(self, Self::Void)
    }

    /// The `autosettle` flag sent with the request, if any.
    #[must_use]
    pub const fn auto_settle(self) -> Option<bool> {
        match self {
            Self::Authorize => Some(false),
            Self::Purchase | Self::Refund => Some(true),
            Self::Capture | Self::Void => None,
        }
    }

    /// The state a transaction moves to when this operation succeeds.
    #[must_use]
    pub const fn transition(self) -> TransactionState {
        match self {
            Self::Authorize => TransactionState::Authorized,
            Self::Capture | Self::Purchase => TransactionState::Captured,
            Self::Void | Self::Refund => TransactionState::Voided,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Authorize => "authorize",
            Self::Capture => "capture",
            Self::Purchase => "purchase",
            Self::Void => "void",
            Self::Refund => "refund",
        };
        f.write_str(name)
    }
}

/// Lifecycle of a single payment as seen by the order system.
///
/// The gateway does not store this. It reports which transition a successful
/// result represents, and the caller owns the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    /// No transaction yet.
    None,
    /// Funds reserved.
    Authorized,
    /// Funds settled (terminal unless voided or refunded).
    Captured,
    /// Authorization cancelled or capture refunded (terminal).
    Voided,
}

impl TransactionState {
    /// Whether `kind` may be applied to a transaction in this state.
    #[must_use]
    pub const fn allows(self, kind: TransactionKind) -> bool {
        matches!(
            (self, kind),
            (
                Self::None,
                TransactionKind::Authorize | TransactionKind::Purchase
            ) | (
                Self::Authorized,
                TransactionKind::Capture | TransactionKind::Void
            ) | (
                Self::Captured,
                TransactionKind::Void | TransactionKind::Refund
            )
        )
    }

    /// Apply a successful operation.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidState`] if the operation is not allowed
    /// from this state.
    pub fn apply(self, kind: TransactionKind) -> Result<Self, GatewayError> {
        if self.allows(kind) {
            Ok(kind.transition())
        } else {
            Err(GatewayError::InvalidState(format!(
                "cannot {kind} a transaction in state {self:?}"
            )))
        }
    }
}

// ============================================================================
// Prior reference
// ============================================================================

/// Reference to an earlier transaction, as needed by capture, void and refund.
///
/// Renders to and parses from the composite authorization reference
/// `order_reference;processing_reference;authorization_code`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriorReference {
    /// Order reference of the original transaction.
    pub order_reference: OrderReference,
    /// Acquirer processing reference (`pasref`).
    pub processing_reference: String,
    /// Authorization code issued by the bank. May be empty.
    pub authorization_code: String,
}

impl PriorReference {
    /// Create a prior reference from its parts.
    pub fn new(
        order_reference: OrderReference,
        processing_reference: impl Into<String>,
        authorization_code: impl Into<String>,
    ) -> Self {
        Self {
            order_reference,
            processing_reference: processing_reference.into(),
            authorization_code: authorization_code.into(),
        }
    }
}

impl FromStr for PriorReference {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(REFERENCE_SEPARATOR);
        let (Some(order), Some(pasref), Some(authcode), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(GatewayError::InvalidState(format!(
                "prior reference {s:?} is not of the form order;pasref;authcode"
            )));
        };

        let order_reference = OrderReference::new(order).map_err(|e| {
            GatewayError::InvalidState(format!("prior reference has no order: {e}"))
        })?;
        if pasref.trim().is_empty() {
            return Err(GatewayError::InvalidState(
                "prior reference has no processing reference".into(),
            ));
        }

        Ok(Self::new(order_reference, pasref, authcode))
    }
}

impl fmt::Display for PriorReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{REFERENCE_SEPARATOR}{}{REFERENCE_SEPARATOR}{}",
            self.order_reference, self.processing_reference, self.authorization_code
        )
    }
}

// ============================================================================
// Options
// ============================================================================

/// Fraud-screening data forwarded in `<tssinfo>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudInfo {
    /// Merchant's customer number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_number: Option<String>,
    /// Merchant's product identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    /// Free-form merchant reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_reference: Option<String>,
    /// Customer IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_ip: Option<String>,
}

impl FraudInfo {
    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.customer_number.is_none()
            && self.product_id.is_none()
            && self.variable_reference.is_none()
            && self.customer_ip.is_none()
    }
}

/// Caller-supplied options for a transaction.
///
/// `order_reference` is mandatory for authorize and purchase. Capture, void
/// and refund need `prior_reference` and take the order from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOptions {
    /// Unique order reference for this attempt.
    #[serde(default, alias = "order_id")]
    pub order_reference: Option<String>,
    /// Authorization reference of the transaction being captured, voided or
    /// refunded.
    #[serde(default, alias = "authorization")]
    pub prior_reference: Option<String>,
    /// Currency override. Falls back to the gateway's default currency.
    #[serde(default)]
    pub currency: Option<String>,
    /// Up to [`MAX_COMMENTS`] free-text comments.
    #[serde(default)]
    pub comments: Vec<String>,
    /// Fraud-screening data.
    #[serde(default)]
    pub fraud: FraudInfo,
}

impl TransactionOptions {
    /// Options carrying only an order reference.
    #[must_use]
    pub fn with_order_reference(order_reference: impl Into<String>) -> Self {
        Self {
            order_reference: Some(order_reference.into()),
            ..Self::default()
        }
    }

    /// Reference a prior transaction.
    #[must_use]
    pub fn prior_reference(mut self, reference: impl Into<String>) -> Self {
        self.prior_reference = Some(reference.into());
        self
    }

    /// Override the currency.
    #[must_use]
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Add a comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comments.push(comment.into());
        self
    }

    /// Set the fraud-screening data.
    #[must_use]
    pub fn fraud(mut self, fraud: FraudInfo) -> Self {
        self.fraud = fraud;
        self
    }
}

// ============================================================================
// Request
// ============================================================================

/// A validated transaction request, ready to sign and send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    /// Operation.
    pub kind: TransactionKind,
    /// Order reference (for follow-up operations, the original order's).
    pub order_reference: OrderReference,
    /// Amount in minor units, when the operation carries one.
    pub amount: Option<i64>,
    /// ISO 4217 currency code, present whenever `amount` is.
    pub currency: Option<String>,
    /// Card, for authorize and purchase.
    pub card: Option<CardDetails>,
    /// Prior transaction, for capture, void and refund.
    pub prior: Option<PriorReference>,
    /// Acquirer timestamp, `YYYYMMDDHHMMSS` in UTC.
    pub timestamp: String,
    /// Free-text comments.
    pub comments: Vec<String>,
    /// Fraud-screening data, if any field is set.
    pub fraud: Option<FraudInfo>,
}

// ============================================================================
// Result
// ============================================================================

/// Coarse classification of the acquirer's result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultClass {
    /// `00`.
    Successful,
    /// `101`-`103` and unrecognised codes.
    Declined,
    /// `2xx`: the issuing bank could not be reached.
    BankError,
    /// `3xx`: the acquirer itself failed.
    AcquirerError,
    /// `5xx`: the request was malformed or rejected.
    RequestError,
    /// `666`: the merchant account is deactivated.
    ClientDeactivated,
}

impl ResultClass {
    /// Classify a result code.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        if code == SUCCESS_CODE {
            return Self::Successful;
        }
        if code == "666" {
            return Self::ClientDeactivated;
        }
        let three_digits = code.len() == 3 && code.bytes().all(|b| b.is_ascii_digit());
        match code.as_bytes().first() {
            Some(b'2') if three_digits => Self::BankError,
            Some(b'3') if three_digits => Self::AcquirerError,
            Some(b'5') if three_digits => Self::RequestError,
            _ => Self::Declined,
        }
    }

    /// A customer-safe summary of the outcome.
    #[must_use]
    pub const fn summary(self) -> &'static str {
        match self {
            Self::Successful => "Successful",
            Self::Declined => "Declined",
            Self::BankError | Self::AcquirerError => {
                "Gateway is in maintenance. Please try again later."
            }
            Self::RequestError | Self::ClientDeactivated => "Gateway Error",
        }
    }

    /// Whether resubmitting later, with a fresh order reference, may succeed.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::BankError | Self::AcquirerError)
    }
}

/// The normalized outcome of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    /// Operation that produced this result.
    pub kind: TransactionKind,
    /// Whether the acquirer approved the transaction.
    pub success: bool,
    /// Acquirer result code, verbatim.
    pub code: String,
    /// Acquirer message, verbatim.
    pub message: String,
    /// Order reference the result belongs to.
    pub order_reference: OrderReference,
    /// Acquirer processing reference (`pasref`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_reference: Option<String>,
    /// Bank authorization code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<String>,
    /// `order;pasref;authcode`, or empty when the acquirer assigned no `pasref`.
    pub authorization_reference: String,
    /// Diagnostic fields (card issuer, fraud checks, timings).
    pub raw_fields: BTreeMap<String, String>,
}

impl TransactionResult {
    /// Assemble a result, deriving `success` and `authorization_reference`.
    #[must_use]
    pub fn new(
        kind: TransactionKind,
        code: impl Into<String>,
        message: impl Into<String>,
        order_reference: OrderReference,
        processing_reference: Option<String>,
        authorization_code: Option<String>,
        raw_fields: BTreeMap<String, String>,
    ) -> Self {
        let code = code.into();
        let authorization_reference = processing_reference
            .as_deref()
            .map(|pasref| {
                PriorReference::new(
                    order_reference.clone(),
                    pasref,
                    authorization_code.as_deref().unwrap_or_default(),
                )
                .to_string()
            })
            .unwrap_or_default();

        Self {
            kind,
            success: code == SUCCESS_CODE,
            code,
            message: message.into(),
            order_reference,
            processing_reference,
            authorization_code,
            authorization_reference,
            raw_fields,
        }
    }

    /// Classification of the result code.
    #[must_use]
    pub fn class(&self) -> ResultClass {
        ResultClass::from_code(&self.code)
    }

    /// Reference for a follow-up capture, void or refund.
    #[must_use]
    pub fn prior_reference(&self) -> Option<PriorReference> {
        self.processing_reference.as_ref().map(|pasref| {
            PriorReference::new(
                self.order_reference.clone(),
                pasref.clone(),
                self.authorization_code.clone().unwrap_or_default(),
            )
        })
    }

    /// The state the transaction is in after this result, given its prior state.
    ///
    /// A declined operation leaves the state unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidState`] if the operation was not valid
    /// from `previous`.
    pub fn next_state(&self, previous: TransactionState) -> Result<TransactionState, GatewayError> {
        if self.success {
            previous.apply(self.kind)
        } else {
            Ok(previous)
        }
    }
}
