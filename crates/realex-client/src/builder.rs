//! Request building and XML rendering.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use realex_core::{
    CardDetails, GatewayError, OrderReference, PriorReference, TransactionKind,
    TransactionOptions, TransactionRequest, MAX_COMMENTS,
};

use crate::signing::{DigestAlgorithm, Signer};
use crate::wire::{
    AmountXml, AutoSettleXml, CardXml, CommentXml, CommentsXml, CvnXml, RequestXml, TssInfoXml,
};

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Source of request timestamps that never goes backwards.
///
/// If the system clock steps back, the last issued second is reused until
/// the clock catches up.
#[derive(Debug, Default)]
pub struct Clock {
    last_issued: AtomicI64,
}

impl Clock {
    /// Create a clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next timestamp in the acquirer's `YYYYMMDDHHMMSS` form.
    pub fn next_timestamp(&self) -> String {
        self.issue(Utc::now())
    }

    fn issue(&self, now: DateTime<Utc>) -> String {
        let now_secs = now.timestamp();
        let previous = self.last_issued.fetch_max(now_secs, Ordering::SeqCst);
        let secs = previous.max(now_secs);
        DateTime::<Utc>::from_timestamp(secs, 0)
            .unwrap_or(now)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }
}

/// A rendered request body, ready for the transport.
///
/// The body holds the card number, so `Debug` shows only the routing fields.
#[derive(Clone)]
pub struct SignedRequest {
    /// Operation.
    pub kind: TransactionKind,
    /// Order reference.
    pub order_reference: OrderReference,
    /// Request digest.
    pub digest: String,
    /// XML body.
    pub body: String,
}

impl fmt::Debug for SignedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedRequest")
            .field("kind", &self.kind)
            .field("order_reference", &self.order_reference)
            .field("digest", &self.digest)
            .finish_non_exhaustive()
    }
}

/// Builds validated transaction requests.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    default_currency: String,
    supported_currencies: Vec<String>,
    clock: Arc<Clock>,
}

impl RequestBuilder {
    /// Create a builder.
    ///
    /// An empty `supported_currencies` list accepts any well-formed code.
    #[must_use]
    pub fn new(default_currency: impl Into<String>, supported_currencies: Vec<String>) -> Self {
        Self {
            default_currency: default_currency.into(),
            supported_currencies,
            clock: Arc::new(Clock::new()),
        }
    }

    /// Build a request stamped with the current time.
    ///
    /// Capture, void and refund take the prior authorization from
    /// `options.prior_reference` and must not be given a card. Authorize and
    /// purchase need a card and `options.order_reference`.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidState`] if a follow-up operation has no usable
    ///   prior reference.
    /// - [`GatewayError::Validation`] for any other bad input.
    pub fn build(
        &self,
        kind: TransactionKind,
        amount: Option<i64>,
        card: Option<CardDetails>,
        options: &TransactionOptions,
    ) -> Result<TransactionRequest, GatewayError> {
        self.build_at(kind, amount, card, options, self.clock.next_timestamp())
    }

    /// Build a request with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// See [`RequestBuilder::build`].
    pub fn build_at(
        &self,
        kind: TransactionKind,
        amount: Option<i64>,
        card: Option<CardDetails>,
        options: &TransactionOptions,
        timestamp: String,
    ) -> Result<TransactionRequest, GatewayError> {
        let (order_reference, card, prior) = if kind.requires_prior_reference() {
            let prior = prior_reference(kind, options)?;
            if card.is_some() {
                return Err(GatewayError::Validation(format!(
                    "{kind} references a prior transaction and takes no card"
                )));
            }
            if let Some(raw) = options.order_reference.as_deref() {
                let supplied = OrderReference::new(raw)?;
                if supplied != prior.order_reference {
                    return Err(GatewayError::Validation(format!(
                        "order reference {supplied} does not match prior order {}",
                        prior.order_reference
                    )));
                }
            }
            (prior.order_reference.clone(), None, Some(prior))
        } else {
            let card = card
                .ok_or_else(|| GatewayError::Validation(format!("{kind} needs card details")))?;
            card.validate()?;
            let raw = options
                .order_reference
                .as_deref()
                .ok_or_else(|| GatewayError::Validation("order reference is required".into()))?;
            (OrderReference::new(raw)?, Some(card), None)
        };

        let (amount, currency) = if kind.carries_amount() {
            let amount = amount
                .ok_or_else(|| GatewayError::Validation(format!("{kind} needs an amount")))?;
            if amount <= 0 {
                return Err(GatewayError::Validation(format!(
                    "amount must be positive, got {amount}"
                )));
            }
            let currency = options
                .currency
                .as_deref()
                .unwrap_or(&self.default_currency);
            self.check_currency(currency)?;
            (Some(amount), Some(currency.to_string()))
        } else {
            (None, None)
        };

        if options.comments.len() > MAX_COMMENTS {
            return Err(GatewayError::Validation(format!(
                "at most {MAX_COMMENTS} comments are allowed, got {}",
                options.comments.len()
            )));
        }

        Ok(TransactionRequest {
            kind,
            order_reference,
            amount,
            currency,
            card,
            prior,
            timestamp,
            comments: options.comments.clone(),
            fraud: (!options.fraud.is_empty()).then(|| options.fraud.clone()),
        })
    }

    /// Sign a request and render it as XML.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] if signing fails or a refund is
    /// requested without a rebate secret, and [`GatewayError::Validation`] if
    /// the XML cannot be written.
    pub fn render(
        &self,
        request: &TransactionRequest,
        signer: &Signer,
    ) -> Result<SignedRequest, GatewayError> {
        let digest = signer.sign(request)?;
        let credentials = signer.credentials();

        let refundhash = match request.kind {
            TransactionKind::Refund => Some(signer.refund_hash()?),
            _ => None,
        };

        let (sha1hash, md5hash) = match signer.algorithm() {
            DigestAlgorithm::Sha1 => (Some(digest.clone()), None),
            DigestAlgorithm::Md5 => (None, Some(digest.clone())),
        };

        let xml = RequestXml {
            timestamp: request.timestamp.clone(),
            kind: request.kind.wire_type(),
            merchantid: credentials.merchant_id().to_string(),
            account: credentials.account().map(str::to_string),
            orderid: request.order_reference.to_string(),
            pasref: request
                .prior
                .as_ref()
                .map(|p| p.processing_reference.clone()),
            authcode: request
                .prior
                .as_ref()
                .map(|p| p.authorization_code.clone()),
            amount: request
                .amount
                .zip(request.currency.clone())
                .map(|(value, currency)| AmountXml { currency, value }),
            card: request.card.as_ref().map(card_xml),
            refundhash,
            autosettle: request.kind.auto_settle().map(|settle| AutoSettleXml {
                flag: u8::from(settle),
            }),
            comments: (!request.comments.is_empty()).then(|| CommentsXml {
                comment: request
                    .comments
                    .iter()
                    .enumerate()
                    .map(|(i, text)| CommentXml {
                        id: i + 1,
                        text: text.clone(),
                    })
                    .collect(),
            }),
            tssinfo: request.fraud.as_ref().map(|f| TssInfoXml {
                custnum: f.customer_number.clone(),
                prodid: f.product_id.clone(),
                varref: f.variable_reference.clone(),
                custipaddress: f.customer_ip.clone(),
            }),
            sha1hash,
            md5hash,
        };

        let body = quick_xml::se::to_string(&xml).map_err(|e| {
            GatewayError::Validation(format!("failed to render {} request: {e}", request.kind))
        })?;

        Ok(SignedRequest {
            kind: request.kind,
            order_reference: request.order_reference.clone(),
            digest,
            body: format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>{body}"),
        })
    }

    fn check_currency(&self, currency: &str) -> Result<(), GatewayError> {
        let well_formed = currency.len() == 3 && currency.bytes().all(|b| b.is_ascii_uppercase());
        if !well_formed {
            return Err(GatewayError::Validation(format!(
                "currency {currency:?} is not a three-letter ISO code"
            )));
        }
        if !self.supported_currencies.is_empty()
            && !self.supported_currencies.iter().any(|c| c == currency)
        {
            return Err(GatewayError::Validation(format!(
                "currency {currency} is not supported"
            )));
        }
        Ok(())
    }
}

fn prior_reference(
    kind: TransactionKind,
    options: &TransactionOptions,
) -> Result<PriorReference, GatewayError> {
    let raw = options
        .prior_reference
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| {
            GatewayError::InvalidState(format!("{kind} needs a prior authorization reference"))
        })?;
    raw.parse()
}

fn card_xml(card: &CardDetails) -> CardXml {
    CardXml {
        number: card.number.clone(),
        expdate: card.expiry_date(),
        chname: card.holder_name.clone(),
        brand: card.brand.code(),
        issueno: card.issue_number.clone(),
        cvn: card.verification_value.as_ref().map(|cvv| CvnXml {
            number: cvv.clone(),
            presind: 1,
        }),
    }
}
