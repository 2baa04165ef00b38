//! Gateway facade.

use std::sync::Arc;

use realex_core::{
    CardDetails, GatewayError, ResultClass, TransactionKind, TransactionOptions,
    TransactionResult,
};

use crate::builder::RequestBuilder;
use crate::config::GatewayConfig;
use crate::response::ResponseInterpreter;
use crate::signing::Signer;
use crate::transport::Transport;

/// Realex card gateway.
///
/// Each call is one request/response exchange. The gateway holds only
/// read-only state, so a single instance (or its clones) can serve concurrent
/// orders without locking.
///
/// Declines come back as `Ok` results with `success == false`. Errors for
/// which [`GatewayError::is_ambiguous`] is true mean the outcome is unknown.
/// Retrying with a new order reference risks a double charge. Resending with
/// the same order reference relies on the acquirer's duplicate detection.
///
/// # Example
///
/// ```no_run
/// use realex_client::{CardBrand, CardDetails, Credentials, GatewayConfig, RealexGateway,
///     TransactionOptions};
///
/// # async fn example() -> Result<(), realex_client::GatewayError> {
/// let credentials = Credentials::new("yourmerchantid", "yoursecret")?;
/// let gateway = RealexGateway::new(GatewayConfig::new(credentials))?;
///
/// let card = CardDetails::new("4263971921001307", 4, 2030, "Steve Smith", CardBrand::Visa)
///     .with_verification_value("123");
/// let auth = gateway
///     .authorize(500, card, &TransactionOptions::with_order_reference("ORD1"))
///     .await?;
///
/// if auth.success {
///     gateway
///         .capture(500, Some(&auth.authorization_reference), &TransactionOptions::default())
///         .await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RealexGateway {
    builder: RequestBuilder,
    signer: Signer,
    interpreter: ResponseInterpreter,
    transport: Transport,
    auto_settle: bool,
}

impl RealexGateway {
    /// Create a gateway from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] if the timeout or endpoint is
    /// invalid.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let transport = Transport::new(config.endpoint_url(), config.timeout()?)?;
        let signer = Signer::new(Arc::new(config.credentials), config.digest);

        tracing::info!(
            endpoint = %transport.endpoint(),
            environment = ?config.environment,
            merchant_id = %signer.credentials().merchant_id(),
            "Realex gateway configured"
        );

        Ok(Self {
            builder: RequestBuilder::new(config.default_currency, config.supported_currencies),
            interpreter: ResponseInterpreter::new(signer.clone()),
            signer,
            transport,
            auto_settle: config.auto_settle,
        })
    }

    /// Reserve `amount` on a card without settling.
    ///
    /// # Errors
    ///
    /// See [`GatewayError`]. Validation and configuration errors are raised
    /// before any network call.
    pub async fn authorize(
        &self,
        amount: i64,
        card: CardDetails,
        options: &TransactionOptions,
    ) -> Result<TransactionResult, GatewayError> {
        self.execute(TransactionKind::Authorize, Some(amount), Some(card), options)
            .await
    }

    /// Settle a prior authorization.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidState`] if `prior_reference` is absent or
    /// not an authorization reference.
    pub async fn capture(
        &self,
        amount: i64,
        prior_reference: Option<&str>,
        options: &TransactionOptions,
    ) -> Result<TransactionResult, GatewayError> {
        let options = with_prior(options, prior_reference);
        self.execute(TransactionKind::Capture, Some(amount), None, &options)
            .await
    }

    /// Authorize and settle in a single request.
    ///
    /// # Errors
    ///
    /// See [`GatewayError`].
    pub async fn purchase(
        &self,
        amount: i64,
        card: CardDetails,
        options: &TransactionOptions,
    ) -> Result<TransactionResult, GatewayError> {
        self.execute(TransactionKind::Purchase, Some(amount), Some(card), options)
            .await
    }

    /// Cancel an authorization or capture that has not been batched yet.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidState`] if `prior_reference` is absent,
    /// or if the acquirer reports the transaction as already settled.
    pub async fn void(
        &self,
        prior_reference: Option<&str>,
        options: &TransactionOptions,
    ) -> Result<TransactionResult, GatewayError> {
        let options = with_prior(options, prior_reference);
        let result = self
            .execute(TransactionKind::Void, None, None, &options)
            .await?;

        if reports_already_settled(&result) {
            tracing::info!(
                order_reference = %result.order_reference,
                result = %result.code,
                "Void refused: transaction already settled"
            );
            return Err(GatewayError::InvalidState(result.message));
        }
        Ok(result)
    }

    /// Refund `amount` of a settled transaction.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidState`] if `prior_reference` is absent,
    /// and [`GatewayError::Configuration`] if no rebate secret is configured.
    pub async fn refund(
        &self,
        amount: i64,
        prior_reference: Option<&str>,
        options: &TransactionOptions,
    ) -> Result<TransactionResult, GatewayError> {
        let options = with_prior(options, prior_reference);
        self.execute(TransactionKind::Refund, Some(amount), None, &options)
            .await
    }

    /// Take a payment: purchase when auto-settle is configured, otherwise
    /// authorize only.
    ///
    /// # Errors
    ///
    /// See [`RealexGateway::authorize`] and [`RealexGateway::purchase`].
    pub async fn process(
        &self,
        amount: i64,
        card: CardDetails,
        options: &TransactionOptions,
    ) -> Result<TransactionResult, GatewayError> {
        if self.auto_settle {
            self.purchase(amount, card, options).await
        } else {
            self.authorize(amount, card, options).await
        }
    }

    async fn execute(
        &self,
        kind: TransactionKind,
        amount: Option<i64>,
        card: Option<CardDetails>,
        options: &TransactionOptions,
    ) -> Result<TransactionResult, GatewayError> {
        let request = self.builder.build(kind, amount, card, options)?;
        let signed = self.builder.render(&request, &self.signer)?;

        tracing::info!(
            kind = %kind,
            order_reference = %request.order_reference,
            amount = ?request.amount,
            currency = ?request.currency,
            "Sending transaction to acquirer"
        );

        let raw = self.transport.send(&signed).await.map_err(|e| {
            tracing::warn!(
                kind = %kind,
                order_reference = %request.order_reference,
                error = %e,
                "Transaction outcome unknown; do not resubmit without reconciling"
            );
            e
        })?;

        let result = self.interpreter.parse(&raw, &request)?;

        tracing::info!(
            kind = %kind,
            order_reference = %result.order_reference,
            success = result.success,
            result = %result.code,
            pasref = ?result.processing_reference,
            "Acquirer responded"
        );

        Ok(result)
    }
}

fn with_prior(options: &TransactionOptions, prior_reference: Option<&str>) -> TransactionOptions {
    TransactionOptions {
        prior_reference: prior_reference.map(str::to_string),
        ..options.clone()
    }
}

/// The acquirer refuses a void on a batched transaction with a request-error
/// code and a message naming the settlement.
fn reports_already_settled(result: &TransactionResult) -> bool {
    if result.success || result.class() != ResultClass::RequestError {
        return false;
    }
    let message = result.message.to_ascii_lowercase();
    message.contains("settled") || message.contains("batch")
}
