//! HTTPS transport to the acquirer.

use std::time::Duration;

use realex_core::GatewayError;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::builder::SignedRequest;

/// Sends signed requests to the acquirer endpoint.
///
/// One attempt per call. Card transactions are never resubmitted here: a
/// timeout does not prove the acquirer did nothing.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    endpoint: String,
}

impl Transport {
    /// Create a transport with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] if the endpoint is blank or the
    /// HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(GatewayError::Configuration("endpoint is not set".into()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, endpoint })
    }

    /// The endpoint requests are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post a signed request and return the raw response body.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Network`] on connection failure, timeout or a
    /// non-success HTTP status.
    pub async fn send(&self, request: &SignedRequest) -> Result<String, GatewayError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            kind = %request.kind,
            order_reference = %request.order_reference,
            "Posting request to acquirer"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/xml; charset=UTF-8")
            .body(request.body.clone())
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Network {
                message: format!("acquirer returned HTTP {status}"),
                timed_out: false,
            });
        }

        response.text().await.map_err(network_error)
    }
}

fn network_error(err: reqwest::Error) -> GatewayError {
    GatewayError::Network {
        timed_out: err.is_timeout(),
        message: err.to_string(),
    }
}
