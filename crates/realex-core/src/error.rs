//! Error types for the Realex gateway client.

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors that can occur while processing a card transaction.
///
/// A decline is not an error: the acquirer answered, and the answer is
/// reported as a [`crate::TransactionResult`] with `success == false`.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Missing or invalid credentials. Raised before any network call.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed request input. The caller must fix the input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Transport failure or timeout.
    ///
    /// The outcome is unknown: the acquirer may have processed the
    /// transaction. Do not resubmit blindly; reconcile out of band.
    #[error("network error: {message}")]
    Network {
        /// Description of the failure.
        message: String,
        /// Whether the call hit the per-request timeout.
        timed_out: bool,
    },

    /// The acquirer's response could not be parsed or lacks required fields.
    #[error("malformed response: {reason}")]
    MalformedResponse {
        /// What was wrong with the payload.
        reason: String,
    },

    /// The response digest is missing or does not match the recomputed one.
    #[error("response verification failed: {0}")]
    ResponseVerification(String),

    /// The operation is not valid for the transaction's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl GatewayError {
    /// Build a [`GatewayError::MalformedResponse`].
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }

    /// Whether the transaction may have happened despite the error.
    ///
    /// Callers should leave the payment pending rather than failing it when
    /// this returns `true`.
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::MalformedResponse { .. } | Self::ResponseVerification(_)
        )
    }

    /// Whether the request was rejected locally, before reaching the acquirer.
    #[must_use]
    pub fn is_local_rejection(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::Validation(_) | Self::InvalidState(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_errors_are_ambiguous() {
        let err = GatewayError::Network {
            message: "timed out".into(),
            timed_out: true,
        };
        assert!(err.is_ambiguous());
        assert!(!err.is_local_rejection());
    }

    #[test]
    fn validation_errors_are_local() {
        let err = GatewayError::Validation("amount must be positive".into());
        assert!(!err.is_ambiguous());
        assert!(err.is_local_rejection());
    }

    #[test]
    fn malformed_display_includes_reason() {
        let err = GatewayError::malformed("missing <result>");
        assert_eq!(err.to_string(), "malformed response: missing <result>");
    }
}
