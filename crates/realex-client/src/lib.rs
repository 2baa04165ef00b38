//! Realex card gateway client.
//!
//! This crate talks to the Realex remote XML API. It covers authorize, capture,
//! purchase, void and refund. It builds and signs requests, posts them over
//! HTTPS and verifies the signed responses.
//!
//! # Example
//!
//! ```no_run
//! use realex_client::{CardBrand, CardDetails, GatewayConfig, RealexGateway, TransactionOptions};
//!
//! # async fn example() -> Result<(), realex_client::GatewayError> {
//! let gateway = RealexGateway::new(GatewayConfig::from_env()?)?;
//!
//! let card = CardDetails::new("4263971921001307", 4, 2030, "Steve Smith", CardBrand::Visa)
//!     .with_verification_value("123");
//! let result = gateway
//!     .purchase(1999, card, &TransactionOptions::with_order_reference("ORDER-42"))
//!     .await?;
//!
//! println!("{}: {}", result.code, result.message);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod builder;
mod config;
mod gateway;
mod response;
mod signing;
mod transport;
mod wire;

pub use builder::{Clock, RequestBuilder, SignedRequest};
pub use config::{Environment, GatewayConfig};
pub use gateway::RealexGateway;
pub use response::ResponseInterpreter;
pub use signing::{constant_time_eq, DigestAlgorithm, ResponseFields, Signer};
pub use transport::Transport;

pub use realex_core::{
    CardBrand, CardDetails, Credentials, FraudInfo, GatewayError, OrderReference, PriorReference,
    Result, ResultClass, TransactionKind, TransactionOptions, TransactionRequest,
    TransactionResult, TransactionState,
};
