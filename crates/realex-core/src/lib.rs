//! Core types for the Realex card gateway client.
//!
//! This crate provides the domain types shared by the signing, transport and
//! response layers:
//!
//! - **Identifiers**: `OrderReference`
//! - **Credentials**: `Credentials`
//! - **Cards**: `CardDetails`, `CardBrand`
//! - **Transactions**: `TransactionKind`, `TransactionRequest`, `TransactionOptions`,
//!   `TransactionResult`, `PriorReference`, `TransactionState`
//!
//! # Amounts
//!
//! Amounts are integer minor currency units (pence for GBP, cents for EUR),
//! stored as `i64` so that a negative input can be rejected rather than wrapped.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod card;
pub mod credentials;
pub mod error;
pub mod ids;
pub mod transaction;

pub use card::{CardBrand, CardDetails};
pub use credentials::Credentials;
pub use error::{GatewayError, Result};
pub use ids::OrderReference;
pub use transaction::{
    FraudInfo, PriorReference, ResultClass, TransactionKind, TransactionOptions,
    TransactionRequest, TransactionResult, TransactionState, MAX_COMMENTS,
};
