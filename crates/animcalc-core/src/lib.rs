//! # Animcalc Core
//!
//! The calculation handler behind the Animation Calculator service.
//!
//! This crate is pure: it parses a request payload, validates it, applies one
//! of five binary operators and returns either a result or a typed error.
//! It performs no I/O and holds no state, so it can be called concurrently
//! from any number of request handlers.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod operator;
pub mod request;
pub mod response;
pub mod types;

pub use error::{Error, Result};
pub use operator::Operator;
pub use request::{CalculationRequest, REQUIRED_FIELDS};
pub use response::CalculationResult;
pub use types::RequestId;

/// Parses, validates and evaluates a raw request body.
///
/// # Errors
///
/// Returns the first validation failure, or [`Error::Internal`] if the
/// computation does not produce a finite number.
pub fn calculate(body: &[u8]) -> Result<CalculationResult> {
    CalculationRequest::from_json(body)?.evaluate()
}
