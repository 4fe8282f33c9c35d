//! Error types for the calculation service.

use thiserror::Error;

use crate::operator::Operator;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for calculation requests.
///
/// The first five variants are client input failures and map to HTTP 400.
/// Everything else is a server-side fault.
#[derive(Error, Debug)]
pub enum Error {
    /// Request body is absent, empty, unparseable, or not a JSON object.
    #[error("No data provided")]
    InvalidRequest,

    /// One or more required fields are absent or `null`.
    #[error("Missing required fields: {}", .fields.join(", "))]
    MissingField {
        /// Every required field name, in declaration order.
        fields: Vec<&'static str>,
    },

    /// An operand could not be converted to a finite number.
    #[error("num1 and num2 must be valid numbers")]
    InvalidType,

    /// The operator is not one of [`Operator::ALL`].
    #[error("Invalid operator. Must be one of: {}", Operator::symbols().join(", "))]
    InvalidOperator,

    /// Division with a zero divisor.
    #[error("Division by zero is not allowed")]
    DivisionByZero,

    /// Internal error (unexpected state).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if the error was caused by the caller's input.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest
                | Self::MissingField { .. }
                | Self::InvalidType
                | Self::InvalidOperator
                | Self::DivisionByZero
        )
    }

    /// Stable tag for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::MissingField { .. } => "missing_field",
            Self::InvalidType => "invalid_type",
            Self::InvalidOperator => "invalid_operator",
            Self::DivisionByZero => "division_by_zero",
            Self::Internal { .. } => "internal_error",
            Self::Io(_) => "io_error",
        }
    }

    /// Creates an internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a missing-field error listing every required field.
    #[must_use]
    pub fn missing_fields() -> Self {
        Self::MissingField {
            fields: crate::request::REQUIRED_FIELDS.to_vec(),
        }
    }
}
