//! Response types for calculations.

use serde::{Deserialize, Serialize};

/// Successful calculation outcome.
///
/// Serializes as `{"result": <number>}`. The value is always an `f64`, so
/// integral results render with a trailing `.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// Computed value.
    pub result: f64,
}

impl CalculationResult {
    /// Wraps a computed value.
    #[must_use]
    pub fn new(result: f64) -> Self {
        Self { result }
    }
}
