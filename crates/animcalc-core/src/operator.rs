//! Binary arithmetic operators.

use serde::{Deserialize, Serialize};

/// A supported binary operation.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// `+`
    #[serde(rename = "+")]
    Add,
    /// `-`
    #[serde(rename = "-")]
    Subtract,
    /// `*`
    #[serde(rename = "*")]
    Multiply,
    /// `/`
    #[serde(rename = "/")]
    Divide,
    /// `pow`
    #[serde(rename = "pow")]
    Power,
}

impl Operator {
    /// All operators, in the order they are reported to clients.
    pub const ALL: [Operator; 5] = [
        Self::Add,
        Self::Subtract,
        Self::Multiply,
        Self::Divide,
        Self::Power,
    ];

    /// Looks up an operator by its wire symbol. Matching is exact.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    /// Returns the wire symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Power => "pow",
        }
    }

    /// Returns every wire symbol in [`Operator::ALL`] order.
    #[must_use]
    pub fn symbols() -> Vec<&'static str> {
        Self::ALL.iter().map(|op| op.symbol()).collect()
    }

    /// Applies the operator with IEEE-754 semantics.
    ///
    /// No guards are applied here; division by zero yields an infinity and
    /// undefined powers yield NaN. Callers validate before and after.
    #[must_use]
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Add => lhs + rhs,
            Self::Subtract => lhs - rhs,
            Self::Multiply => lhs * rhs,
            Self::Divide => lhs / rhs,
            Self::Power => lhs.powf(rhs),
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}
