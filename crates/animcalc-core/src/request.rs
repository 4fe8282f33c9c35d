//! Request parsing and validation.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::operator::Operator;
use crate::response::CalculationResult;

/// Fields every calculation payload must carry.
pub const REQUIRED_FIELDS: [&str; 3] = ["num1", "num2", "operator"];

/// A validated calculation request.
///
/// Untrusted input goes through [`CalculationRequest::from_json`] or
/// [`CalculationRequest::from_value`], which check the payload in a fixed
/// order and stop at the first failure:
///
/// 1. the payload is a non-empty JSON object
/// 2. `num1`, `num2` and `operator` are present and not `null`
/// 3. both operands convert to finite numbers
/// 4. the operator is one of [`Operator::ALL`]
///
/// The zero-divisor check happens in [`CalculationRequest::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculationRequest {
    /// Left operand.
    pub num1: f64,
    /// Right operand.
    pub num2: f64,
    /// Operation to apply.
    pub operator: Operator,
}

impl CalculationRequest {
    /// Creates a request from already-typed values.
    #[must_use]
    pub fn new(num1: f64, num2: f64, operator: Operator) -> Self {
        Self {
            num1,
            num2,
            operator,
        }
    }

    /// Parses and validates a raw request body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the body is empty or not JSON,
    /// otherwise whatever [`CalculationRequest::from_value`] reports. Numbers
    /// beyond the `f64` range are valid JSON and fail as operands.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body).map_err(|_| Error::InvalidRequest)?;
        Self::from_value(&value)
    }

    /// Validates an already-decoded JSON payload.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure, see the type-level docs.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = match value.as_object() {
            Some(object) if !object.is_empty() => object,
            _ => return Err(Error::InvalidRequest),
        };

        let (Some(num1), Some(num2), Some(operator)) = (
            present(object, "num1"),
            present(object, "num2"),
            present(object, "operator"),
        ) else {
            return Err(Error::missing_fields());
        };

        let num1 = parse_operand(num1)?;
        let num2 = parse_operand(num2)?;

        let operator = operator
            .as_str()
            .and_then(Operator::from_symbol)
            .ok_or(Error::InvalidOperator)?;

        Ok(Self::new(num1, num2, operator))
    }

    /// Computes the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DivisionByZero`] for `/` with a zero divisor, and
    /// [`Error::Internal`] when the computed value is not a finite number.
    pub fn evaluate(&self) -> Result<CalculationResult> {
        if self.operator == Operator::Divide && self.num2 == 0.0 {
            return Err(Error::DivisionByZero);
        }

        let value = self.operator.apply(self.num1, self.num2);
        if value.is_finite() {
            Ok(CalculationResult::new(value))
        } else {
            Err(Error::internal(self.describe_fault(value)))
        }
    }

    fn describe_fault(&self, value: f64) -> String {
        if self.operator == Operator::Power && self.num1 == 0.0 && self.num2 < 0.0 {
            "0.0 cannot be raised to a negative power".to_string()
        } else if value.is_nan() {
            "result is not a real number".to_string()
        } else {
            "Numerical result out of range".to_string()
        }
    }
}

fn present<'a>(object: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    object.get(field).filter(|value| !value.is_null())
}

/// Converts a JSON operand to a finite `f64`.
///
/// Numbers are taken as-is. Strings are trimmed and parsed with the standard
/// float grammar. Anything else, or a non-finite result, is rejected.
///
/// # Errors
///
/// Returns [`Error::InvalidType`] if the value is not numeric.
pub fn parse_operand(value: &Value) -> Result<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite()).ok_or(Error::InvalidType)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_value_valid() {
        let req = CalculationRequest::from_value(&json!({
            "num1": 10, "num2": 5, "operator": "+"
        }))
        .unwrap();

        assert_eq!(req, CalculationRequest::new(10.0, 5.0, Operator::Add));
    }

    #[test]
    fn test_numeric_strings() {
        let req = CalculationRequest::from_value(&json!({
            "num1": " 2.5 ", "num2": "1e1", "operator": "*"
        }))
        .unwrap();

        assert_eq!(req.num1, 2.5);
        assert_eq!(req.num2, 10.0);
    }

    #[test]
    fn test_invalid_body() {
        let bodies: [&[u8]; 8] = [b"", b"   ", b"not json", b"null", b"[]", b"[1,2]", b"42", b"{}"];
        for body in bodies {
            assert!(
                matches!(
                    CalculationRequest::from_json(body),
                    Err(Error::InvalidRequest)
                ),
                "body {:?}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_missing_fields() {
        let cases = [
            json!({"num2": 5, "operator": "+"}),
            json!({"num1": 10, "operator": "+"}),
            json!({"num1": 10, "num2": 5}),
            json!({"num1": null, "num2": 5, "operator": "+"}),
            json!({"unrelated": true}),
        ];

        for case in cases {
            let err = CalculationRequest::from_value(&case).unwrap_err();
            assert!(matches!(err, Error::MissingField { .. }), "{case}");
            let msg = err.to_string();
            for field in REQUIRED_FIELDS {
                assert!(msg.contains(field), "{msg}");
            }
        }
    }

    #[test]
    fn test_invalid_operands() {
        let cases = [
            json!({"num1": "abc", "num2": "xyz", "operator": "+"}),
            json!({"num1": 1, "num2": "xyz", "operator": "+"}),
            json!({"num1": true, "num2": 1, "operator": "+"}),
            json!({"num1": [1], "num2": 1, "operator": "+"}),
            json!({"num1": {"v": 1}, "num2": 1, "operator": "+"}),
            json!({"num1": "inf", "num2": 1, "operator": "+"}),
            json!({"num1": 1, "num2": "NaN", "operator": "+"}),
        ];

        for case in cases {
            assert!(
                matches!(
                    CalculationRequest::from_value(&case),
                    Err(Error::InvalidType)
                ),
                "{case}"
            );
        }
    }

    #[test]
    fn test_out_of_range_numbers() {
        let huge = format!("1{}", "0".repeat(400));
        let bodies = [
            r#"{"num1": 1e400, "num2": 1, "operator": "+"}"#.to_string(),
            r#"{"num1": 1, "num2": -1e400, "operator": "*"}"#.to_string(),
            format!(r#"{{"num1": {huge}, "num2": 1, "operator": "-"}}"#),
            r#"{"num1": 1e400, "num2": 1, "operator": "nope"}"#.to_string(),
        ];

        for body in bodies {
            assert!(
                matches!(
                    CalculationRequest::from_json(body.as_bytes()),
                    Err(Error::InvalidType)
                ),
                "{body}"
            );
        }

        let req = CalculationRequest::from_json(br#"{"num1": 1e300, "num2": 2, "operator": "+"}"#)
            .unwrap();
        assert_eq!(req.num1, 1e300);
    }

    #[test]
    fn test_operand_checked_before_operator() {
        let err = CalculationRequest::from_value(&json!({
            "num1": "abc", "num2": 1, "operator": "nope"
        }))
        .unwrap_err();

        assert!(matches!(err, Error::InvalidType));
    }

    #[test]
    fn test_invalid_operator() {
        for operator in [json!("invalid"), json!("POW"), json!(""), json!(1), json!(["+"])] {
            let err = CalculationRequest::from_value(&json!({
                "num1": 10, "num2": 5, "operator": operator
            }))
            .unwrap_err();
            assert!(matches!(err, Error::InvalidOperator));
            assert!(err.to_string().contains("Invalid operator"));
        }
    }

    #[test]
    fn test_evaluate_division_by_zero() {
        for zero in [0.0, -0.0] {
            let err = CalculationRequest::new(10.0, zero, Operator::Divide)
                .evaluate()
                .unwrap_err();
            assert!(matches!(err, Error::DivisionByZero));
        }

        // Only `/` guards the divisor.
        let ok = CalculationRequest::new(10.0, 0.0, Operator::Power)
            .evaluate()
            .unwrap();
        assert_eq!(ok.result, 1.0);
    }

    #[test]
    fn test_evaluate_non_finite() {
        let err = CalculationRequest::new(0.0, -1.0, Operator::Power)
            .evaluate()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Internal error: 0.0 cannot be raised to a negative power"
        );

        let err = CalculationRequest::new(-8.0, 0.5, Operator::Power)
            .evaluate()
            .unwrap_err();
        assert_eq!(err.to_string(), "Internal error: result is not a real number");

        let err = CalculationRequest::new(10.0, 400.0, Operator::Power)
            .evaluate()
            .unwrap_err();
        assert_eq!(err.to_string(), "Internal error: Numerical result out of range");

        let err = CalculationRequest::new(f64::MAX, f64::MAX, Operator::Add)
            .evaluate()
            .unwrap_err();
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_parse_operand() {
        assert_eq!(parse_operand(&json!(-10)).unwrap(), -10.0);
        assert_eq!(parse_operand(&json!(10.5)).unwrap(), 10.5);
        assert_eq!(parse_operand(&json!("-3")).unwrap(), -3.0);
        assert!(parse_operand(&json!("")).is_err());
        assert!(parse_operand(&json!(null)).is_err());
    }
}
