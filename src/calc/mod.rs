//! Numeric core: the infix expression evaluator and the single-operator
//! calculator. Nothing in here touches storage.

mod evaluator;
mod operator;

pub use evaluator::{classify_chain, evaluate};
pub use operator::{Operator, compute};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("invalid or unsupported expression")]
    InvalidExpression,
    #[error("division by zero")]
    DivisionByZero,
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),
    #[error("{operator} is undefined for {value}")]
    DomainError { operator: Operator, value: f64 },
}

/// Renders a number the way results are stored and displayed: integral values
/// without a fractional part, non-finite values as `Infinity`/`-Infinity`/`NaN`.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if value == 0.0 {
        // drop the sign of negative zero
        "0".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_integral_values_without_fraction() {
        assert_eq!(format_number(8.0), "8");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(2.5), "2.5");
    }

    #[test]
    fn formats_special_values() {
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(-0.0), "0");
    }
}
