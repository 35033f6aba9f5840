use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use super::{CalcError, format_number};

/// Every operator a calculation can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Sin,
    Cos,
    Tan,
    Log,
    Ln,
    Sqrt,
    Abs,
    Exp,
    Rad,
    Deg,
    Percent,
    Square,
    Pi,
    Chain,
}

impl Operator {
    pub const ALL: [Operator; 18] = [
        Operator::Add,
        Operator::Subtract,
        Operator::Multiply,
        Operator::Divide,
        Operator::Sin,
        Operator::Cos,
        Operator::Tan,
        Operator::Log,
        Operator::Ln,
        Operator::Sqrt,
        Operator::Abs,
        Operator::Exp,
        Operator::Rad,
        Operator::Deg,
        Operator::Percent,
        Operator::Square,
        Operator::Pi,
        Operator::Chain,
    ];

    /// The tag stored alongside each calculation.
    pub fn tag(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Sin => "sin",
            Operator::Cos => "cos",
            Operator::Tan => "tan",
            Operator::Log => "log",
            Operator::Ln => "ln",
            Operator::Sqrt => "sqrt",
            Operator::Abs => "abs",
            Operator::Exp => "exp",
            Operator::Rad => "rad",
            Operator::Deg => "deg",
            Operator::Percent => "%",
            Operator::Square => "^2",
            Operator::Pi => "pi",
            Operator::Chain => "chain",
        }
    }

    /// Whether the operator needs a first operand at all.
    pub fn takes_operand(self) -> bool {
        !matches!(self, Operator::Pi | Operator::Chain)
    }

    /// Human readable form of `a <op> b` as it is written to the history.
    pub fn display_expression(self, a: f64, b: Option<f64>) -> String {
        let x = format_number(a);
        match self {
            Operator::Add | Operator::Subtract => {
                format!("{} {} {}", x, self.tag(), format_number(b.unwrap_or(0.0)))
            }
            Operator::Multiply | Operator::Divide => {
                format!("{} {} {}", x, self.tag(), format_number(b.unwrap_or(1.0)))
            }
            Operator::Sin
            | Operator::Cos
            | Operator::Tan
            | Operator::Log
            | Operator::Ln
            | Operator::Abs
            | Operator::Exp
            | Operator::Rad
            | Operator::Deg => format!("{}({})", self.tag(), x),
            Operator::Sqrt => format!("√{x}"),
            Operator::Percent => format!("{x}%"),
            Operator::Square => format!("{x}²"),
            Operator::Pi => "pi".to_string(),
            Operator::Chain => x,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Operator {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "square" => Ok(Operator::Square),
            "percent" => Ok(Operator::Percent),
            tag => Operator::ALL
                .into_iter()
                .find(|op| op.tag() == tag)
                .ok_or_else(|| CalcError::UnsupportedOperator(s.to_string())),
        }
    }
}

fn radians(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

fn positive(operator: Operator, a: f64) -> Result<f64, CalcError> {
    if a <= 0.0 {
        return Err(CalcError::DomainError { operator, value: a });
    }
    Ok(a)
}

/// Applies one operator to `a` (and `b` for the arithmetic ones).
///
/// Missing second operands fall back to the operator's identity, so `10 /`
/// yields `10` while `10 / 0` is a [`CalcError::DivisionByZero`].
pub fn compute(a: f64, operator: Operator, b: Option<f64>) -> Result<f64, CalcError> {
    let value = match operator {
        Operator::Add => a + b.unwrap_or(0.0),
        Operator::Subtract => a - b.unwrap_or(0.0),
        Operator::Multiply => a * b.unwrap_or(1.0),
        Operator::Divide => match b {
            Some(divisor) if divisor == 0.0 => return Err(CalcError::DivisionByZero),
            divisor => a / divisor.unwrap_or(1.0),
        },
        Operator::Sin => radians(a).sin(),
        Operator::Cos => radians(a).cos(),
        Operator::Tan => radians(a).tan(),
        Operator::Log => positive(operator, a)?.log10(),
        Operator::Ln => positive(operator, a)?.ln(),
        Operator::Sqrt => {
            if a < 0.0 {
                return Err(CalcError::DomainError { operator, value: a });
            }
            a.sqrt()
        }
        Operator::Abs => a.abs(),
        Operator::Exp => a.exp(),
        Operator::Rad => radians(a),
        Operator::Deg => a * 180.0 / PI,
        Operator::Percent => a / 100.0,
        Operator::Square => a * a,
        Operator::Pi => PI,
        Operator::Chain => return Err(CalcError::UnsupportedOperator(operator.tag().to_string())),
    };
    Ok(value)
}
