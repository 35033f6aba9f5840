use std::sync::OnceLock;

use regex::Regex;

use super::CalcError;

static DEGREE_CALL_RE: OnceLock<Regex> = OnceLock::new();
static TRIG_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn degree_call_regex() -> &'static Regex {
    DEGREE_CALL_RE.get_or_init(|| {
        Regex::new(r"\b(sin|cos|tan)\(\s*(-?\d+(?:\.\d+)?)\s*\)")
            .unwrap_or_else(|error| panic!("degree call regex failed to compile: {error}"))
    })
}

fn trig_name_regex() -> &'static Regex {
    TRIG_NAME_RE.get_or_init(|| {
        Regex::new(r"\b(sin|cos|tan)\b")
            .unwrap_or_else(|error| panic!("trig name regex failed to compile: {error}"))
    })
}

/// Rewrites `sin(30)`-style calls on a numeric literal, optionally signed and
/// padded with spaces, so the argument is read as degrees by the
/// radian-based engine.
fn degrees_to_radians(expression: &str) -> String {
    degree_call_regex()
        .replace_all(expression, "${1}(${2}*pi/180)")
        .into_owned()
}

/// Evaluates an infix expression. Trigonometric calls on literal arguments
/// use degrees; anything else is handed to `meval` unchanged.
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    if expression.trim().is_empty() {
        return Err(CalcError::InvalidExpression);
    }

    let rewritten = degrees_to_radians(expression);
    tracing::debug!("Evaluating expression {:?} as {:?}", expression, rewritten);

    meval::eval_str(&rewritten).map_err(|e| {
        tracing::debug!("Expression {:?} rejected: {}", expression, e);
        CalcError::InvalidExpression
    })
}

/// Picks the operator tag recorded for a chain expression: the single
/// operator it contains, or `chain` when there are zero or several.
pub fn classify_chain(expression: &str) -> String {
    let trig: Vec<&str> = trig_name_regex()
        .find_iter(expression)
        .map(|m| m.as_str())
        .collect();
    let arith: Vec<char> = expression
        .chars()
        .filter(|c| matches!(c, '+' | '-' | '*' | '/'))
        .collect();

    match (trig.as_slice(), arith.as_slice()) {
        ([name], []) => (*name).to_string(),
        ([], [op]) => op.to_string(),
        _ => "chain".to_string(),
    }
}
