//! Safe arithmetic evaluator for launcher queries
//!
//! Takes whatever the user typed and either produces a canonical number
//! string or nothing at all. There is no `eval`, no variables and no
//! functions: only numbers, `+ - * / % ^` and parentheses.
//!
//! - Input is rejected up front unless every non-whitespace character belongs
//!   to the calculator alphabet
//! - Parsing is a single recursive descent pass with the usual precedence,
//!   `^` being right associative
//! - Results are rounded to 10 decimal places to hide floating point noise
//!
//! # Examples
//!
//! ```
//! use spot_calc::{evaluate, looks_like_expression};
//!
//! assert_eq!(evaluate("2+3*4").as_deref(), Some("14"));
//! assert_eq!(evaluate("(2+3)*4").as_deref(), Some("20"));
//! assert_eq!(evaluate("2^3^2").as_deref(), Some("512"));
//! assert_eq!(evaluate("0.1 + 0.2").as_deref(), Some("0.3"));
//!
//! // infinities and plain words never produce a result
//! assert_eq!(evaluate("10/0"), None);
//! assert_eq!(evaluate("abc"), None);
//!
//! // a bare number evaluates, but is not worth showing as a calculation
//! assert_eq!(evaluate("42").as_deref(), Some("42"));
//! assert!(!looks_like_expression("42"));
//! ```

mod error;
mod format;
mod parser;

pub use error::CalcError;
pub use format::{ROUNDING_PRECISION, format_result, round_result};
pub use parser::{MAX_NESTING, Parser};

/// Characters that make a query look like a calculation rather than a file name.
pub const OPERATOR_CHARS: &[char] = &['+', '-', '*', '/', '^', '%', '(', ')'];

/// Returns true for every character the evaluator accepts (whitespace aside).
#[inline]
pub fn is_calculator_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '+' | '-' | '*' | '/' | '.' | '(' | ')' | '%' | '^')
}

/// Strips all whitespace and validates the calculator alphabet.
pub fn clean(text: &str) -> Result<String, CalcError> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();

    if cleaned.is_empty() || !cleaned.chars().all(is_calculator_char) {
        return Err(CalcError::InvalidExpression);
    }

    Ok(cleaned)
}

/// Evaluates `text` and reports why it failed when it does.
pub fn try_evaluate(text: &str) -> Result<String, CalcError> {
    let cleaned = clean(text)?;
    let value = Parser::new(&cleaned).parse()?;

    if !value.is_finite() {
        return Err(CalcError::NonFiniteResult);
    }

    Ok(format_result(round_result(value)))
}

/// Evaluates `text` as an arithmetic expression.
///
/// Returns `None` for anything that is not a valid, finite calculation.
pub fn evaluate(text: &str) -> Option<String> {
    try_evaluate(text).ok()
}

/// Whether the text contains an operator or a parenthesis.
///
/// Callers use this to decide if an evaluation result is worth displaying;
/// it does not affect [`evaluate`] itself.
#[inline]
pub fn looks_like_expression(text: &str) -> bool {
    text.contains(OPERATOR_CHARS)
}
