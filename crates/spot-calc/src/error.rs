/// Why an expression produced no result.
///
/// None of these are shown to the user: a partial or mistyped query is the
/// common case while typing, so [`crate::evaluate`] collapses every variant
/// into `None`.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CalcError {
    #[error("Expression is empty or contains characters outside of the calculator alphabet")]
    InvalidExpression,
    #[error("Expected a number at position {position}")]
    InvalidNumber { position: usize },
    #[error("Expression nests deeper than the parser allows (at position {position})")]
    NestingTooDeep { position: usize },
    #[error("Expression does not evaluate to a finite number")]
    NonFiniteResult,
}
