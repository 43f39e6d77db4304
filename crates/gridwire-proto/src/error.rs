//! Protocol error types.

use thiserror::Error;

/// Errors raised while interpreting wire values.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// A numeric filter value could not be parsed.
    #[error("invalid number: {0:?}")]
    InvalidNumber(String),

    /// A date filter value matched none of the accepted formats.
    #[error("invalid date {value:?}, expected format {format:?}")]
    InvalidDate { value: String, format: String },

    /// A comparison operator outside the supported set.
    #[error("unsupported comparison: {0:?}")]
    UnsupportedComparison(String),

    /// A numeric or date filter slot without a comparison.
    #[error("missing comparison")]
    MissingComparison,

    /// A boolean filter value other than `true`/`false`.
    #[error("invalid boolean: {0:?}")]
    InvalidBoolean(String),
}
