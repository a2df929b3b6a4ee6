//! Error types for sanitizer configuration.
//!
//! Masking itself never fails; only option assignment and matcher
//! compilation can produce a [`ValidationError`].

use thiserror::Error;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Errors raised while assigning or compiling sanitizer options.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The value given for an option has the wrong shape.
    #[error("invalid option type: {option} must be {expected}")]
    InvalidOptionType {
        option: &'static str,
        expected: &'static str,
    },

    /// The option name is not one the sanitizer understands.
    #[error("unknown option: {0}")]
    UnknownOption(String),

    /// A field or header name could not be compiled into a matcher.
    #[error("invalid pattern for {option}: {pattern:?}: {source}")]
    InvalidPattern {
        option: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Configuration text was not valid JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ValidationError {
    pub(crate) fn invalid_type(option: &'static str, expected: &'static str) -> Self {
        ValidationError::InvalidOptionType { option, expected }
    }

    /// Name of the option this error concerns, when there is one.
    pub fn option(&self) -> Option<&str> {
        match self {
            ValidationError::InvalidOptionType { option, .. }
            | ValidationError::InvalidPattern { option, .. } => Some(*option),
            ValidationError::UnknownOption(name) => Some(name.as_str()),
            ValidationError::Json(_) => None,
        }
    }
}
