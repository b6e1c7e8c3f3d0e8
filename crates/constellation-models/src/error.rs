//! Error types for parsing model vocabularies.

use thiserror::Error;

/// Errors produced when parsing a vocabulary value from text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The value is not part of the named vocabulary.
    #[error("unknown {kind}: {value}")]
    UnknownValue {
        /// Vocabulary being parsed (e.g. "criticality").
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}

impl ParseError {
    pub(crate) fn unknown(kind: &'static str, value: &str) -> Self {
        ParseError::UnknownValue {
            kind,
            value: value.to_string(),
        }
    }
}
