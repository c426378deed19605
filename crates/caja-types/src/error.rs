//! Common error types

use thiserror::Error;

/// Error parsing one of the closed domain enums from its stored/wire form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseError {
    /// Which enum was being parsed
    pub kind: &'static str,
    /// The rejected input
    pub value: String,
}

impl ParseError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
