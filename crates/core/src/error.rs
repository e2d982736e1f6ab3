//! Error types for decoding and path construction.

use thiserror::Error;

/// Errors raised by the account decode primitives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("{layout} blob too short: need {expected} bytes, got {actual}")]
    TooShort {
        layout: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Malformed {layout}: {reason}")]
    Malformed { layout: &'static str, reason: String },

    #[error("Liquidity mint has no authority")]
    MissingAuthority,

    #[error("Invalid base64 payload: {0}")]
    Base64(String),

    #[error("Invalid pair name: {0}")]
    PairName(String),
}

/// Errors raised when assembling a cyclic path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Unsupported hop count: {0} (only 3 and 4 are modeled)")]
    UnsupportedHopCount(usize),

    #[error("Path does not start at reference asset {reference}: first input is {found}")]
    OpenStart { reference: String, found: String },

    #[error("Path does not close on reference asset {reference}: last output is {found}")]
    OpenEnd { reference: String, found: String },

    #[error("Hop {index} consumes {found} but previous hop produced {expected}")]
    Broken {
        index: usize,
        expected: String,
        found: String,
    },
}

impl From<base64::DecodeError> for DecodeError {
    fn from(err: base64::DecodeError) -> Self {
        DecodeError::Base64(err.to_string())
    }
}
