//! Error types for execution operations.

use thiserror::Error;

/// Errors that can occur while assembling or submitting a loop transaction.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Unknown pair: {0}")]
    UnknownPair(String),

    #[error("No wallet token account for asset {0}")]
    MissingTokenAccount(String),

    #[error("Quote has {outputs} outputs for a {hops}-hop path")]
    QuoteMismatch { hops: usize, outputs: usize },

    #[error("Failed to fetch recent blockhash: {0}")]
    Blockhash(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Transaction submission failed: {0}")]
    SubmissionFailed(String),

    #[error("Invalid instruction data: {0}")]
    InvalidInstruction(String),
}

/// Result type for executor operations.
pub type ExecutorResult<T> = Result<T, ExecutorError>;
