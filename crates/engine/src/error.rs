//! Engine error types.

use loopswap_core::{DecodeError, PathError};
use loopswap_feeds::FeedError;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while building or running the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Transport error: {0}")]
    Feed(#[from] FeedError),

    #[error("Pool {pair}: {source}")]
    Decode {
        pair: String,
        #[source]
        source: DecodeError,
    },

    #[error("Refresh of pool {pair} failed: {source}")]
    RefreshDecode {
        pair: String,
        #[source]
        source: DecodeError,
    },

    #[error("Pool {pair}: {reason}")]
    Listing { pair: String, reason: String },

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Invalid path: {0}")]
    Path(#[from] PathError),
}

impl EngineError {
    /// Fatal errors mean on-chain state no longer matches the decode schema or
    /// the configuration is unusable. Trading must not start.
    ///
    /// Transport failures and refresh-time decode failures are recoverable: the
    /// cycle reuses the previous reserves.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            EngineError::Feed(_) | EngineError::RefreshDecode { .. }
        )
    }

    /// Wait before retrying, when a retry could help. Only transport errors
    /// carry a hint.
    pub fn retry_delay(&self) -> Option<Duration> {
        match self {
            EngineError::Feed(e) => e.suggested_retry_delay(),
            _ => None,
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
