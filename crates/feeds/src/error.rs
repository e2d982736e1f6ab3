//! Error types for transport operations.

use loopswap_core::DecodeError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to the pool feed, the RPC node or the
/// push subscription endpoint.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("WebSocket disconnected: {0}")]
    Disconnected(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Failed to parse message: {0}")]
    ParseError(String),

    #[error("Failed to decode account: {0}")]
    Decode(#[from] DecodeError),

    #[error("Account not found: {0}")]
    MissingAccount(String),

    #[error("Batch response mismatch: requested {requested}, received {received}")]
    BatchMismatch { requested: usize, received: usize },

    #[error("Subscription failed: {0}")]
    SubscriptionFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Channel closed")]
    ChannelClosed,
}

impl From<tokio_tungstenite::tungstenite::Error> for FeedError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        FeedError::ConnectionFailed(err.to_string())
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::ParseError(err.to_string())
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout(err.to_string())
        } else if err.is_decode() {
            FeedError::ParseError(err.to_string())
        } else {
            FeedError::Http(err.to_string())
        }
    }
}

impl FeedError {
    /// Suggested retry delay, or None when retrying will not help.
    pub fn suggested_retry_delay(&self) -> Option<Duration> {
        match self {
            FeedError::ConnectionFailed(_) => Some(Duration::from_secs(5)),
            FeedError::Disconnected(_) => Some(Duration::from_secs(2)),
            FeedError::Http(_) | FeedError::Timeout(_) => Some(Duration::from_secs(2)),
            FeedError::SubscriptionFailed(_) => Some(Duration::from_secs(5)),
            // Schema or protocol problems - no retry
            FeedError::Rpc { .. }
            | FeedError::ParseError(_)
            | FeedError::Decode(_)
            | FeedError::MissingAccount(_)
            | FeedError::BatchMismatch { .. }
            | FeedError::ChannelClosed => None,
        }
    }
}

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;
