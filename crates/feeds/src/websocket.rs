//! Push subscription for a single account.
//!
//! Speaks the node's `accountSubscribe` JSON-RPC dialect over WebSocket and
//! forwards decoded account blobs to a channel. The initial connect is retried
//! a bounded number of times; once running, dropped connections are
//! re-established with exponential backoff.

use crate::{FeedError, FeedResult};
use futures_util::{SinkExt, StreamExt};
use loopswap_core::decode_base64;
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, error, info, warn};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Message delivered to the subscription consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountMessage {
    /// New account data.
    Update { slot: u64, data: Vec<u8> },
    /// Connection established (first time).
    Connected,
    /// Connection lost.
    Disconnected,
    /// Reconnected after a disconnection. Updates missed in between are gone.
    Reconnected,
    /// A receive error that did not end the connection.
    Error(String),
}

/// Connection settings for an account subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionConfig {
    pub ws_url: String,
    pub account: Pubkey,
    pub commitment: String,
    /// Attempts allowed for the initial connect.
    pub connect_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl SubscriptionConfig {
    pub fn new(ws_url: impl Into<String>, account: Pubkey) -> Self {
        Self {
            ws_url: ws_url.into(),
            account,
            commitment: "confirmed".to_string(),
            connect_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let power = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << power)
            .min(self.max_backoff)
    }

    /// Delay before retry number `attempt` after `err`: the backoff, raised to
    /// the error's own suggested delay, never above `max_backoff`.
    pub fn retry_delay(&self, attempt: u32, err: &FeedError) -> Duration {
        let delay = self.backoff(attempt);
        err.suggested_retry_delay()
            .map_or(delay, |hint| delay.max(hint))
            .min(self.max_backoff)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<NotificationParams>,
    #[serde(default)]
    error: Option<EnvelopeError>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct NotificationParams {
    result: NotificationResult,
}

#[derive(Debug, Deserialize)]
struct NotificationResult {
    context: NotificationContext,
    value: NotificationValue,
}

#[derive(Debug, Deserialize)]
struct NotificationContext {
    slot: u64,
}

#[derive(Debug, Deserialize)]
struct NotificationValue {
    data: (String, String),
}

/// Parse one text frame.
///
/// Returns `Some((slot, data))` for an account notification and `None` for
/// anything else that is not an error (e.g. the subscription acknowledgement).
pub fn parse_notification(text: &str) -> FeedResult<Option<(u64, Vec<u8>)>> {
    let envelope: Envelope = serde_json::from_str(text)?;

    if let Some(err) = envelope.error {
        return Err(FeedError::SubscriptionFailed(format!(
            "{}: {}",
            err.code, err.message
        )));
    }
    if envelope.method.as_deref() != Some("accountNotification") {
        return Ok(None);
    }

    let params = envelope
        .params
        .ok_or_else(|| FeedError::ParseError("notification without params".to_string()))?;
    let (payload, encoding) = params.result.value.data;
    if encoding != "base64" {
        return Err(FeedError::ParseError(format!(
            "unexpected encoding '{}'",
            encoding
        )));
    }
    Ok(Some((params.result.context.slot, decode_base64(&payload)?)))
}

/// WebSocket subscriber for one account.
pub struct AccountSubscriber {
    config: SubscriptionConfig,
    tx: mpsc::Sender<AccountMessage>,
}

impl AccountSubscriber {
    pub fn new(config: SubscriptionConfig, tx: mpsc::Sender<AccountMessage>) -> Self {
        Self { config, tx }
    }

    /// The `accountSubscribe` request for this account.
    pub fn subscribe_message(&self) -> String {
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "accountSubscribe",
            "params": [
                self.config.account.to_string(),
                { "encoding": "base64", "commitment": self.config.commitment }
            ]
        })
        .to_string()
    }

    async fn open(&self) -> FeedResult<WsStream> {
        debug!("Connecting to {}", self.config.ws_url);
        let (mut stream, response) = connect_async(self.config.ws_url.as_str()).await?;
        debug!("Connected (status: {:?})", response.status());

        stream
            .send(Message::Text(self.subscribe_message()))
            .await
            .map_err(|e| FeedError::SubscriptionFailed(e.to_string()))?;
        Ok(stream)
    }

    /// Open the connection and subscribe, retrying up to `connect_attempts` times.
    pub async fn connect_with_retry(&self) -> FeedResult<WsStream> {
        let attempts = self.config.connect_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.open().await {
                Ok(stream) => {
                    info!("Subscribed to account {}", self.config.account);
                    let _ = self.tx.send(AccountMessage::Connected).await;
                    return Ok(stream);
                }
                Err(e) => {
                    if attempt < attempts {
                        let delay = self.config.retry_delay(attempt, &e);
                        warn!(
                            "Subscription connect failed: {}. Retrying in {:.1}s (attempt {}/{})",
                            e,
                            delay.as_secs_f64(),
                            attempt,
                            attempts
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| FeedError::ConnectionFailed("no connect attempt made".to_string())))
    }

    /// Listen on an established stream, reconnecting forever when it drops.
    ///
    /// Returns only when the consumer side of the channel is gone.
    pub async fn run(self, stream: WsStream) -> FeedResult<()> {
        let mut stream = Some(stream);
        let mut reconnect_attempts = 0u32;

        loop {
            let current = match stream.take() {
                Some(s) => s,
                None => match self.open().await {
                    Ok(s) => {
                        info!("Resubscribed to account {}", self.config.account);
                        if self.tx.send(AccountMessage::Reconnected).await.is_err() {
                            return Err(FeedError::ChannelClosed);
                        }
                        s
                    }
                    Err(e) => {
                        reconnect_attempts = reconnect_attempts.saturating_add(1);
                        let delay = self.config.retry_delay(reconnect_attempts, &e);
                        warn!(
                            "Reconnect failed: {}. Retrying in {:.1}s (attempt #{})",
                            e,
                            delay.as_secs_f64(),
                            reconnect_attempts
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                },
            };

            let connection_start = Instant::now();
            match self.listen(current).await {
                Err(FeedError::ChannelClosed) => return Err(FeedError::ChannelClosed),
                Err(e) => {
                    // Stable for 5+ minutes: start backoff from scratch
                    if connection_start.elapsed() > Duration::from_secs(300) {
                        reconnect_attempts = 0;
                    }
                    reconnect_attempts = reconnect_attempts.saturating_add(1);
                    let delay = self.config.retry_delay(reconnect_attempts, &e);
                    warn!(
                        "Subscription dropped after {:?}: {}. Reconnecting in {:.1}s",
                        connection_start.elapsed(),
                        e,
                        delay.as_secs_f64()
                    );
                    if self.tx.send(AccountMessage::Disconnected).await.is_err() {
                        return Err(FeedError::ChannelClosed);
                    }
                    tokio::time::sleep(delay).await;
                }
                Ok(()) => return Ok(()),
            }
        }
    }

    async fn listen(&self, stream: WsStream) -> FeedResult<()> {
        let (mut write, mut read) = stream.split();

        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => match parse_notification(&text) {
                    Ok(Some((slot, data))) => {
                        if self
                            .tx
                            .send(AccountMessage::Update { slot, data })
                            .await
                            .is_err()
                        {
                            return Err(FeedError::ChannelClosed);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!("Bad subscription message: {}", e);
                        if self.tx.send(AccountMessage::Error(e.to_string())).await.is_err() {
                            return Err(FeedError::ChannelClosed);
                        }
                    }
                },
                Ok(Message::Ping(data)) => {
                    if let Err(e) = write.send(Message::Pong(data)).await {
                        return Err(FeedError::ConnectionFailed(format!(
                            "PONG send failed: {}",
                            e
                        )));
                    }
                }
                Ok(Message::Close(frame)) => {
                    debug!("Received close frame: {:?}", frame);
                    return Err(FeedError::Disconnected("closed by server".to_string()));
                }
                Ok(_) => {}
                Err(e) => {
                    error!("WebSocket read error: {}", e);
                    return Err(FeedError::ConnectionFailed(e.to_string()));
                }
            }
        }

        Err(FeedError::Disconnected("Stream ended".to_string()))
    }
}
