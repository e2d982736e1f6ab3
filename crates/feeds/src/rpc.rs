//! Account reads against the RPC node.
//!
//! The batched read sends one JSON-RPC batch per call: an ordered array of
//! `getAccountInfo` requests (base64 encoding, configured commitment). The node
//! may answer out of order, so responses are matched back by request id.

use crate::{FeedError, FeedResult};
use async_trait::async_trait;
use dashmap::DashMap;
use loopswap_core::decode_base64;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// Source of raw account data.
#[async_trait]
pub trait AccountReader: Send + Sync {
    /// Read a single account.
    async fn read_account(&self, address: &Pubkey) -> FeedResult<Vec<u8>>;

    /// Read many accounts in one request. Output order matches `addresses`.
    /// Fails as a whole if any account is missing or undecodable.
    async fn read_accounts(&self, addresses: &[Pubkey]) -> FeedResult<Vec<Vec<u8>>>;
}

#[derive(Debug, Serialize)]
struct AccountInfoConfig<'a> {
    encoding: &'static str,
    commitment: &'a str,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: usize,
    method: &'static str,
    params: (String, AccountInfoConfig<'a>),
}

/// One element of a batch response.
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub id: usize,
    #[serde(default)]
    pub result: Option<AccountInfoResult>,
    #[serde(default)]
    pub error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct AccountInfoResult {
    pub value: Option<AccountValue>,
}

#[derive(Debug, Deserialize)]
pub struct AccountValue {
    /// `[payload, encoding]`
    pub data: (String, String),
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
}

/// Build the JSON-RPC batch body for a list of addresses.
pub fn batch_request_body(addresses: &[Pubkey], commitment: &str) -> FeedResult<String> {
    let requests: Vec<RpcRequest<'_>> = addresses
        .iter()
        .enumerate()
        .map(|(id, address)| RpcRequest {
            jsonrpc: "2.0",
            id,
            method: "getAccountInfo",
            params: (
                address.to_string(),
                AccountInfoConfig {
                    encoding: "base64",
                    commitment,
                },
            ),
        })
        .collect();
    Ok(serde_json::to_string(&requests)?)
}

/// Match a batch response back to the requested addresses and decode each blob.
pub fn decode_batch_response(
    addresses: &[Pubkey],
    mut responses: Vec<RpcResponse>,
) -> FeedResult<Vec<Vec<u8>>> {
    if responses.len() != addresses.len() {
        return Err(FeedError::BatchMismatch {
            requested: addresses.len(),
            received: responses.len(),
        });
    }
    responses.sort_by_key(|r| r.id);

    responses
        .into_iter()
        .enumerate()
        .map(|(index, response)| {
            if response.id != index {
                return Err(FeedError::BatchMismatch {
                    requested: addresses.len(),
                    received: index,
                });
            }
            if let Some(err) = response.error {
                return Err(FeedError::Rpc {
                    code: err.code,
                    message: err.message,
                });
            }
            let value = response
                .result
                .and_then(|r| r.value)
                .ok_or_else(|| FeedError::MissingAccount(addresses[index].to_string()))?;
            let (payload, encoding) = value.data;
            if encoding != "base64" {
                return Err(FeedError::ParseError(format!(
                    "unexpected encoding '{}' for {}",
                    encoding, addresses[index]
                )));
            }
            Ok(decode_base64(&payload)?)
        })
        .collect()
}

/// JSON-RPC account reader over HTTP.
pub struct RpcAccountReader {
    client: reqwest::Client,
    url: String,
    commitment: String,
}

impl RpcAccountReader {
    /// Create a reader for the given RPC endpoint and commitment level.
    pub fn new(url: impl Into<String>, commitment: impl Into<String>) -> FeedResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            commitment: commitment.into(),
        })
    }
}

#[async_trait]
impl AccountReader for RpcAccountReader {
    async fn read_account(&self, address: &Pubkey) -> FeedResult<Vec<u8>> {
        let mut blobs = self.read_accounts(std::slice::from_ref(address)).await?;
        blobs.pop().ok_or_else(|| FeedError::MissingAccount(address.to_string()))
    }

    async fn read_accounts(&self, addresses: &[Pubkey]) -> FeedResult<Vec<Vec<u8>>> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }

        let body = batch_request_body(addresses, &self.commitment)?;
        debug!("RPC batch: {} accounts", addresses.len());

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FeedError::Http(format!("HTTP {}", response.status())));
        }

        let responses: Vec<RpcResponse> = response.json().await?;
        decode_batch_response(addresses, responses)
    }
}

/// In-memory account reader for testing.
#[derive(Debug, Default)]
pub struct MockAccountReader {
    accounts: DashMap<Pubkey, Vec<u8>>,
    failing: AtomicBool,
    batch_reads: AtomicUsize,
}

impl MockAccountReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) the data of an account.
    pub fn set(&self, address: Pubkey, data: Vec<u8>) {
        self.accounts.insert(address, data);
    }

    /// Remove an account so reads of it fail.
    pub fn remove(&self, address: &Pubkey) {
        self.accounts.remove(address);
    }

    /// Make every read fail with a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of batched reads served so far.
    pub fn batch_reads(&self) -> usize {
        self.batch_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountReader for MockAccountReader {
    async fn read_account(&self, address: &Pubkey) -> FeedResult<Vec<u8>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(FeedError::ConnectionFailed("Mock failure".to_string()));
        }
        self.accounts
            .get(address)
            .map(|data| data.clone())
            .ok_or_else(|| FeedError::MissingAccount(address.to_string()))
    }

    async fn read_accounts(&self, addresses: &[Pubkey]) -> FeedResult<Vec<Vec<u8>>> {
        self.batch_reads.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(FeedError::ConnectionFailed("Mock failure".to_string()));
        }
        addresses
            .iter()
            .map(|address| {
                self.accounts
                    .get(address)
                    .map(|data| data.clone())
                    .ok_or_else(|| FeedError::MissingAccount(address.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use pretty_assertions::assert_eq;

    fn account_json(id: usize, data: &[u8]) -> String {
        format!(
            r#"{{"jsonrpc":"2.0","id":{},"result":{{"context":{{"slot":1}},"value":{{"data":["{}","base64"],"executable":false,"lamports":2039280,"owner":"TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA","rentEpoch":0}}}}}}"#,
            id,
            STANDARD.encode(data)
        )
    }

    #[test]
    fn test_batch_request_body() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let body = batch_request_body(&[a, b], "confirmed").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();

        let requests = parsed.as_array().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0]["method"], "getAccountInfo");
        assert_eq!(requests[0]["id"], 0);
        assert_eq!(requests[1]["params"][0], b.to_string());
        assert_eq!(requests[1]["params"][1]["encoding"], "base64");
        assert_eq!(requests[1]["params"][1]["commitment"], "confirmed");
    }

    #[test]
    fn test_decode_batch_response_reorders_by_id() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let json = format!("[{},{}]", account_json(1, &[2, 2]), account_json(0, &[1, 1, 1]));
        let responses: Vec<RpcResponse> = serde_json::from_str(&json).unwrap();

        let blobs = decode_batch_response(&[a, b], responses).unwrap();
        assert_eq!(blobs, vec![vec![1, 1, 1], vec![2, 2]]);
    }

    #[test]
    fn test_decode_batch_response_missing_account() {
        let a = Pubkey::new_unique();
        let json = r#"[{"jsonrpc":"2.0","id":0,"result":{"context":{"slot":1},"value":null}}]"#;
        let responses: Vec<RpcResponse> = serde_json::from_str(json).unwrap();

        let err = decode_batch_response(&[a], responses).unwrap_err();
        assert!(matches!(err, FeedError::MissingAccount(_)));
    }

    #[test]
    fn test_decode_batch_response_rpc_error() {
        let a = Pubkey::new_unique();
        let json = r#"[{"jsonrpc":"2.0","id":0,"error":{"code":-32005,"message":"Node is behind"}}]"#;
        let responses: Vec<RpcResponse> = serde_json::from_str(json).unwrap();

        let err = decode_batch_response(&[a], responses).unwrap_err();
        assert!(matches!(err, FeedError::Rpc { code: -32005, .. }));
    }

    #[test]
    fn test_decode_batch_response_length_mismatch() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let json = format!("[{}]", account_json(0, &[1]));
        let responses: Vec<RpcResponse> = serde_json::from_str(&json).unwrap();

        let err = decode_batch_response(&[a, b], responses).unwrap_err();
        assert!(matches!(
            err,
            FeedError::BatchMismatch {
                requested: 2,
                received: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_mock_reader() {
        let reader = MockAccountReader::new();
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        reader.set(a, vec![1]);
        reader.set(b, vec![2]);

        let blobs = reader.read_accounts(&[b, a]).await.unwrap();
        assert_eq!(blobs, vec![vec![2], vec![1]]);
        assert_eq!(reader.batch_reads(), 1);

        reader.set_failing(true);
        assert!(reader.read_accounts(&[a]).await.is_err());
        assert!(reader.read_account(&a).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_reader_missing() {
        let reader = MockAccountReader::new();
        let a = Pubkey::new_unique();
        reader.set(a, vec![1]);
        reader.remove(&a);
        assert!(matches!(
            reader.read_account(&a).await,
            Err(FeedError::MissingAccount(_))
        ));
    }
}
