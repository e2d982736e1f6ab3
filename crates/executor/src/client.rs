//! Chain access for submission.

use crate::{ExecutorError, ExecutorResult};
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use solana_sdk::hash::Hash;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

/// Minimal chain interface used by the submitter.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Fresh block reference for signing.
    async fn latest_blockhash(&self) -> ExecutorResult<Hash>;

    /// Send a signed transaction. Returns once the node accepts it; does not
    /// wait for confirmation.
    async fn send_transaction(&self, tx: &Transaction) -> ExecutorResult<Signature>;
}

/// RPC-backed chain client.
pub struct SolanaChainClient {
    rpc: RpcClient,
    skip_preflight: bool,
}

impl SolanaChainClient {
    pub fn new(rpc_url: impl Into<String>, skip_preflight: bool) -> Self {
        Self {
            rpc: RpcClient::new_with_commitment(rpc_url.into(), CommitmentConfig::confirmed()),
            skip_preflight,
        }
    }

    fn send_config(&self) -> RpcSendTransactionConfig {
        RpcSendTransactionConfig {
            skip_preflight: self.skip_preflight,
            // Optimistically confirmed state; confirmation itself is never awaited
            preflight_commitment: Some(CommitmentLevel::Confirmed),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ChainClient for SolanaChainClient {
    async fn latest_blockhash(&self) -> ExecutorResult<Hash> {
        self.rpc
            .get_latest_blockhash()
            .await
            .map_err(|e| ExecutorError::Blockhash(e.to_string()))
    }

    async fn send_transaction(&self, tx: &Transaction) -> ExecutorResult<Signature> {
        let signature = self
            .rpc
            .send_transaction_with_config(tx, self.send_config())
            .await
            .map_err(|e| ExecutorError::SubmissionFailed(e.to_string()))?;
        debug!("Sent {}", signature);
        Ok(signature)
    }
}

/// Mock chain client for testing. Records every transaction it accepts.
#[derive(Default)]
pub struct MockChainClient {
    blockhash: Hash,
    sent: Mutex<Vec<Transaction>>,
    /// Should sends fail.
    pub should_fail: AtomicBool,
}

impl MockChainClient {
    pub fn new() -> Self {
        Self {
            blockhash: Hash::new_unique(),
            ..Default::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.should_fail.store(failing, Ordering::SeqCst);
    }

    /// Transactions accepted so far.
    pub async fn sent(&self) -> Vec<Transaction> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn latest_blockhash(&self) -> ExecutorResult<Hash> {
        Ok(self.blockhash)
    }

    async fn send_transaction(&self, tx: &Transaction) -> ExecutorResult<Signature> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(ExecutorError::SubmissionFailed("Mock failure".to_string()));
        }
        self.sent.lock().await.push(tx.clone());
        Ok(tx.signatures.first().copied().unwrap_or_default())
    }
}
