//! Loop submitter: assemble, sign, send.

use crate::{ChainClient, ExecutorError, LoopAssembler};
use async_trait::async_trait;
use loopswap_core::{CyclePath, TradeQuote};
use loopswap_engine::{LoopSubmitter, PairRegistry};
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use std::sync::Arc;
use tracing::info;

/// Whether transactions actually leave the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    #[default]
    Live,
    /// Build and sign, then log instead of sending.
    DryRun,
}

/// Submits loop transactions signed by one wallet.
pub struct SwapExecutor<C: ?Sized> {
    assembler: LoopAssembler,
    client: Arc<C>,
    signer: Keypair,
    mode: ExecutionMode,
}

impl<C: ChainClient + ?Sized> SwapExecutor<C> {
    pub fn new(
        assembler: LoopAssembler,
        client: Arc<C>,
        signer: Keypair,
        mode: ExecutionMode,
    ) -> Self {
        Self {
            assembler,
            client,
            signer,
            mode,
        }
    }

    pub fn payer(&self) -> solana_sdk::pubkey::Pubkey {
        self.signer.pubkey()
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }
}

#[async_trait]
impl<C: ChainClient + ?Sized> LoopSubmitter for SwapExecutor<C> {
    type Error = ExecutorError;

    async fn submit(
        &self,
        registry: &PairRegistry,
        path: &CyclePath,
        quote: &TradeQuote,
    ) -> Result<Signature, ExecutorError> {
        let blockhash = self.client.latest_blockhash().await?;
        let tx = self
            .assembler
            .build_transaction(registry, path, quote, &self.signer, blockhash)?;

        match self.mode {
            ExecutionMode::Live => self.client.send_transaction(&tx).await,
            ExecutionMode::DryRun => {
                let signature = tx.signatures.first().copied().unwrap_or_default();
                info!(
                    "[dry run] {}: {} instructions, signature {}",
                    path.name(),
                    tx.message.instructions.len(),
                    signature
                );
                Ok(signature)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MockChainClient, DEFAULT_SWAP_PROGRAM_ID, DEFAULT_TOKEN_PROGRAM_ID};
    use loopswap_core::{AddressBook, AssetAddresses, Hop, Pair, Symbol};
    use pretty_assertions::assert_eq;
    use solana_sdk::pubkey::Pubkey;

    fn fixture() -> (PairRegistry, CyclePath, LoopAssembler) {
        let pairs = [("R/A", "R", "A"), ("A/B", "A", "B"), ("B/R", "B", "R")].map(
            |(name, a, b)| Pair {
                name: Symbol::new(name),
                asset_a: Symbol::new(a),
                asset_b: Symbol::new(b),
                swap_account: Pubkey::new_unique(),
                authority: Pubkey::new_unique(),
                token_a: Pubkey::new_unique(),
                token_b: Pubkey::new_unique(),
                pool_mint: Pubkey::new_unique(),
                fee_account: Pubkey::new_unique(),
                trade_fee_numerator: 30,
                trade_fee_denominator: 10_000,
            },
        );
        let path = CyclePath::new(
            "R",
            vec![
                Hop::new("R/A", false, "R", "A"),
                Hop::new("A/B", false, "A", "B"),
                Hop::new("B/R", false, "B", "R"),
            ],
        )
        .unwrap();

        let mut book = AddressBook::new();
        for symbol in ["R", "A", "B"] {
            book.insert(
                symbol,
                AssetAddresses {
                    mint: Pubkey::new_unique(),
                    token_account: Pubkey::new_unique(),
                },
            );
        }
        let assembler = LoopAssembler::new(DEFAULT_SWAP_PROGRAM_ID, DEFAULT_TOKEN_PROGRAM_ID, book);
        (PairRegistry::from_pairs(pairs), path, assembler)
    }

    #[tokio::test]
    async fn test_live_submission() {
        let (registry, path, assembler) = fixture();
        let client = Arc::new(MockChainClient::new());
        let executor = SwapExecutor::new(assembler, client.clone(), Keypair::new(), ExecutionMode::Live);
        let quote = TradeQuote::new(1_000, vec![1_100, 1_200, 1_300]);

        let signature = executor.submit(&registry, &path, &quote).await.unwrap();

        let sent = client.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].signatures[0], signature);
        assert_eq!(sent[0].message.account_keys[0], executor.payer());
        assert_eq!(sent[0].message.instructions.len(), 3);
    }

    #[tokio::test]
    async fn test_dry_run_does_not_send() {
        let (registry, path, assembler) = fixture();
        let client = Arc::new(MockChainClient::new());
        let executor = SwapExecutor::new(assembler, client.clone(), Keypair::new(), ExecutionMode::DryRun);
        let quote = TradeQuote::new(1_000, vec![1_100, 1_200, 1_300]);

        let signature = executor.submit(&registry, &path, &quote).await.unwrap();
        assert_ne!(signature, Signature::default());
        assert!(client.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_submission_error_is_reported() {
        let (registry, path, assembler) = fixture();
        let client = Arc::new(MockChainClient::new());
        client.set_failing(true);
        let executor = SwapExecutor::new(assembler, client, Keypair::new(), ExecutionMode::Live);
        let quote = TradeQuote::new(1_000, vec![1_100, 1_200, 1_300]);

        let err = executor.submit(&registry, &path, &quote).await.unwrap_err();
        assert!(matches!(err, ExecutorError::SubmissionFailed(_)));
    }
}
