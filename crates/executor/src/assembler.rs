//! Loop transaction assembler.
//!
//! One swap instruction per hop, in hop order, packed into a single
//! transaction. The wallet's token account for each asset comes from the
//! address book, so hop `i`'s destination is hop `i + 1`'s source and the last
//! hop returns to the first hop's source.

use crate::{
    swap_instruction, ExecutorError, ExecutorResult, SwapAccounts, SwapData,
};
use loopswap_core::{AddressBook, CyclePath, TradeQuote};
use loopswap_engine::PairRegistry;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use solana_sdk::transaction::Transaction;

/// Constant-product swap program (Orca token swap v2).
pub const DEFAULT_SWAP_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("9W959DqEETiGZocYWCQPaJ6sBmUzgfxXfqGeTEdp3aQP");

/// SPL token program.
pub const DEFAULT_TOKEN_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

/// Per-hop `(amount_in, minimum_amount_out)`.
///
/// Hop 0 spends the quote input; each later hop spends the previous hop's
/// quoted output. The last hop must return at least the input.
pub fn hop_amounts(quote: &TradeQuote) -> Vec<(u64, u64)> {
    let n = quote.outputs.len();
    (0..n)
        .map(|i| {
            let amount_in = if i == 0 {
                quote.input
            } else {
                quote.outputs[i - 1]
            };
            let minimum_out = if i + 1 == n {
                quote.input
            } else {
                quote.outputs[i]
            };
            (amount_in, minimum_out)
        })
        .collect()
}

/// Builds loop transactions for one wallet.
#[derive(Debug, Clone)]
pub struct LoopAssembler {
    program_id: Pubkey,
    token_program_id: Pubkey,
    address_book: AddressBook,
}

impl LoopAssembler {
    pub fn new(program_id: Pubkey, token_program_id: Pubkey, address_book: AddressBook) -> Self {
        Self {
            program_id,
            token_program_id,
            address_book,
        }
    }

    pub fn address_book(&self) -> &AddressBook {
        &self.address_book
    }

    fn token_account(&self, asset: &str) -> ExecutorResult<Pubkey> {
        self.address_book
            .token_account(asset)
            .ok_or_else(|| ExecutorError::MissingTokenAccount(asset.to_string()))
    }

    /// Swap instructions for every hop of `path`.
    pub fn instructions(
        &self,
        registry: &PairRegistry,
        path: &CyclePath,
        quote: &TradeQuote,
        payer: &Pubkey,
    ) -> ExecutorResult<Vec<Instruction>> {
        if quote.hop_count() != path.hop_count() {
            return Err(ExecutorError::QuoteMismatch {
                hops: path.hop_count(),
                outputs: quote.hop_count(),
            });
        }

        path.hops()
            .iter()
            .zip(hop_amounts(quote))
            .map(|(hop, (amount_in, minimum_out))| {
                let pair = registry
                    .get(&hop.pair)
                    .ok_or_else(|| ExecutorError::UnknownPair(hop.pair.to_string()))?;
                let (pool_source, pool_destination) = pair.pool_accounts(hop.reverse);
                let accounts = SwapAccounts {
                    swap: pair.swap_account,
                    authority: pair.authority,
                    user_transfer_authority: *payer,
                    user_source: self.token_account(&hop.input)?,
                    pool_source,
                    pool_destination,
                    user_destination: self.token_account(&hop.output)?,
                    pool_mint: pair.pool_mint,
                    fee_account: pair.fee_account,
                    token_program: self.token_program_id,
                };
                swap_instruction(
                    self.program_id,
                    &accounts,
                    SwapData::new(amount_in, minimum_out),
                )
            })
            .collect()
    }

    /// Assemble and sign the loop transaction with `payer` as sole signer.
    pub fn build_transaction(
        &self,
        registry: &PairRegistry,
        path: &CyclePath,
        quote: &TradeQuote,
        payer: &Keypair,
        recent_blockhash: Hash,
    ) -> ExecutorResult<Transaction> {
        let payer_key = payer.pubkey();
        let instructions = self.instructions(registry, path, quote, &payer_key)?;
        let mut tx = Transaction::new_with_payer(&instructions, Some(&payer_key));
        tx.try_sign(&[payer], recent_blockhash)
            .map_err(|e| ExecutorError::Signing(e.to_string()))?;
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SWAP_ACCOUNT_COUNT;
    use loopswap_core::{AssetAddresses, Hop, Pair, Symbol};
    use pretty_assertions::assert_eq;

    // Account meta positions
    const USER_SOURCE: usize = 3;
    const POOL_SOURCE: usize = 4;
    const POOL_DEST: usize = 5;
    const USER_DEST: usize = 6;

    fn pair(name: &str, a: &str, b: &str) -> Pair {
        Pair {
            name: Symbol::new(name),
            asset_a: Symbol::new(a),
            asset_b: Symbol::new(b),
            swap_account: Pubkey::new_unique(),
            authority: Pubkey::new_unique(),
            token_a: Pubkey::new_unique(),
            token_b: Pubkey::new_unique(),
            pool_mint: Pubkey::new_unique(),
            fee_account: Pubkey::new_unique(),
            trade_fee_numerator: 25,
            trade_fee_denominator: 10_000,
        }
    }

    fn address_book(symbols: &[&str]) -> AddressBook {
        let mut book = AddressBook::new();
        for symbol in symbols {
            book.insert(
                symbol,
                AssetAddresses {
                    mint: Pubkey::new_unique(),
                    token_account: Pubkey::new_unique(),
                },
            );
        }
        book
    }

    fn triangle() -> (PairRegistry, CyclePath) {
        let registry = PairRegistry::from_pairs([
            pair("SOL/USDC", "SOL", "USDC"),
            pair("ETH/USDC", "ETH", "USDC"),
            pair("ETH/SOL", "ETH", "SOL"),
        ]);
        let path = CyclePath::new(
            "SOL",
            vec![
                Hop::new("SOL/USDC", false, "SOL", "USDC"),
                Hop::new("ETH/USDC", true, "USDC", "ETH"),
                Hop::new("ETH/SOL", false, "ETH", "SOL"),
            ],
        )
        .unwrap();
        (registry, path)
    }

    fn assembler() -> LoopAssembler {
        LoopAssembler::new(
            DEFAULT_SWAP_PROGRAM_ID,
            DEFAULT_TOKEN_PROGRAM_ID,
            address_book(&["SOL", "USDC", "ETH"]),
        )
    }

    #[test]
    fn test_hop_amounts() {
        let quote = TradeQuote::new(1_000, vec![990, 980, 1_250]);
        assert_eq!(hop_amounts(&quote), vec![(1_000, 990), (990, 980), (980, 1_000)]);

        let quote = TradeQuote::new(10, vec![11, 12, 13, 14]);
        assert_eq!(
            hop_amounts(&quote),
            vec![(10, 11), (11, 12), (12, 13), (13, 10)]
        );
    }

    #[test]
    fn test_token_accounts_alias_around_the_loop() {
        let (registry, path) = triangle();
        let assembler = assembler();
        let payer = Pubkey::new_unique();
        let quote = TradeQuote::new(1_000_000, vec![995_997, 992_014, 988_060]);

        let ixs = assembler.instructions(&registry, &path, &quote, &payer).unwrap();
        assert_eq!(ixs.len(), 3);
        for ix in &ixs {
            assert_eq!(ix.accounts.len(), SWAP_ACCOUNT_COUNT);
            assert_eq!(ix.program_id, DEFAULT_SWAP_PROGRAM_ID);
            assert_eq!(ix.accounts[2].pubkey, payer);
        }

        for i in 0..ixs.len() {
            let next = (i + 1) % ixs.len();
            assert_eq!(
                ixs[i].accounts[USER_DEST].pubkey,
                ixs[next].accounts[USER_SOURCE].pubkey
            );
        }
        assert_eq!(
            ixs[0].accounts[USER_SOURCE].pubkey,
            assembler.address_book().token_account("SOL").unwrap()
        );
    }

    #[test]
    fn test_pool_accounts_follow_reverse_flag() {
        let (registry, path) = triangle();
        let quote = TradeQuote::new(1_000, vec![990, 980, 1_250]);
        let ixs = assembler()
            .instructions(&registry, &path, &quote, &Pubkey::new_unique())
            .unwrap();

        let forward = registry.get("SOL/USDC").unwrap();
        assert_eq!(ixs[0].accounts[POOL_SOURCE].pubkey, forward.token_a);
        assert_eq!(ixs[0].accounts[POOL_DEST].pubkey, forward.token_b);

        let reversed = registry.get("ETH/USDC").unwrap();
        assert_eq!(ixs[1].accounts[POOL_SOURCE].pubkey, reversed.token_b);
        assert_eq!(ixs[1].accounts[POOL_DEST].pubkey, reversed.token_a);
    }

    #[test]
    fn test_instruction_amounts() {
        let (registry, path) = triangle();
        let quote = TradeQuote::new(1_000_000, vec![995_997, 992_014, 988_060]);
        let ixs = assembler()
            .instructions(&registry, &path, &quote, &Pubkey::new_unique())
            .unwrap();

        let amounts: Vec<(u64, u64)> = ixs
            .iter()
            .map(|ix| {
                let data = SwapData::unpack(&ix.data).unwrap();
                (data.amount_in, data.minimum_amount_out)
            })
            .collect();
        assert_eq!(
            amounts,
            vec![
                (1_000_000, 995_997),
                (995_997, 992_014),
                (992_014, 1_000_000)
            ]
        );
    }

    #[test]
    fn test_missing_token_account() {
        let (registry, path) = triangle();
        let assembler = LoopAssembler::new(
            DEFAULT_SWAP_PROGRAM_ID,
            DEFAULT_TOKEN_PROGRAM_ID,
            address_book(&["SOL", "USDC"]),
        );
        let quote = TradeQuote::new(1_000, vec![990, 980, 1_250]);
        let err = assembler
            .instructions(&registry, &path, &quote, &Pubkey::new_unique())
            .unwrap_err();
        assert!(matches!(err, ExecutorError::MissingTokenAccount(ref s) if s == "ETH"));
    }

    #[test]
    fn test_quote_mismatch() {
        let (registry, path) = triangle();
        let quote = TradeQuote::new(1_000, vec![990, 980]);
        let err = assembler()
            .instructions(&registry, &path, &quote, &Pubkey::new_unique())
            .unwrap_err();
        assert!(matches!(err, ExecutorError::QuoteMismatch { hops: 3, outputs: 2 }));
    }

    #[test]
    fn test_build_transaction_signed_once() {
        let (registry, path) = triangle();
        let payer = Keypair::new();
        let quote = TradeQuote::new(1_000, vec![990, 980, 1_250]);

        let tx = assembler()
            .build_transaction(&registry, &path, &quote, &payer, Hash::new_unique())
            .unwrap();

        assert_eq!(tx.message.instructions.len(), 3);
        assert_eq!(tx.message.header.num_required_signatures, 1);
        assert_eq!(tx.message.account_keys[0], payer.pubkey());
        assert!(tx.is_signed());
        assert!(tx.verify().is_ok());
    }
}
