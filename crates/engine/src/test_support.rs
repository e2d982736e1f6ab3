//! Shared fixtures for engine tests.

use crate::PairRegistry;
use loopswap_core::{split_pair_name, Pair, Symbol};
use loopswap_feeds::{MockAccountReader, PoolListing};
use solana_sdk::pubkey::Pubkey;

/// A pair with fresh addresses. Names that do not split fall back to "?/?".
pub fn pair(name: &str) -> Pair {
    let (asset_a, asset_b) =
        split_pair_name(name).unwrap_or_else(|_| (Symbol::new("?"), Symbol::new("?")));
    Pair {
        name: Symbol::new(name),
        asset_a,
        asset_b,
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

pub fn registry(names: &[&str]) -> PairRegistry {
    PairRegistry::from_pairs(names.iter().map(|n| pair(n)))
}

pub fn symbols(names: &[&str]) -> Vec<Symbol> {
    names.iter().map(|n| Symbol::new(n)).collect()
}

pub fn listing_for(pair: &Pair) -> PoolListing {
    PoolListing {
        name: pair.name.to_string(),
        deprecated: false,
        swap_account: pair.swap_account.to_string(),
        pool_mint: pair.pool_mint.to_string(),
    }
}

pub fn swap_blob(token_a: Pubkey, token_b: Pubkey, pool_mint: Pubkey, fee: Pubkey) -> Vec<u8> {
    let mut data = vec![1u8, 1, 254];
    data.extend_from_slice(&[6u8; 32]); // token program
    data.extend_from_slice(&token_a.to_bytes());
    data.extend_from_slice(&token_b.to_bytes());
    data.extend_from_slice(&pool_mint.to_bytes());
    data.extend_from_slice(&[0u8; 64]); // token mints
    data.extend_from_slice(&fee.to_bytes());
    data.extend_from_slice(&[0u8; 96]);
    for value in [25u64, 10_000, 5, 10_000, 0, 0, 0, 0] {
        data.extend_from_slice(&value.to_le_bytes());
    }
    data.push(0);
    data.extend_from_slice(&[0u8; 32]);
    data
}

pub fn mint_blob(authority: Option<Pubkey>) -> Vec<u8> {
    let mut data = Vec::with_capacity(82);
    match authority {
        Some(key) => {
            data.extend_from_slice(&1u32.to_le_bytes());
            data.extend_from_slice(&key.to_bytes());
        }
        None => {
            data.extend_from_slice(&0u32.to_le_bytes());
            data.extend_from_slice(&[0u8; 32]);
        }
    }
    data.extend_from_slice(&1_000_000u64.to_le_bytes());
    data.push(6);
    data.push(1);
    data.extend_from_slice(&[0u8; 36]);
    data
}

pub fn reserve_blob(amount: u64) -> Vec<u8> {
    let mut data = vec![0u8; 64];
    data.extend_from_slice(&amount.to_le_bytes());
    data.extend_from_slice(&[0u8; 93]);
    data
}

/// Store both reserve accounts of `pair` in the mock reader.
pub fn seed_reserves(reader: &MockAccountReader, pair: &Pair, reserve_a: u64, reserve_b: u64) {
    reader.set(pair.token_a, reserve_blob(reserve_a));
    reader.set(pair.token_b, reserve_blob(reserve_b));
}
