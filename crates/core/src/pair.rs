//! Tradable pools and their live reserves.

use crate::{DecodeError, Symbol};
use solana_sdk::pubkey::Pubkey;

/// Split a pair name ("SOL/USDC") into its two symbols.
pub fn split_pair_name(name: &str) -> Result<(Symbol, Symbol), DecodeError> {
    let mut parts = name.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), None) if !a.is_empty() && !b.is_empty() => {
            Ok((Symbol::new(a), Symbol::new(b)))
        }
        _ => Err(DecodeError::PairName(name.to_string())),
    }
}

/// Canonical pair name for two symbols.
pub fn pair_name(a: &str, b: &str) -> Symbol {
    compact_str::format_compact!("{}/{}", a, b)
}

/// A constant-product pool between two assets.
///
/// Identity fields are fixed when the registry is built. Reserve "A" holds
/// `asset_a` (the first symbol of the name), reserve "B" holds `asset_b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    /// Symbolic name, e.g. "SOL/USDC".
    pub name: Symbol,
    pub asset_a: Symbol,
    pub asset_b: Symbol,
    /// Swap state account; also the stable key of the pair.
    pub swap_account: Pubkey,
    /// Pool authority (the liquidity mint's authority).
    pub authority: Pubkey,
    /// Token account holding reserve A.
    pub token_a: Pubkey,
    /// Token account holding reserve B.
    pub token_b: Pubkey,
    /// Liquidity mint.
    pub pool_mint: Pubkey,
    /// Fee collection account.
    pub fee_account: Pubkey,
    pub trade_fee_numerator: u64,
    pub trade_fee_denominator: u64,
}

impl Pair {
    /// Stable identity used for de-duplication and cache lookups.
    #[inline]
    pub fn key(&self) -> Pubkey {
        self.swap_account
    }

    /// Pool-side (source, destination) token accounts for a swap direction.
    pub fn pool_accounts(&self, reverse: bool) -> (Pubkey, Pubkey) {
        if reverse {
            (self.token_b, self.token_a)
        } else {
            (self.token_a, self.token_b)
        }
    }
}

/// Live reserve amounts for one pair. Always replaced as a whole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolReserves {
    pub reserve_a: u64,
    pub reserve_b: u64,
}

impl PoolReserves {
    pub fn new(reserve_a: u64, reserve_b: u64) -> Self {
        Self {
            reserve_a,
            reserve_b,
        }
    }

    /// (input-side, output-side) reserves for a swap direction.
    #[inline]
    pub fn oriented(&self, reverse: bool) -> (u64, u64) {
        if reverse {
            (self.reserve_b, self.reserve_a)
        } else {
            (self.reserve_a, self.reserve_b)
        }
    }

    /// Whether either side is empty.
    pub fn is_empty(&self) -> bool {
        self.reserve_a == 0 || self.reserve_b == 0
    }
}
