//! Asset symbols and the wallet address book.

use compact_str::CompactString;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;

/// Asset symbol (e.g., "SOL", "USDC").
pub type Symbol = CompactString;

/// On-chain addresses for one asset held by the trading wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetAddresses {
    /// Token mint.
    pub mint: Pubkey,
    /// The wallet's token account for this mint.
    pub token_account: Pubkey,
}

/// Maps asset symbols to the wallet's addresses for that asset.
///
/// Every asset that can appear in a path needs exactly one token account here,
/// which is what makes consecutive hops share source/destination accounts.
#[derive(Debug, Clone, Default)]
pub struct AddressBook {
    entries: HashMap<Symbol, AssetAddresses>,
}

impl AddressBook {
    /// Create an empty address book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register addresses for a symbol, replacing any previous entry.
    pub fn insert(&mut self, symbol: &str, addresses: AssetAddresses) {
        self.entries.insert(Symbol::new(symbol), addresses);
    }

    /// Look up the addresses for a symbol.
    pub fn get(&self, symbol: &str) -> Option<&AssetAddresses> {
        self.entries.get(symbol)
    }

    /// The wallet token account for a symbol.
    pub fn token_account(&self, symbol: &str) -> Option<Pubkey> {
        self.get(symbol).map(|a| a.token_account)
    }

    /// Whether the symbol is known.
    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
