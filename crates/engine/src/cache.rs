//! Pool state cache.
//!
//! Holds the live reserves of every pair used by at least one path. A refresh
//! reads both reserve accounts of every tracked pair in one batch and only
//! writes once the whole batch has decoded; any failure leaves the previous
//! snapshot untouched.

use crate::{EngineError, EngineResult, PairRegistry, PathSet};
use dashmap::DashMap;
use loopswap_core::{CyclePath, PoolReserves, ReserveRecord, Symbol};
use loopswap_feeds::AccountReader;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone)]
struct TrackedPair {
    name: Symbol,
    key: Pubkey,
}

/// Live reserves keyed by swap account.
#[derive(Debug, Default)]
pub struct PoolStateCache {
    tracked: Vec<TrackedPair>,
    /// Reserve accounts in batch order: `[a0, b0, a1, b1, ...]`.
    accounts: Vec<Pubkey>,
    reserves: DashMap<Pubkey, PoolReserves>,
}

impl PoolStateCache {
    /// Track every pair used by `paths`, de-duplicated by swap account, in
    /// first-use order.
    pub fn new(registry: &PairRegistry, paths: &PathSet) -> Self {
        let mut seen = HashSet::new();
        let mut tracked = Vec::new();
        let mut accounts = Vec::new();

        for hop in paths.iter().flat_map(|p| p.hops()) {
            let Some(pair) = registry.get(&hop.pair) else {
                continue;
            };
            if seen.insert(pair.key()) {
                tracked.push(TrackedPair {
                    name: pair.name.clone(),
                    key: pair.key(),
                });
                accounts.push(pair.token_a);
                accounts.push(pair.token_b);
            }
        }

        debug!("Pool cache tracking {} pairs", tracked.len());
        Self {
            tracked,
            accounts,
            reserves: DashMap::new(),
        }
    }

    /// Number of tracked pairs.
    pub fn tracked_len(&self) -> usize {
        self.tracked.len()
    }

    /// Accounts read per refresh, in request order.
    pub fn accounts(&self) -> &[Pubkey] {
        &self.accounts
    }

    /// Refresh all tracked pairs with one batched read.
    pub async fn refresh<R: AccountReader + ?Sized>(&self, reader: &R) -> EngineResult<()> {
        if self.accounts.is_empty() {
            return Ok(());
        }

        let blobs = reader.read_accounts(&self.accounts).await?;
        if blobs.len() != self.accounts.len() {
            return Err(EngineError::Feed(loopswap_feeds::FeedError::BatchMismatch {
                requested: self.accounts.len(),
                received: blobs.len(),
            }));
        }

        let mut fresh = Vec::with_capacity(self.tracked.len());
        for (pair, chunk) in self.tracked.iter().zip(blobs.chunks_exact(2)) {
            let decode = |data: &[u8]| {
                ReserveRecord::decode_amount(data).map_err(|source| EngineError::RefreshDecode {
                    pair: pair.name.to_string(),
                    source,
                })
            };
            let reserve_a = decode(chunk[0].as_slice())?;
            let reserve_b = decode(chunk[1].as_slice())?;
            fresh.push((pair.key, PoolReserves::new(reserve_a, reserve_b)));
        }

        for (key, reserves) in fresh {
            self.reserves.insert(key, reserves);
        }
        Ok(())
    }

    /// Current reserves of a pair. Zero until the first successful refresh.
    pub fn reserves(&self, key: &Pubkey) -> PoolReserves {
        self.reserves.get(key).map(|r| *r).unwrap_or_default()
    }

    /// Overwrite one pair's reserves.
    pub fn set(&self, key: Pubkey, reserves: PoolReserves) {
        self.reserves.insert(key, reserves);
    }

    /// `(input-side, output-side)` reserves for each hop of `path`.
    ///
    /// `None` if a hop names a pair missing from the registry.
    pub fn oriented_reserves(
        &self,
        registry: &PairRegistry,
        path: &CyclePath,
    ) -> Option<Vec<(u64, u64)>> {
        path.hops()
            .iter()
            .map(|hop| {
                registry
                    .get(&hop.pair)
                    .map(|pair| self.reserves(&pair.key()).oriented(hop.reverse))
            })
            .collect()
    }
}
