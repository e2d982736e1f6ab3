//! Pair registry.
//!
//! Built once at startup from the pool listing. Each in-scope pool costs two
//! account reads: the swap state (token accounts, fee account, fee rates) and
//! the liquidity mint (its authority is the pool authority).

use crate::{EngineError, EngineResult};
use loopswap_core::{pair_name, split_pair_name, MintLayout, Pair, SwapAccountLayout, Symbol};
use loopswap_feeds::{AccountReader, PoolListing};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Pairs excluded from trading (pegged or otherwise not freely arbitrageable).
///
/// Matching ignores symbol order: "USDC/USDT" also denies "USDT/USDC".
#[derive(Debug, Clone, Default)]
pub struct Denylist {
    names: HashSet<Symbol>,
}

impl Denylist {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names.into_iter().map(|n| Symbol::new(n.as_ref())).collect(),
        }
    }

    /// Whether the pool between `a` and `b` is denied.
    pub fn denies(&self, a: &str, b: &str) -> bool {
        self.names.contains(&pair_name(a, b)) || self.names.contains(&pair_name(b, a))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// All tradable pairs, keyed by pair name ("X/Y" in the pool's own order).
#[derive(Debug, Clone, Default)]
pub struct PairRegistry {
    pairs: HashMap<Symbol, Pair>,
}

impl PairRegistry {
    /// Build the registry from listing records.
    ///
    /// Skips deprecated pools, pools with an asset outside `assets`, and
    /// denylisted pools. Any failure to read or decode an in-scope pool aborts
    /// the build.
    pub async fn build<R: AccountReader + ?Sized>(
        listings: &[PoolListing],
        assets: &[Symbol],
        denylist: &Denylist,
        reader: &R,
    ) -> EngineResult<Self> {
        let scope: HashSet<&str> = assets.iter().map(|s| s.as_str()).collect();
        let mut registry = Self::default();
        let mut skipped = 0usize;

        for listing in listings {
            if listing.deprecated {
                skipped += 1;
                continue;
            }
            let (asset_a, asset_b) = match split_pair_name(&listing.name) {
                Ok(assets) => assets,
                Err(_) => {
                    debug!("Skipping listing with unparseable name '{}'", listing.name);
                    skipped += 1;
                    continue;
                }
            };
            if !scope.contains(asset_a.as_str()) || !scope.contains(asset_b.as_str()) {
                skipped += 1;
                continue;
            }
            if denylist.denies(&asset_a, &asset_b) {
                debug!("Skipping denylisted pool {}", listing.name);
                skipped += 1;
                continue;
            }
            let name = pair_name(&asset_a, &asset_b);
            if registry.pairs.contains_key(&name) {
                warn!("Duplicate listing for {}, keeping the first", name);
                continue;
            }

            let pair = load_pair(listing, name.clone(), asset_a, asset_b, reader).await?;
            debug!("Registered {} (swap {})", pair.name, pair.swap_account);
            registry.pairs.insert(name, pair);
        }

        info!(
            "Pair registry: {} pairs ({} listings skipped)",
            registry.len(),
            skipped
        );
        Ok(registry)
    }

    /// [`build`](Self::build), retried up to `attempts` times while the failure
    /// is a recoverable transport error that carries a retry hint. Anything
    /// else, including a missing account, is returned at once.
    pub async fn build_with_retry<R: AccountReader + ?Sized>(
        listings: &[PoolListing],
        assets: &[Symbol],
        denylist: &Denylist,
        reader: &R,
        attempts: u32,
    ) -> EngineResult<Self> {
        let attempts = attempts.max(1);
        let mut attempt = 1;
        loop {
            let err = match Self::build(listings, assets, denylist, reader).await {
                Ok(registry) => return Ok(registry),
                Err(e) => e,
            };
            let delay = match err.retry_delay() {
                Some(delay) if !err.is_fatal() && attempt < attempts => delay,
                _ => return Err(err),
            };
            warn!(
                "Registry build failed: {}. Retrying in {:.1}s (attempt {}/{})",
                err,
                delay.as_secs_f64(),
                attempt,
                attempts
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Build a registry from already-resolved pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = Pair>) -> Self {
        Self {
            pairs: pairs.into_iter().map(|p| (p.name.clone(), p)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Pair> {
        self.pairs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pairs.contains_key(name)
    }

    /// Find the pool between two assets in either symbol order.
    ///
    /// Returns the pair and the reverse flag for swapping `from` into `to`.
    pub fn find_leg(&self, from: &str, to: &str) -> Option<(&Pair, bool)> {
        if let Some(pair) = self.pairs.get(pair_name(from, to).as_str()) {
            return Some((pair, false));
        }
        self.pairs
            .get(pair_name(to, from).as_str())
            .map(|pair| (pair, true))
    }

    pub fn pairs(&self) -> impl Iterator<Item = &Pair> {
        self.pairs.values()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

async fn load_pair<R: AccountReader + ?Sized>(
    listing: &PoolListing,
    name: Symbol,
    asset_a: Symbol,
    asset_b: Symbol,
    reader: &R,
) -> EngineResult<Pair> {
    let listing_error = |reason: String| EngineError::Listing {
        pair: name.to_string(),
        reason,
    };
    let decode_error = |source| EngineError::Decode {
        pair: name.to_string(),
        source,
    };

    let swap_account = listing
        .swap_account_key()
        .map_err(|e| listing_error(e.to_string()))?;
    let pool_mint = listing
        .pool_mint_key()
        .map_err(|e| listing_error(e.to_string()))?;

    let swap_data = reader.read_account(&swap_account).await?;
    let swap = SwapAccountLayout::decode(&swap_data).map_err(decode_error)?;
    if swap.pool_mint() != pool_mint {
        return Err(listing_error(format!(
            "listing mint {} does not match on-chain mint {}",
            pool_mint,
            swap.pool_mint()
        )));
    }

    let mint_data = reader.read_account(&pool_mint).await?;
    let authority = MintLayout::decode(&mint_data)
        .and_then(|mint| mint.authority())
        .map_err(decode_error)?;

    Ok(Pair {
        name,
        asset_a,
        asset_b,
        swap_account,
        authority,
        token_a: swap.token_a(),
        token_b: swap.token_b(),
        pool_mint,
        fee_account: swap.pool_fee_account(),
        trade_fee_numerator: swap.trade_fee_numerator,
        trade_fee_denominator: swap.trade_fee_denominator,
    })
}
