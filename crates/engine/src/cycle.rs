//! Detection cycle: refresh, evaluate every path, fire what passes the gate.
//!
//! One engine owns all mutable state (reserves, cooldowns). Cycles run
//! strictly sequentially; a slow submission delays the rest of the cycle.

use crate::{
    EngineConfig, FireDecision, Optimizer, PairRegistry, PathSet, PoolStateCache, Throttle,
    WalletBalance,
};
use async_trait::async_trait;
use loopswap_core::{CyclePath, TradeQuote};
use loopswap_feeds::AccountReader;
use solana_sdk::signature::Signature;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Turns a quoted loop into a submitted transaction.
#[async_trait]
pub trait LoopSubmitter: Send + Sync {
    type Error: Display + Send;

    /// Build, sign and submit one loop. Does not wait for confirmation.
    async fn submit(
        &self,
        registry: &PairRegistry,
        path: &CyclePath,
        quote: &TradeQuote,
    ) -> Result<Signature, Self::Error>;
}

/// Summary of one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Whether reserves were refreshed (false means last cycle's were reused).
    pub refreshed: bool,
    pub paths_evaluated: usize,
    /// Paths whose margin cleared the minimum profit.
    pub opportunities: usize,
    /// Submission attempts, including failed ones.
    pub fires: usize,
    pub submit_failures: usize,
    /// Best margin seen this cycle.
    pub best_margin: Option<i128>,
}

/// Engine context for one reference asset.
pub struct ArbitrageEngine<R: ?Sized, S> {
    registry: Arc<PairRegistry>,
    paths: PathSet,
    cache: PoolStateCache,
    optimizer: Optimizer,
    throttle: Throttle,
    balance: WalletBalance,
    reader: Arc<R>,
    submitter: S,
}

impl<R, S> ArbitrageEngine<R, S>
where
    R: AccountReader + ?Sized,
    S: LoopSubmitter,
{
    pub fn new(
        config: &EngineConfig,
        registry: Arc<PairRegistry>,
        paths: PathSet,
        balance: WalletBalance,
        reader: Arc<R>,
        submitter: S,
    ) -> Self {
        let cache = PoolStateCache::new(&registry, &paths);
        Self {
            registry,
            paths,
            cache,
            optimizer: Optimizer::from(config),
            throttle: Throttle::new(config),
            balance,
            reader,
            submitter,
        }
    }

    pub fn paths(&self) -> &PathSet {
        &self.paths
    }

    pub fn cache(&self) -> &PoolStateCache {
        &self.cache
    }

    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    /// Run one full cycle.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        match self.cache.refresh(self.reader.as_ref()).await {
            Ok(()) => report.refreshed = true,
            Err(e) => warn!("Reserve refresh failed, reusing previous snapshot: {}", e),
        }

        for path in self.paths.iter() {
            let Some(reserves) = self.cache.oriented_reserves(&self.registry, path) else {
                warn!("Path {} references an unknown pair", path.name());
                continue;
            };
            report.paths_evaluated += 1;

            let quote = self
                .optimizer
                .quote(path.shape(), &reserves, self.balance.get());
            let margin = quote.margin();
            report.best_margin = Some(report.best_margin.map_or(margin, |m| m.max(margin)));

            if self.throttle.is_profitable(margin) {
                report.opportunities += 1;
            }

            let repeats = match self.throttle.decide(path.name(), margin, Instant::now()) {
                FireDecision::Fire { repeats } => repeats,
                FireDecision::Skip(reason) => {
                    debug!("{}: margin {} skipped ({:?})", path.name(), margin, reason);
                    continue;
                }
            };

            info!(
                "Opportunity {}: in {} -> out {} (margin {}), firing {}x",
                path.name(),
                quote.input,
                quote.final_output(),
                margin,
                repeats
            );

            for _ in 0..repeats {
                report.fires += 1;
                match self.submitter.submit(&self.registry, path, &quote).await {
                    Ok(signature) => info!("{}: submitted {}", path.name(), signature),
                    Err(e) => {
                        report.submit_failures += 1;
                        warn!("{}: submission failed: {}", path.name(), e);
                    }
                }
            }
            self.throttle.record(path.name(), Instant::now());
        }

        report
    }
}
