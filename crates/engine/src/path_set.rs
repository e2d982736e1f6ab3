//! Path set builder.
//!
//! Enumerates closed 3- and 4-hop loops anchored at the reference asset. Asset
//! combinations are taken in asset-list order (`i < j < k`), so each loop is
//! produced in one direction only.

use crate::{Denylist, EngineError, EngineResult, PairRegistry};
use loopswap_core::{CyclePath, Hop, LoopShape, Symbol};
use tracing::info;

/// All cyclic paths for one reference asset. Immutable once built.
#[derive(Debug, Clone)]
pub struct PathSet {
    reference: Symbol,
    paths: Vec<CyclePath>,
}

impl PathSet {
    /// Build every valid loop over `assets` through `registry`.
    ///
    /// The reference asset itself is never used as an intermediate. A
    /// combination is dropped if any leg has no pool or uses a denylisted pool.
    ///
    /// Intermediates are visited in asset-list order only: `R→i→j→R` for
    /// `i < j` and `R→i→j→k→R` for `i < j < k`. Three assets `{A, B, C}`
    /// admit three distinct quads up to direction (A-B-C, A-C-B, B-A-C);
    /// only the first is built, and no reverse loop is ever built.
    pub fn build(
        registry: &PairRegistry,
        reference: &str,
        assets: &[Symbol],
        denylist: &Denylist,
    ) -> EngineResult<Self> {
        if !registry.pairs().any(|p| p.asset_a == reference || p.asset_b == reference) {
            return Err(EngineError::UnknownAsset(reference.to_string()));
        }

        let candidates: Vec<&str> = assets
            .iter()
            .map(|s| s.as_str())
            .filter(|s| *s != reference)
            .collect();
        let n = candidates.len();
        let mut paths = Vec::new();

        for i in 0..n {
            for j in (i + 1)..n {
                let chain = [reference, candidates[i], candidates[j], reference];
                if let Some(path) = build_loop(registry, denylist, reference, &chain)? {
                    paths.push(path);
                }
                for k in (j + 1)..n {
                    let chain = [
                        reference,
                        candidates[i],
                        candidates[j],
                        candidates[k],
                        reference,
                    ];
                    if let Some(path) = build_loop(registry, denylist, reference, &chain)? {
                        paths.push(path);
                    }
                }
            }
        }

        let set = Self {
            reference: Symbol::new(reference),
            paths,
        };
        info!(
            "Path set for {}: {} paths ({} 3-hop, {} 4-hop)",
            reference,
            set.len(),
            set.count(LoopShape::Triangle),
            set.count(LoopShape::Quad)
        );
        Ok(set)
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn paths(&self) -> &[CyclePath] {
        &self.paths
    }

    pub fn iter(&self) -> impl Iterator<Item = &CyclePath> {
        self.paths.iter()
    }

    /// Number of paths of one shape.
    pub fn count(&self, shape: LoopShape) -> usize {
        self.paths.iter().filter(|p| p.shape() == shape).count()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Resolve each leg of an asset chain to a pool. `None` if any leg is missing or denied.
fn build_loop(
    registry: &PairRegistry,
    denylist: &Denylist,
    reference: &str,
    chain: &[&str],
) -> EngineResult<Option<CyclePath>> {
    let mut hops = Vec::with_capacity(chain.len() - 1);
    for leg in chain.windows(2) {
        let (from, to) = (leg[0], leg[1]);
        if denylist.denies(from, to) {
            return Ok(None);
        }
        match registry.find_leg(from, to) {
            Some((pair, reverse)) => hops.push(Hop::new(&pair.name, reverse, from, to)),
            None => return Ok(None),
        }
    }
    Ok(Some(CyclePath::new(reference, hops)?))
}
