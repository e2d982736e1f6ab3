//! Per-path cooldown and profitability gate.

use crate::EngineConfig;
use loopswap_core::Symbol;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Why a path was not fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Margin at or below the minimum profit.
    Unprofitable,
    /// Fired too recently.
    Cooldown,
}

/// Outcome of gating one evaluated path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireDecision {
    Skip(SkipReason),
    /// Submit the loop `repeats` times back to back.
    Fire { repeats: u32 },
}

impl FireDecision {
    pub fn repeats(&self) -> u32 {
        match self {
            FireDecision::Fire { repeats } => *repeats,
            FireDecision::Skip(_) => 0,
        }
    }
}

/// Cooldown records keyed by path name. Paths start out as never fired.
#[derive(Debug, Clone)]
pub struct Throttle {
    cooldown: Duration,
    min_profit: i128,
    burst_threshold: i128,
    burst_repeats: u32,
    last_fire: HashMap<Symbol, Instant>,
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl Throttle {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            cooldown: config.cooldown,
            min_profit: config.min_profit as i128,
            burst_threshold: config.burst_threshold as i128,
            burst_repeats: config.burst_repeats.max(1),
            last_fire: HashMap::new(),
        }
    }

    /// Whether a margin clears the minimum profit.
    #[inline]
    pub fn is_profitable(&self, margin: i128) -> bool {
        margin > self.min_profit
    }

    /// Decide whether `path` fires at `now` with the given margin.
    pub fn decide(&self, path: &str, margin: i128, now: Instant) -> FireDecision {
        if !self.is_profitable(margin) {
            return FireDecision::Skip(SkipReason::Unprofitable);
        }
        if let Some(last) = self.last_fire.get(path) {
            if now.saturating_duration_since(*last) < self.cooldown {
                return FireDecision::Skip(SkipReason::Cooldown);
            }
        }
        let repeats = if margin > self.burst_threshold {
            self.burst_repeats
        } else {
            1
        };
        FireDecision::Fire { repeats }
    }

    /// Start the cooldown for `path`. Called after every fire, whatever the
    /// submission outcome.
    pub fn record(&mut self, path: &str, now: Instant) {
        self.last_fire.insert(Symbol::new(path), now);
    }

    pub fn last_fire(&self, path: &str) -> Option<Instant> {
        self.last_fire.get(path).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PATH: &str = "SOL/USDC/ETH/SOL";

    #[test]
    fn test_never_fired_path_fires() {
        let throttle = Throttle::default();
        assert_eq!(
            throttle.decide(PATH, 2_500, Instant::now()),
            FireDecision::Fire { repeats: 1 }
        );
    }

    #[test]
    fn test_cooldown_blocks_profitable_path() {
        let mut throttle = Throttle::default();
        let start = Instant::now();
        throttle.record(PATH, start);

        let now = start + Duration::from_secs(3);
        assert_eq!(
            throttle.decide(PATH, 150_000, now),
            FireDecision::Skip(SkipReason::Cooldown)
        );
    }

    #[test]
    fn test_small_margin_fires_once() {
        let mut throttle = Throttle::default();
        let start = Instant::now();
        throttle.record(PATH, start);

        let now = start + Duration::from_secs(6);
        let decision = throttle.decide(PATH, 2_500, now);
        assert_eq!(decision, FireDecision::Fire { repeats: 1 });

        throttle.record(PATH, now);
        assert_eq!(throttle.last_fire(PATH), Some(now));
    }

    #[test]
    fn test_large_margin_fires_five_times() {
        let mut throttle = Throttle::default();
        let start = Instant::now();
        throttle.record(PATH, start);

        let now = start + Duration::from_secs(6);
        let decision = throttle.decide(PATH, 150_000, now);
        assert_eq!(decision.repeats(), 5);

        throttle.record(PATH, now);
        assert_eq!(throttle.last_fire(PATH), Some(now));
        assert_eq!(
            throttle.decide(PATH, 150_000, now + Duration::from_secs(1)),
            FireDecision::Skip(SkipReason::Cooldown)
        );
    }

    #[test]
    fn test_profit_threshold_is_strict() {
        let throttle = Throttle::default();
        let now = Instant::now();
        assert_eq!(
            throttle.decide(PATH, 2_000, now),
            FireDecision::Skip(SkipReason::Unprofitable)
        );
        assert_eq!(throttle.decide(PATH, 2_001, now).repeats(), 1);
        assert_eq!(throttle.decide(PATH, 100_000, now).repeats(), 1);
        assert_eq!(throttle.decide(PATH, 100_001, now).repeats(), 5);
        assert_eq!(
            throttle.decide(PATH, -50_000, now),
            FireDecision::Skip(SkipReason::Unprofitable)
        );
    }

    #[test]
    fn test_paths_cool_down_independently() {
        let mut throttle = Throttle::default();
        let now = Instant::now();
        throttle.record(PATH, now);
        assert_eq!(
            throttle.decide("SOL/USDT/ETH/SOL", 5_000, now),
            FireDecision::Fire { repeats: 1 }
        );
    }
}
