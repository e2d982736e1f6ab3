//! Engine configuration.

use std::time::Duration;

/// Tunables for path evaluation and firing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Margin (final output minus input, base units) a loop must exceed to fire.
    pub min_profit: u64,
    /// Margin above which the loop is fired `burst_repeats` times.
    pub burst_threshold: u64,
    /// Fires issued for a large opportunity.
    pub burst_repeats: u32,
    /// Minimum time between fire attempts on the same path.
    pub cooldown: Duration,
    /// Pool fee as a fraction `fee_numerator / fee_denominator` of the input kept.
    pub fee_numerator: u64,
    pub fee_denominator: u64,
    /// Intermediate outputs are reduced by `amount / haircut_divisor`.
    pub haircut_divisor: u64,
    /// Pause between cycles. Zero runs cycles back to back.
    pub cycle_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_profit: 2_000,
            burst_threshold: 100_000,
            burst_repeats: 5,
            cooldown: Duration::from_secs(5),
            fee_numerator: 997,
            fee_denominator: 1_000,
            haircut_divisor: 100_000,
            cycle_interval: Duration::ZERO,
        }
    }
}
