//! Runtime counters and the periodic stats reporter.

use loopswap_engine::CycleReport;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Statistics for the bot.
#[derive(Debug)]
pub struct BotStats {
    /// Completed engine cycles.
    pub cycles: AtomicU64,
    /// Cycles that evaluated against a stale snapshot.
    pub refresh_failures: AtomicU64,
    /// Paths whose margin cleared the profit threshold.
    pub opportunities: AtomicU64,
    /// Submission attempts.
    pub fires: AtomicU64,
    pub submit_failures: AtomicU64,
    /// Balance notifications applied.
    pub balance_updates: AtomicU64,
    started_at: Instant,
}

impl Default for BotStats {
    fn default() -> Self {
        Self::new()
    }
}

impl BotStats {
    pub fn new() -> Self {
        Self {
            cycles: AtomicU64::new(0),
            refresh_failures: AtomicU64::new(0),
            opportunities: AtomicU64::new(0),
            fires: AtomicU64::new(0),
            submit_failures: AtomicU64::new(0),
            balance_updates: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Fold one cycle's report into the counters.
    pub fn record(&self, report: &CycleReport) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        if !report.refreshed {
            self.refresh_failures.fetch_add(1, Ordering::Relaxed);
        }
        self.opportunities
            .fetch_add(report.opportunities as u64, Ordering::Relaxed);
        self.fires.fetch_add(report.fires as u64, Ordering::Relaxed);
        self.submit_failures
            .fetch_add(report.submit_failures as u64, Ordering::Relaxed);
    }

    pub fn record_balance_update(&self) {
        self.balance_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            cycles: self.cycles.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
            opportunities: self.opportunities.load(Ordering::Relaxed),
            fires: self.fires.load(Ordering::Relaxed),
            submit_failures: self.submit_failures.load(Ordering::Relaxed),
            balance_updates: self.balance_updates.load(Ordering::Relaxed),
            uptime_secs: self.uptime_secs(),
        }
    }
}

/// Summary of statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSummary {
    pub cycles: u64,
    pub refresh_failures: u64,
    pub opportunities: u64,
    pub fires: u64,
    pub submit_failures: u64,
    pub balance_updates: u64,
    pub uptime_secs: u64,
}

/// Log a summary line every `interval`, forever.
pub async fn run_stats_reporter(stats: Arc<BotStats>, interval: Duration) {
    info!("Starting stats reporter");
    let mut ticker = tokio::time::interval(interval);
    // First tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let summary = stats.summary();
        info!(
            "Stats | Uptime: {}s | Cycles: {} (stale {}) | Opportunities: {} | Fires: {} (failed {}) | Balance updates: {}",
            summary.uptime_secs,
            summary.cycles,
            summary.refresh_failures,
            summary.opportunities,
            summary.fires,
            summary.submit_failures,
            summary.balance_updates
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_cycle_reports() {
        let stats = BotStats::new();
        stats.record(&CycleReport {
            refreshed: true,
            paths_evaluated: 12,
            opportunities: 2,
            fires: 6,
            submit_failures: 1,
            best_margin: Some(150_000),
        });
        stats.record(&CycleReport {
            refreshed: false,
            ..Default::default()
        });
        stats.record_balance_update();

        let summary = stats.summary();
        assert_eq!(
            summary,
            StatsSummary {
                cycles: 2,
                refresh_failures: 1,
                opportunities: 2,
                fires: 6,
                submit_failures: 1,
                balance_updates: 1,
                uptime_secs: summary.uptime_secs,
            }
        );
    }

    #[test]
    fn test_new_stats_are_zero() {
        let summary = BotStats::default().summary();
        assert_eq!(summary.cycles, 0);
        assert_eq!(summary.fires, 0);
    }
}
