//! Refresh loop — re-reads the store on a fixed interval and republishes
//! the caches.
//!
//! Per cycle, strictly in order:
//! 1. read rates
//! 2. rewrite derived USD profit in the store from those rates
//! 3. read the aggregated leaderboard
//! 4. publish both snapshots
//!
//! Step 2 sits between the two reads so the leaderboard reflects the rates
//! fetched in the same cycle. Nothing is published unless all steps succeed.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::cache::Caches;
use crate::store::Store;

/// Fixed period between refresh cycles.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// What to do when a cycle fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Log, keep the previous snapshots and wait for the next tick.
    SkipCycle,
    /// Stop the loop and hand the error back to the caller.
    Abort,
}

impl ErrorPolicy {
    pub fn from_fail_fast(fail_fast: bool) -> Self {
        if fail_fast {
            ErrorPolicy::Abort
        } else {
            ErrorPolicy::SkipCycle
        }
    }
}

/// Summary of one successful cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    pub rates: usize,
    pub leaders: usize,
    pub elapsed: Duration,
}

pub struct Refresher {
    store: Arc<dyn Store>,
    caches: Arc<Caches>,
    policy: ErrorPolicy,
    interval: Duration,
}

impl Refresher {
    pub fn new(store: Arc<dyn Store>, caches: Arc<Caches>, policy: ErrorPolicy) -> Self {
        Self {
            store,
            caches,
            policy,
            interval: REFRESH_INTERVAL,
        }
    }

    /// Override the tick period. Only tests shorten it.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run one read → recompute → read → publish cycle.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let started = Instant::now();

        let rates = self.store.read_rates().await.context("Failed to read rates")?;

        self.store
            .apply_derived_profit(&rates)
            .await
            .context("Failed to apply derived profit")?;

        let leaders = self
            .store
            .read_aggregated_scores()
            .await
            .context("Failed to read leaderboard")?;

        let (rate_count, leader_count) = (rates.len(), leaders.len());
        self.caches.publish(rates, leaders).await;

        Ok(CycleReport {
            cycle: self.caches.status().await.cycles_completed,
            rates: rate_count,
            leaders: leader_count,
            elapsed: started.elapsed(),
        })
    }

    /// Tick forever. The first cycle runs immediately; ticks missed while a
    /// cycle is running are skipped rather than bunched up.
    ///
    /// Only returns under [`ErrorPolicy::Abort`], with the failing cycle's error.
    pub async fn run(self) -> Result<()> {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = self.interval.as_secs_f64(),
            policy = ?self.policy,
            "Refresh loop started"
        );

        loop {
            interval.tick().await;
            info!("Refreshing cache");

            match self.run_cycle().await {
                Ok(report) => log_cycle_report(&report),
                Err(e) => {
                    self.caches.record_failure(&e).await;
                    match self.policy {
                        ErrorPolicy::Abort => {
                            error!(error = %format!("{e:#}"), "Refresh cycle failed, aborting");
                            return Err(e.context("Refresh loop aborted"));
                        }
                        ErrorPolicy::SkipCycle => {
                            error!(
                                error = %format!("{e:#}"),
                                "Refresh cycle failed, keeping previous snapshot"
                            );
                        }
                    }
                }
            }
        }
    }

    /// Run the loop on its own task.
    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }
}

fn log_cycle_report(report: &CycleReport) {
    info!(
        cycle = report.cycle,
        rates = report.rates,
        leaders = report.leaders,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Cache refreshed"
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
