//! Collection tick driver
//!
//! Owns the periodic collection schedule: fires the primary and
//! auxiliary fetches concurrently, bounds each with the fetch timeout,
//! reconciles, and publishes. Ticks are serialized — the loop awaits
//! each tick, and missed ticks are skipped rather than queued, so the
//! store's single-writer invariant holds by construction.

use super::estimator::EstimateStrategy;
use super::indexer::{TradingDataSource, TradingFetch};
use super::reconciler::reconcile;
use super::rpc::NetworkStateSource;
use super::snapshot::Snapshot;
use super::FetchError;
use crate::store::SnapshotStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};

/// Drives collection ticks: fetch, reconcile, publish
pub struct Collector<P, A, E> {
    primary: P,
    auxiliary: A,
    estimator: E,
    store: Arc<SnapshotStore>,
    fetch_timeout: Duration,
    previous: Option<Snapshot>,
}

impl<P, A, E> Collector<P, A, E>
where
    P: NetworkStateSource,
    A: TradingDataSource,
    E: EstimateStrategy,
{
    pub fn new(
        primary: P,
        auxiliary: A,
        estimator: E,
        store: Arc<SnapshotStore>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            primary,
            auxiliary,
            estimator,
            store,
            fetch_timeout,
            previous: None,
        }
    }

    /// Run one collection tick at `now` and publish the result.
    ///
    /// Both fetches run concurrently; a source that exceeds the fetch
    /// timeout is abandoned for this cycle and treated as a FetchError,
    /// never stalling the next tick.
    pub async fn run_tick(&mut self, now: DateTime<Utc>) {
        let (primary, auxiliary) = tokio::join!(
            timeout(self.fetch_timeout, self.primary.fetch_network_state()),
            timeout(self.fetch_timeout, self.auxiliary.fetch_trading_data()),
        );

        let primary = primary.unwrap_or(Err(FetchError::Timeout));
        let auxiliary = auxiliary.unwrap_or(Err(FetchError::Timeout));

        if let Err(e) = &primary {
            log::warn!("Primary fetch failed, tick degraded: {}", e);
        }
        match &auxiliary {
            Err(e) => log::warn!("Auxiliary fetch failed, estimating trading data: {}", e),
            // Disabled is permanent and expected; keep it out of the
            // warn stream so it cannot churn every 30 seconds.
            Ok(TradingFetch::Disabled) => {
                log::debug!("Auxiliary source disabled, estimating trading data")
            }
            Ok(TradingFetch::Data(_)) => {}
        }

        let snapshot = reconcile(
            self.previous.as_ref(),
            primary,
            auxiliary,
            &self.estimator,
            now,
        );

        log::info!(
            "Data updated - Epoch: {}, Height: {}, TVL: ${:.0}{}",
            snapshot.epoch,
            snapshot.block_height,
            snapshot.tvl_total_usd,
            if snapshot.degraded { " (degraded)" } else { "" },
        );

        self.store.publish(snapshot.clone());
        self.previous = Some(snapshot);
    }

    /// Run the collection loop forever on `tick_interval`.
    ///
    /// The interval skips missed ticks: if a tick is still running when
    /// the next is due, the late tick is dropped instead of overlapping.
    pub async fn run(mut self, tick_interval: Duration) {
        log::info!(
            "Collection loop started (interval: {}s, fetch timeout: {}s)",
            tick_interval.as_secs(),
            self.fetch_timeout.as_secs()
        );

        let mut ticker = interval(tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            self.run_tick(Utc::now()).await;
        }
    }
}
