//! Snapshot reconciler
//!
//! Merges whatever live data arrived this tick with estimates for the
//! rest, producing exactly one complete snapshot with a provenance tag
//! on every derived field. Pure: no I/O, no clock, no retries — a failed
//! fetch simply yields degraded/estimated data for this cycle and the
//! next tick tries again.
//!
//! Policy decisions live here and nowhere else:
//! - height/epoch are clamped monotonically non-decreasing and are
//!   never fabricated; on primary failure they carry over unchanged
//! - `tvl_total = tvl_dex + tvl_staking`, Live only when both parts are
//! - auxiliary failure (or Disabled) estimates the whole trading block,
//!   never mislabeling prior live values as Live

use super::estimator::EstimateStrategy;
use super::indexer::TradingFetch;
use super::rpc::NetworkState;
use super::snapshot::{Field, Provenance, ProvenanceMap, Snapshot};
use super::FetchError;
use chrono::{DateTime, Utc};

/// Build this tick's snapshot from fetch outcomes.
///
/// `previous` is the last published snapshot, if any; `now` becomes the
/// snapshot's `collected_at`.
pub fn reconcile(
    previous: Option<&Snapshot>,
    primary: Result<NetworkState, FetchError>,
    auxiliary: Result<TradingFetch, FetchError>,
    estimator: &dyn EstimateStrategy,
    now: DateTime<Utc>,
) -> Snapshot {
    let elapsed_secs = previous
        .map(|p| (now - p.collected_at).num_seconds().max(0) as u64)
        .unwrap_or(0);

    let mut provenance = ProvenanceMap::new();

    // Height/epoch: live and clamped monotone, or carried over unchanged.
    let (block_height, epoch, network, degraded) = match primary {
        Ok(net) => {
            let height = net.block_height.max(previous.map_or(0, |p| p.block_height));
            let epoch = net.epoch.max(previous.map_or(0, |p| p.epoch));
            (height, epoch, Some(net), false)
        }
        Err(_) => (
            previous.map_or(0, |p| p.block_height),
            previous.map_or(0, |p| p.epoch),
            None,
            true,
        ),
    };

    let ready = network.is_some() || previous.map_or(false, |p| p.ready);

    let trading = match auxiliary {
        Ok(TradingFetch::Data(data)) => Some(data),
        Ok(TradingFetch::Disabled) | Err(_) => None,
    };

    // At most one estimate per tick, filled on first use and shared by
    // both fallback paths so their figures agree.
    let mut estimate = None;

    let (tvl_staking_usd, transactions_24h) = match &network {
        Some(net) => {
            provenance.insert(Field::TvlStakingUsd, Provenance::Live);
            provenance.insert(Field::Transactions24h, Provenance::Live);
            (net.tvl_staking_usd, net.transactions_24h)
        }
        None => {
            let est = estimate.get_or_insert_with(|| estimator.estimate(previous, elapsed_secs));
            provenance.insert(Field::TvlStakingUsd, Provenance::Estimated);
            provenance.insert(Field::Transactions24h, Provenance::Estimated);
            // Staking TVL has no estimator model; hold the prior value.
            (
                previous.map_or(0.0, |p| p.tvl_staking_usd),
                est.transactions_24h,
            )
        }
    };

    let (
        tvl_dex_usd,
        trading_pair_count,
        volume_24h_usd,
        top_pair,
        participants_total,
        participants_active_24h,
        mvas_percentage,
        private_volume_24h_usd,
    ) = match trading {
        Some(data) => {
            for field in Field::TRADING {
                provenance.insert(field, Provenance::Live);
            }
            (
                data.tvl_dex_usd,
                data.trading_pair_count,
                data.volume_24h_usd,
                data.top_pair,
                data.participants_total,
                data.participants_active_24h,
                data.mvas_percentage,
                data.private_volume_24h_usd,
            )
        }
        None => {
            let est = estimate.get_or_insert_with(|| estimator.estimate(previous, elapsed_secs));
            for field in Field::TRADING {
                provenance.insert(field, Provenance::Estimated);
            }
            (
                est.tvl_dex_usd,
                est.trading_pair_count,
                est.volume_24h_usd,
                est.top_pair.clone(),
                est.participants_total,
                est.participants_active_24h,
                est.mvas_percentage,
                est.private_volume_24h_usd,
            )
        }
    };

    // Reconciliation rule: total = dex + staking, Live only if both are.
    let tvl_total_usd = tvl_dex_usd + tvl_staking_usd;
    let total_live = provenance.get(&Field::TvlDexUsd) == Some(&Provenance::Live)
        && provenance.get(&Field::TvlStakingUsd) == Some(&Provenance::Live);
    provenance.insert(
        Field::TvlTotalUsd,
        if total_live {
            Provenance::Live
        } else {
            Provenance::Estimated
        },
    );

    Snapshot {
        block_height,
        epoch,
        tvl_total_usd,
        tvl_dex_usd,
        tvl_staking_usd,
        trading_pair_count,
        volume_24h_usd,
        top_pair,
        participants_total,
        participants_active_24h,
        transactions_24h,
        mvas_percentage,
        private_volume_24h_usd,
        collected_at: now,
        degraded,
        ready,
        provenance,
    }
}
