//! Prometheus text exposition of the current snapshot
//!
//! Renders the latest snapshot as a flat set of named gauges on every
//! scrape; no side effects, no state of its own. Before the first
//! primary-backed snapshot exists the surface is minimal (readiness and
//! uptime only) rather than an error.

use crate::collector::snapshot::{Field, Snapshot};
use crate::store::Current;
use std::fmt::Write;
use std::time::Duration;

/// Content type for the Prometheus exposition format
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

const PREFIX: &str = "penumbra";

fn gauge(out: &mut String, name: &str, help: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "# HELP {}_{} {}", PREFIX, name, help);
    let _ = writeln!(out, "# TYPE {}_{} gauge", PREFIX, name);
    let _ = writeln!(out, "{}_{} {}\n", PREFIX, name, value);
}

/// Render the scrape body for the current store state
pub fn render_metrics(current: &Current, uptime: Duration) -> String {
    let mut out = String::new();

    gauge(
        &mut out,
        "collector_ready",
        "1 once a primary-backed snapshot has been published",
        if current.is_ready() { 1 } else { 0 },
    );
    gauge(
        &mut out,
        "collector_uptime_seconds",
        "Collector process uptime in seconds",
        uptime.as_secs(),
    );

    if let Current::Ready(snapshot) = current {
        render_snapshot(&mut out, snapshot);
    }

    out
}

fn render_snapshot(out: &mut String, s: &Snapshot) {
    gauge(out, "block_height", "Current block height", s.block_height);
    gauge(out, "current_epoch", "Current epoch", s.epoch);

    gauge(
        out,
        "tvl_total_usd",
        "Total Value Locked in USD",
        format_args!("{:.2}", s.tvl_total_usd),
    );
    gauge(
        out,
        "tvl_dex_usd",
        "DEX TVL in USD",
        format_args!("{:.2}", s.tvl_dex_usd),
    );
    gauge(
        out,
        "tvl_staking_usd",
        "Staking TVL in USD",
        format_args!("{:.2}", s.tvl_staking_usd),
    );

    gauge(
        out,
        "trading_pairs_count",
        "Number of active trading pairs",
        s.trading_pair_count,
    );
    gauge(
        out,
        "trading_volume_24h_usd",
        "24h trading volume in USD",
        format_args!("{:.2}", s.volume_24h_usd),
    );

    gauge(
        out,
        "lqt_participants_total",
        "Total LQT participants",
        s.participants_total,
    );
    gauge(
        out,
        "lqt_participants_24h",
        "Active LQT participants in 24h",
        s.participants_active_24h,
    );

    gauge(
        out,
        "transactions_24h_total",
        "Total transactions in 24h",
        s.transactions_24h,
    );

    gauge(
        out,
        "mvas_percentage",
        "Share of volume through shielded flow",
        format_args!("{:.1}", s.mvas_percentage),
    );
    gauge(
        out,
        "private_volume_24h_usd",
        "24h shielded volume in USD",
        format_args!("{:.2}", s.private_volume_24h_usd),
    );

    gauge(
        out,
        "collector_degraded",
        "1 when the primary fetch failed this cycle",
        if s.degraded { 1 } else { 0 },
    );
    gauge(
        out,
        "last_update_timestamp",
        "Unix time of the last collection tick",
        s.collected_at.timestamp(),
    );

    // Provenance as a labeled gauge: 1 = estimated, 0 = live
    let _ = writeln!(
        out,
        "# HELP {}_field_estimated 1 when the field was synthesized by the fallback estimator",
        PREFIX
    );
    let _ = writeln!(out, "# TYPE {}_field_estimated gauge", PREFIX);
    for field in Field::ALL {
        let _ = writeln!(
            out,
            "{}_field_estimated{{field=\"{}\"}} {}",
            PREFIX,
            field.name(),
            if s.is_estimated(field) { 1 } else { 0 }
        );
    }
    let _ = writeln!(out);
}
