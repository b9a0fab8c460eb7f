//! Periodic digest formatting and scheduling
//!
//! Renders the latest snapshot into the Discord digest and pushes it on
//! its own cadence, independent of collection ticks. A cycle that finds
//! no ready snapshot is skipped silently; delivery failures are bounded
//! by the single retry in [`notify`](crate::notify).

use crate::collector::snapshot::{Field, Snapshot};
use crate::notify::{deliver_with_retry, NotificationSink};
use crate::store::{Current, SnapshotStore};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

/// Embed title for every digest
pub const DIGEST_TITLE: &str = "Penumbra Network Pulse";

/// Group an integer with thousands separators ("5287931" -> "5,287,931")
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// USD amount with separators and two decimals ("$158,226.00")
fn usd(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 { "-" } else { "" };
    format!(
        "{}${}.{:02}",
        sign,
        group_thousands(cents / 100),
        cents % 100
    )
}

/// Provenance suffix for one field, empty when live
fn est(snapshot: &Snapshot, field: Field) -> &'static str {
    if snapshot.is_estimated(field) {
        " (est.)"
    } else {
        ""
    }
}

/// Render the full digest body for one snapshot.
///
/// `now` and the digest interval only feed the next-update ETA line, so
/// the rest of the message is a pure function of the snapshot.
pub fn format_digest(snapshot: &Snapshot, digest_interval: Duration, now: DateTime<Utc>) -> String {
    let mut out = String::new();

    if snapshot.degraded {
        out.push_str("⚠️ Last collection cycle was degraded; some values are carried over.\n\n");
    }

    out.push_str("**Network Health**\n");
    out.push_str(&format!(
        "Block Height: {}\n",
        group_thousands(snapshot.block_height)
    ));
    out.push_str(&format!("Epoch: {}\n\n", snapshot.epoch));

    out.push_str("**Total Value Locked**\n");
    out.push_str(&format!(
        "Total: {}{}\n",
        usd(snapshot.tvl_total_usd),
        est(snapshot, Field::TvlTotalUsd)
    ));
    out.push_str(&format!(
        "DEX: {}{}\n",
        usd(snapshot.tvl_dex_usd),
        est(snapshot, Field::TvlDexUsd)
    ));
    out.push_str(&format!(
        "Staking: {}{}\n\n",
        usd(snapshot.tvl_staking_usd),
        est(snapshot, Field::TvlStakingUsd)
    ));

    out.push_str("**Trading Activity (24h)**\n");
    out.push_str(&format!(
        "Volume: {}{}\n",
        usd(snapshot.volume_24h_usd),
        est(snapshot, Field::Volume24hUsd)
    ));
    out.push_str(&format!(
        "Active Pairs: {}{}\n",
        snapshot.trading_pair_count,
        est(snapshot, Field::TradingPairCount)
    ));
    out.push_str(&format!(
        "Top Pair: {}{}\n\n",
        snapshot.top_pair.as_deref().unwrap_or("n/a"),
        est(snapshot, Field::TopPair)
    ));

    out.push_str("**LQT Tournament**\n");
    out.push_str(&format!(
        "Participants: {}{}\n",
        group_thousands(snapshot.participants_total),
        est(snapshot, Field::ParticipantsTotal)
    ));
    out.push_str(&format!(
        "Active (24h): {}{}\n\n",
        group_thousands(snapshot.participants_active_24h),
        est(snapshot, Field::ParticipantsActive24h)
    ));

    out.push_str("**Network Activity**\n");
    out.push_str(&format!(
        "Transactions (24h): {}{}\n\n",
        group_thousands(snapshot.transactions_24h),
        est(snapshot, Field::Transactions24h)
    ));

    out.push_str("**Privacy (MVAS)**\n");
    out.push_str(&format!(
        "Shielded Share: {:.1}%{}\n",
        snapshot.mvas_percentage,
        est(snapshot, Field::MvasPercentage)
    ));
    out.push_str(&format!(
        "Shielded Volume: {}{}\n\n",
        usd(snapshot.private_volume_24h_usd),
        est(snapshot, Field::PrivateVolume24hUsd)
    ));

    let eta = now + ChronoDuration::seconds(digest_interval.as_secs() as i64);
    out.push_str(&format!("Next update: {}", eta.format("%H:%M UTC")));

    out
}

/// Run the digest schedule forever.
///
/// The first tick fires immediately so a restart does not go a full
/// interval silent. Cycles that find no ready snapshot are skipped and
/// logged at debug, never retried early.
pub async fn run_digest_loop(
    store: Arc<SnapshotStore>,
    sink: Arc<dyn NotificationSink>,
    digest_interval: Duration,
) {
    log::info!(
        "Digest loop started (interval: {:.1}h)",
        digest_interval.as_secs_f64() / 3600.0
    );

    let mut ticker = interval(digest_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        match store.current() {
            Current::NotReady => {
                log::debug!("No ready snapshot yet, skipping digest cycle");
            }
            Current::Ready(snapshot) => {
                let body = format_digest(&snapshot, digest_interval, Utc::now());
                match deliver_with_retry(sink.as_ref(), DIGEST_TITLE, &body).await {
                    Ok(()) => log::info!("Digest delivered"),
                    Err(e) => log::error!("Digest dropped after retry: {}", e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::snapshot::{Provenance, ProvenanceMap};
    use crate::notify::DeliveryError;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct RecordingSink {
        sent: AtomicU32,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                sent: AtomicU32::new(0),
            }
        }

        fn count(&self) -> u32 {
            self.sent.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn send(&self, _title: &str, _message: &str) -> Result<(), DeliveryError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn make_snapshot() -> Snapshot {
        let mut provenance = ProvenanceMap::new();
        for field in Field::ALL {
            provenance.insert(field, Provenance::Live);
        }
        Snapshot {
            block_height: 5_287_931,
            epoch: 461,
            tvl_total_usd: 158_226.0,
            tvl_dex_usd: 105_817.0,
            tvl_staking_usd: 52_409.0,
            trading_pair_count: 5,
            volume_24h_usd: 6_270.0,
            top_pair: Some("UM/USDC".to_string()),
            participants_total: 1_024,
            participants_active_24h: 25,
            transactions_24h: 253,
            mvas_percentage: 15.5,
            private_volume_24h_usd: 971.85,
            collected_at: Utc::now(),
            degraded: false,
            ready: true,
            provenance,
        }
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(5_287_931), "5,287,931");
    }

    #[test]
    fn test_usd_formatting() {
        assert_eq!(usd(158_226.0), "$158,226.00");
        assert_eq!(usd(971.85), "$971.85");
        assert_eq!(usd(0.0), "$0.00");
    }

    #[test]
    fn test_digest_sections_and_values() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let body = format_digest(&make_snapshot(), Duration::from_secs(3 * 3600), now);

        assert!(body.contains("**Network Health**"));
        assert!(body.contains("Block Height: 5,287,931"));
        assert!(body.contains("Epoch: 461"));
        assert!(body.contains("Total: $158,226.00"));
        assert!(body.contains("Volume: $6,270.00"));
        assert!(body.contains("Top Pair: UM/USDC"));
        assert!(body.contains("Participants: 1,024"));
        assert!(body.contains("Transactions (24h): 253"));
        assert!(body.contains("Shielded Share: 15.5%"));
        assert!(body.contains("Shielded Volume: $971.85"));
        assert!(body.contains("Next update: 15:00 UTC"));
        // All-live snapshot carries no estimate tags and no warning
        assert!(!body.contains("(est.)"));
        assert!(!body.contains("degraded"));
    }

    #[test]
    fn test_estimated_fields_are_tagged() {
        // Test: provenance drives the (est.) suffix per field
        let mut snapshot = make_snapshot();
        snapshot
            .provenance
            .insert(Field::Volume24hUsd, Provenance::Estimated);
        snapshot
            .provenance
            .insert(Field::ParticipantsTotal, Provenance::Estimated);

        let body = format_digest(&snapshot, Duration::from_secs(3600), Utc::now());
        assert!(body.contains("Volume: $6,270.00 (est.)"));
        assert!(body.contains("Participants: 1,024 (est.)"));
        assert!(body.contains("Total: $158,226.00\n"));
    }

    #[test]
    fn test_degraded_snapshot_carries_warning() {
        let mut snapshot = make_snapshot();
        snapshot.degraded = true;
        let body = format_digest(&snapshot, Duration::from_secs(3600), Utc::now());
        assert!(body.starts_with("⚠️"));
    }

    #[test]
    fn test_missing_top_pair_renders_placeholder() {
        let mut snapshot = make_snapshot();
        snapshot.top_pair = None;
        let body = format_digest(&snapshot, Duration::from_secs(3600), Utc::now());
        assert!(body.contains("Top Pair: n/a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_sends_first_digest_immediately() {
        // Test: a restart does not go a full interval silent; the first
        // cycle fires right away
        let store = Arc::new(SnapshotStore::new());
        store.publish(make_snapshot());
        let sink = Arc::new(RecordingSink::new());

        tokio::spawn(run_digest_loop(
            store,
            sink.clone() as Arc<dyn NotificationSink>,
            Duration::from_secs(3 * 3600),
        ));

        // Paused clock: sleeps auto-advance once every task is blocked
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(sink.count(), 1);

        // The second digest waits out the full interval
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(sink.count(), 1);
        tokio::time::sleep(Duration::from_secs(2 * 3600)).await;
        assert_eq!(sink.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_skips_cycles_with_no_ready_snapshot() {
        // Test: an empty store means no delivery at all, on the first
        // cycle or any later one
        let store = Arc::new(SnapshotStore::new());
        let sink = Arc::new(RecordingSink::new());

        tokio::spawn(run_digest_loop(
            store.clone(),
            sink.clone() as Arc<dyn NotificationSink>,
            Duration::from_secs(3 * 3600),
        ));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(sink.count(), 0);
        tokio::time::sleep(Duration::from_secs(3 * 3600)).await;
        assert_eq!(sink.count(), 0);

        // Once a ready snapshot exists the next cycle delivers
        store.publish(make_snapshot());
        tokio::time::sleep(Duration::from_secs(3 * 3600)).await;
        assert_eq!(sink.count(), 1);
    }
}
