//! Snapshot data model
//!
//! A `Snapshot` is one complete, self-consistent set of metric values
//! for a single collection cycle. It is built from scratch every tick
//! and never mutated after publication; readers always observe a whole
//! snapshot or none at all.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Where a field's value came from this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Obtained directly from a configured external source
    Live,
    /// Synthesized by the fallback estimator
    Estimated,
}

/// Identifier for every derived metric carried by a snapshot.
///
/// Block height and epoch are deliberately absent: they are never
/// estimated, so they carry no provenance entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    TvlTotalUsd,
    TvlDexUsd,
    TvlStakingUsd,
    TradingPairCount,
    Volume24hUsd,
    TopPair,
    ParticipantsTotal,
    ParticipantsActive24h,
    Transactions24h,
    MvasPercentage,
    PrivateVolume24hUsd,
}

impl Field {
    pub const ALL: [Field; 11] = [
        Field::TvlTotalUsd,
        Field::TvlDexUsd,
        Field::TvlStakingUsd,
        Field::TradingPairCount,
        Field::Volume24hUsd,
        Field::TopPair,
        Field::ParticipantsTotal,
        Field::ParticipantsActive24h,
        Field::Transactions24h,
        Field::MvasPercentage,
        Field::PrivateVolume24hUsd,
    ];

    /// Fields owned by the auxiliary trading source (estimated as a
    /// block whenever that source is Disabled or fails).
    pub const TRADING: [Field; 8] = [
        Field::TvlDexUsd,
        Field::TradingPairCount,
        Field::Volume24hUsd,
        Field::TopPair,
        Field::ParticipantsTotal,
        Field::ParticipantsActive24h,
        Field::MvasPercentage,
        Field::PrivateVolume24hUsd,
    ];

    /// Stable identifier, also used as the metrics label
    pub fn name(&self) -> &'static str {
        match self {
            Field::TvlTotalUsd => "tvl_total_usd",
            Field::TvlDexUsd => "tvl_dex_usd",
            Field::TvlStakingUsd => "tvl_staking_usd",
            Field::TradingPairCount => "trading_pairs_count",
            Field::Volume24hUsd => "volume_24h_usd",
            Field::TopPair => "top_pair",
            Field::ParticipantsTotal => "participants_total",
            Field::ParticipantsActive24h => "participants_active_24h",
            Field::Transactions24h => "transactions_24h",
            Field::MvasPercentage => "mvas_percentage",
            Field::PrivateVolume24hUsd => "private_volume_24h_usd",
        }
    }
}

/// Per-field provenance for one snapshot
pub type ProvenanceMap = BTreeMap<Field, Provenance>;

/// One complete collection cycle's worth of network state.
///
/// Immutable once built; published to the store by atomic replace.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Latest block height (monotonic across successful primary fetches)
    pub block_height: u64,
    /// Current epoch (monotonic across successful primary fetches)
    pub epoch: u64,

    pub tvl_total_usd: f64,
    pub tvl_dex_usd: f64,
    pub tvl_staking_usd: f64,

    pub trading_pair_count: u32,
    pub volume_24h_usd: f64,
    pub top_pair: Option<String>,

    pub participants_total: u64,
    pub participants_active_24h: u64,

    pub transactions_24h: u64,

    /// Share of 24h volume routed through shielded (MVAS) flow, [0, 100]
    pub mvas_percentage: f64,
    pub private_volume_24h_usd: f64,

    /// Tick time this snapshot was assembled
    pub collected_at: DateTime<Utc>,

    /// True when the primary fetch failed this tick
    pub degraded: bool,

    /// True once any primary fetch has ever succeeded (carried forward).
    /// A snapshot without a live basis is "not ready", not a valid zero
    /// state.
    pub ready: bool,

    /// Live/Estimated tag for every derived metric
    pub provenance: ProvenanceMap,
}

impl Snapshot {
    pub fn provenance_of(&self, field: Field) -> Option<Provenance> {
        self.provenance.get(&field).copied()
    }

    pub fn is_estimated(&self, field: Field) -> bool {
        self.provenance_of(field) == Some(Provenance::Estimated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_are_stable_identifiers() {
        // Test: every field renders a unique, non-empty snake_case name
        let mut seen = std::collections::BTreeSet::new();
        for field in Field::ALL {
            let name = field.name();
            assert!(!name.is_empty());
            assert!(name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
            assert!(seen.insert(name), "duplicate field name: {}", name);
        }
    }

    #[test]
    fn test_trading_fields_are_a_subset_of_all() {
        for field in Field::TRADING {
            assert!(Field::ALL.contains(&field));
        }
        // Staking TVL, total TVL and transactions are not auxiliary-owned
        assert!(!Field::TRADING.contains(&Field::TvlStakingUsd));
        assert!(!Field::TRADING.contains(&Field::TvlTotalUsd));
        assert!(!Field::TRADING.contains(&Field::Transactions24h));
    }
}
