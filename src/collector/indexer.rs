//! Auxiliary source client
//!
//! Queries the pindexer Postgres database for trading activity: DEX
//! aggregate volume/liquidity, the top pair by volume, and LQT
//! participant counts. Entirely optional — when no connection string is
//! configured every fetch reports `Disabled`, which is an expected
//! permanent state, not an error.
//!
//! Tables read (pindexer schema):
//! - `dex_ex_aggregate_summary` - 1d window volume, liquidity, pairs
//! - `dex_ex_pairs_summary` - per-pair volume, for the top pair
//! - `lqt.delegator_summary` - LQT tournament participants

use super::FetchError;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{PgPool, Row};

/// Indexer figures are stored in micro-units of the quote asset
const MICRO_UNITS: f64 = 1_000_000.0;

/// Share of daily volume routed through shielded (MVAS) flow. The
/// indexer does not expose this yet; ratio observed on chain.
const MVAS_VOLUME_SHARE: f64 = 0.155;

/// Active-participant heuristic: at most this many per trading pair
const ACTIVE_PER_PAIR: i64 = 5;

const AGGREGATE_SQL: &str = "\
    SELECT COALESCE(direct_volume, 0)::FLOAT8 AS direct_volume, \
           COALESCE(liquidity, 0)::FLOAT8 AS liquidity, \
           COALESCE(active_pairs, 0)::BIGINT AS active_pairs \
    FROM dex_ex_aggregate_summary \
    WHERE the_window = '1d'";

const TOP_PAIR_SQL: &str = "\
    SELECT ENCODE(asset_start, 'hex') AS asset_start_hex, \
           ENCODE(asset_end, 'hex') AS asset_end_hex, \
           COALESCE(direct_volume_over_window + swap_volume_over_window, 0)::FLOAT8 AS total_volume \
    FROM dex_ex_pairs_summary \
    WHERE the_window = '1d' \
    ORDER BY total_volume DESC \
    LIMIT 1";

const PARTICIPANTS_SQL: &str = "SELECT COUNT(*)::BIGINT AS participant_count FROM lqt.delegator_summary";

/// The full trading record for one collection cycle.
///
/// All-or-nothing: either every field here is live and authoritative,
/// or the fetch yielded `Disabled`/`FetchError` and none of them exist.
#[derive(Debug, Clone, PartialEq)]
pub struct TradingData {
    pub trading_pair_count: u32,
    pub volume_24h_usd: f64,
    pub top_pair: Option<String>,
    pub tvl_dex_usd: f64,
    pub participants_total: u64,
    pub participants_active_24h: u64,
    pub mvas_percentage: f64,
    pub private_volume_24h_usd: f64,
}

/// Outcome of an auxiliary fetch that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum TradingFetch {
    Data(TradingData),
    /// No auxiliary store configured — permanent and expected
    Disabled,
}

/// Seam for the auxiliary source, mockable in tests
#[async_trait]
pub trait TradingDataSource: Send + Sync {
    async fn fetch_trading_data(&self) -> Result<TradingFetch, FetchError>;
}

/// Map known asset-id hex prefixes (first 8 chars) to display symbols
pub(crate) fn pair_display_name(asset_start_hex: &str, asset_end_hex: &str) -> String {
    fn symbol(prefix: &str) -> String {
        match prefix {
            "29ea9c2f" => "UM".to_string(),
            "76b3e4b1" => "USDC".to_string(),
            "414e723f" => "allBTC".to_string(),
            "c9c1e3fa" => "CDT".to_string(),
            "a1b2c3d4" => "TIA".to_string(),
            "d4e5f6a7" => "ATOM".to_string(),
            other => format!("{}...", other),
        }
    }
    let start = &asset_start_hex[..asset_start_hex.len().min(8)];
    let end = &asset_end_hex[..asset_end_hex.len().min(8)];
    format!("{}/{}", symbol(start), symbol(end))
}

/// Auxiliary source client over the pindexer Postgres database
pub struct PindexerClient {
    pool: Option<PgPool>,
}

impl PindexerClient {
    /// Create a client; `None` yields a permanently Disabled source.
    ///
    /// `ca_cert` is an optional path to a CA certificate; when set the
    /// connection requires TLS verified against that CA. The connection
    /// is established lazily on first query, so startup never blocks on
    /// the indexer being reachable.
    pub fn new(url: Option<&str>, ca_cert: Option<&str>) -> Result<Self, FetchError> {
        let pool = match url {
            Some(url) => {
                let mut options: PgConnectOptions = url.parse().map_err(FetchError::from)?;
                if let Some(cert) = ca_cert {
                    options = options
                        .ssl_mode(PgSslMode::VerifyCa)
                        .ssl_root_cert(cert);
                }
                Some(
                    PgPoolOptions::new()
                        .max_connections(2)
                        .connect_lazy_with(options),
                )
            }
            None => None,
        };
        Ok(Self { pool })
    }

    pub fn disabled() -> Self {
        Self { pool: None }
    }

    async fn query_trading_data(&self, pool: &PgPool) -> Result<TradingData, FetchError> {
        let aggregate = sqlx::query(AGGREGATE_SQL).fetch_optional(pool).await?;
        let (volume, liquidity, active_pairs) = match aggregate {
            Some(row) => (
                row.try_get::<f64, _>("direct_volume")? / MICRO_UNITS,
                row.try_get::<f64, _>("liquidity")? / MICRO_UNITS,
                row.try_get::<i64, _>("active_pairs")?,
            ),
            None => (0.0, 0.0, 0),
        };

        let top_pair = match sqlx::query(TOP_PAIR_SQL).fetch_optional(pool).await? {
            Some(row) => {
                let start: String = row.try_get("asset_start_hex")?;
                let end: String = row.try_get("asset_end_hex")?;
                Some(pair_display_name(&start, &end))
            }
            None => None,
        };

        let participants: i64 = sqlx::query(PARTICIPANTS_SQL)
            .fetch_one(pool)
            .await?
            .try_get("participant_count")?;

        let volume = volume.max(0.0);
        let active = participants.min(active_pairs.saturating_mul(ACTIVE_PER_PAIR)).max(0);
        let private_volume = volume * MVAS_VOLUME_SHARE;

        Ok(TradingData {
            trading_pair_count: active_pairs.max(0) as u32,
            volume_24h_usd: volume,
            top_pair,
            tvl_dex_usd: liquidity.max(0.0),
            participants_total: participants.max(0) as u64,
            participants_active_24h: active as u64,
            mvas_percentage: MVAS_VOLUME_SHARE * 100.0,
            private_volume_24h_usd: private_volume,
        })
    }
}

#[async_trait]
impl TradingDataSource for PindexerClient {
    async fn fetch_trading_data(&self) -> Result<TradingFetch, FetchError> {
        match &self.pool {
            None => Ok(TradingFetch::Disabled),
            Some(pool) => Ok(TradingFetch::Data(self.query_trading_data(pool).await?)),
        }
    }
}
