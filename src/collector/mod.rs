//! # Data collection and fallback reconciliation
//!
//! One collection tick works like this:
//!
//! ```text
//! tick
//!   ├─ rpc::fetch_network_state()      (primary, concurrent)
//!   ├─ indexer::fetch_trading_data()   (auxiliary, concurrent)
//!   ↓
//! reconciler::reconcile()  ← estimator fills whatever is missing
//!   ↓
//! SnapshotStore::publish() (atomic replace)
//! ```
//!
//! Failure of either source never escapes a tick: it only changes the
//! provenance of the affected fields. Block height and epoch are never
//! fabricated; when the primary source fails they are carried over from
//! the previous snapshot and the tick is marked degraded.
//!
//! ## Module Organization
//!
//! - `snapshot` - Snapshot value, field identifiers, provenance map
//! - `rpc` - Primary source client (network RPC)
//! - `indexer` - Auxiliary source client (pindexer Postgres)
//! - `estimator` - Deterministic fallback estimates
//! - `reconciler` - Merge of live data and estimates into one snapshot
//! - `engine` - Tick driver with per-source timeouts

pub mod engine;
pub mod estimator;
pub mod indexer;
pub mod reconciler;
pub mod rpc;
pub mod snapshot;

pub use engine::Collector;
pub use estimator::{DriftEstimator, EstimateStrategy, FallbackEstimate};
pub use indexer::{PindexerClient, TradingData, TradingDataSource, TradingFetch};
pub use reconciler::reconcile;
pub use rpc::{NetworkState, NetworkStateSource, RpcClient};
pub use snapshot::{Field, Provenance, ProvenanceMap, Snapshot};

/// Transient failure of a single source within one collection tick.
///
/// Scoped to the tick that observed it; the next tick retries from
/// scratch. Distinct from the auxiliary source's permanent `Disabled`
/// state, which is not an error at all.
#[derive(Debug)]
pub enum FetchError {
    /// Network-level failure (connect, TLS, non-success status)
    Transport(String),
    /// Response arrived but could not be interpreted
    Malformed(String),
    /// The source did not answer within the tick's fetch timeout
    Timeout,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "transport error: {}", msg),
            FetchError::Malformed(msg) => write!(f, "malformed response: {}", msg),
            FetchError::Timeout => write!(f, "fetch timed out"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_decode() {
            FetchError::Malformed(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

impl From<sqlx::Error> for FetchError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                FetchError::Malformed(e.to_string())
            }
            other => FetchError::Transport(other.to_string()),
        }
    }
}
