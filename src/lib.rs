//! # penumbra-pulse
//!
//! Analytics collector for the Penumbra network. On a fixed cadence it
//! samples the network RPC (block height, epoch, staking) and, when
//! configured, the pindexer trading database (pairs, volumes, LQT
//! participants). Whatever the indexer cannot supply is filled in by a
//! deterministic fallback estimator, and every field of the resulting
//! snapshot is tagged with its provenance (live vs estimated).
//!
//! Two independent consumers read the published snapshot:
//! - a Prometheus `/metrics` + `/health` endpoint (scrape-driven), and
//! - a Discord digest pushed on its own, much slower cadence.
//!
//! ## Module Organization
//!
//! - `config` - Environment-driven configuration with validation
//! - `collector` - Sources, estimator, reconciler, and the tick driver
//! - `store` - Atomic single-writer/multi-reader snapshot slot
//! - `metrics` - Prometheus text exposition of the current snapshot
//! - `server` - HTTP surface (`GET /metrics`, `GET /health`)
//! - `digest` - Digest formatting and its scheduler loop
//! - `notify` - Webhook delivery with a single bounded retry

pub mod collector;
pub mod config;
pub mod digest;
pub mod metrics;
pub mod notify;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use collector::engine::Collector;
pub use collector::estimator::{DriftEstimator, EstimateStrategy, FallbackEstimate};
pub use collector::indexer::{PindexerClient, TradingData, TradingDataSource, TradingFetch};
pub use collector::reconciler::reconcile;
pub use collector::rpc::{NetworkState, NetworkStateSource, RpcClient};
pub use collector::snapshot::{Field, Provenance, ProvenanceMap, Snapshot};
pub use collector::FetchError;
pub use config::{Config, ConfigError};
pub use notify::{DeliveryError, DiscordNotifier, NotificationSink};
pub use store::{Current, SnapshotStore};
