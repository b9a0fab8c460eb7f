//! Service configuration from environment variables
//!
//! Required variables fail startup when missing; everything else has a
//! default. Intervals are plain seconds except the digest cadence,
//! which accepts fractional hours.

use std::env;
use std::time::Duration;

/// Configuration for the analytics service
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Penumbra RPC endpoint (CometBFT-style HTTP interface)
    pub rpc_endpoint: String,

    /// Optional pindexer Postgres connection string.
    /// When unset the auxiliary source is permanently Disabled.
    pub indexer_url: Option<String>,

    /// Optional path to a CA certificate for the indexer TLS connection
    pub indexer_ca_cert: Option<String>,

    /// Discord webhook URL for digest delivery
    pub discord_webhook_url: String,

    /// Port for the metrics/health HTTP server
    pub metrics_port: u16,

    /// Collection tick interval
    pub update_interval: Duration,

    /// Digest tick interval
    pub digest_interval: Duration,

    /// Per-source fetch timeout within one collection tick
    pub fetch_timeout: Duration,

    /// USD price assumption for UM when converting staked supply.
    /// Defaults to 0 (staking TVL reported as 0 rather than invented).
    pub um_price_usd: f64,

    /// Blocks per epoch, used to derive the epoch from block height
    pub blocks_per_epoch: u64,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `PENUMBRA_RPC_ENDPOINT` (required)
    /// - `DISCORD_WEBHOOK_URL` (required)
    /// - `PENUMBRA_INDEXER_URL` (optional, Postgres connection string)
    /// - `INDEXER_CA_CERT` (optional, CA certificate path for indexer TLS)
    /// - `METRICS_PORT` (default: 8081)
    /// - `UPDATE_INTERVAL_SECONDS` (default: 30)
    /// - `DISCORD_INTERVAL_HOURS` (default: 3, fractional allowed)
    /// - `FETCH_TIMEOUT_SECONDS` (default: 10)
    /// - `UM_PRICE_USD` (default: 0)
    /// - `PENUMBRA_BLOCKS_PER_EPOCH` (default: 11520)
    pub fn from_env() -> Result<Self, ConfigError> {
        let rpc_endpoint = env::var("PENUMBRA_RPC_ENDPOINT")
            .map_err(|_| ConfigError::MissingVariable("PENUMBRA_RPC_ENDPOINT".to_string()))?;

        if !rpc_endpoint.starts_with("http://") && !rpc_endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "PENUMBRA_RPC_ENDPOINT must start with http:// or https://".to_string(),
            ));
        }

        let discord_webhook_url = env::var("DISCORD_WEBHOOK_URL")
            .map_err(|_| ConfigError::MissingVariable("DISCORD_WEBHOOK_URL".to_string()))?;

        if !discord_webhook_url.starts_with("http://")
            && !discord_webhook_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue(
                "DISCORD_WEBHOOK_URL must start with http:// or https://".to_string(),
            ));
        }

        let indexer_url = env::var("PENUMBRA_INDEXER_URL")
            .ok()
            .filter(|s| !s.is_empty());

        let indexer_ca_cert = env::var("INDEXER_CA_CERT").ok().filter(|s| !s.is_empty());

        let metrics_port = env::var("METRICS_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8081);

        let update_secs: u64 = env::var("UPDATE_INTERVAL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);
        if update_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "UPDATE_INTERVAL_SECONDS must be positive".to_string(),
            ));
        }

        let digest_hours: f64 = env::var("DISCORD_INTERVAL_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3.0);
        if !(digest_hours > 0.0) {
            return Err(ConfigError::InvalidValue(
                "DISCORD_INTERVAL_HOURS must be positive".to_string(),
            ));
        }

        let fetch_timeout_secs: u64 = env::var("FETCH_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);
        if fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "FETCH_TIMEOUT_SECONDS must be positive".to_string(),
            ));
        }

        let um_price_usd: f64 = env::var("UM_PRICE_USD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.0);
        if um_price_usd < 0.0 {
            return Err(ConfigError::InvalidValue(
                "UM_PRICE_USD cannot be negative".to_string(),
            ));
        }

        let blocks_per_epoch: u64 = env::var("PENUMBRA_BLOCKS_PER_EPOCH")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(11_520);
        if blocks_per_epoch == 0 {
            return Err(ConfigError::InvalidValue(
                "PENUMBRA_BLOCKS_PER_EPOCH must be positive".to_string(),
            ));
        }

        Ok(Self {
            rpc_endpoint: rpc_endpoint.trim_end_matches('/').to_string(),
            indexer_url,
            indexer_ca_cert,
            discord_webhook_url,
            metrics_port,
            update_interval: Duration::from_secs(update_secs),
            digest_interval: Duration::from_secs_f64(digest_hours * 3600.0),
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            um_price_usd,
            blocks_per_epoch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var mutation is process-global, so the whole lifecycle runs in
    // a single test to keep it race-free under the parallel runner.
    #[test]
    fn test_config_lifecycle() {
        // Test: missing required variable is rejected
        env::remove_var("PENUMBRA_RPC_ENDPOINT");
        env::remove_var("DISCORD_WEBHOOK_URL");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::MissingVariable(_))
        ));

        // Test: defaults apply once required variables are present
        env::set_var("PENUMBRA_RPC_ENDPOINT", "https://rpc.example.com/");
        env::set_var("DISCORD_WEBHOOK_URL", "https://discord.com/api/webhooks/1/x");
        env::remove_var("PENUMBRA_INDEXER_URL");
        env::remove_var("INDEXER_CA_CERT");
        env::remove_var("METRICS_PORT");
        env::remove_var("UPDATE_INTERVAL_SECONDS");
        env::remove_var("DISCORD_INTERVAL_HOURS");
        env::remove_var("FETCH_TIMEOUT_SECONDS");
        env::remove_var("UM_PRICE_USD");
        env::remove_var("PENUMBRA_BLOCKS_PER_EPOCH");

        let config = Config::from_env().unwrap();
        assert_eq!(config.rpc_endpoint, "https://rpc.example.com");
        assert!(config.indexer_url.is_none());
        assert!(config.indexer_ca_cert.is_none());
        assert_eq!(config.metrics_port, 8081);
        assert_eq!(config.update_interval, Duration::from_secs(30));
        assert_eq!(config.digest_interval, Duration::from_secs(3 * 3600));
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.um_price_usd, 0.0);
        assert_eq!(config.blocks_per_epoch, 11_520);

        // Test: custom values override defaults (fractional digest hours)
        env::set_var("PENUMBRA_INDEXER_URL", "postgres://pindexer/penumbra");
        env::set_var("INDEXER_CA_CERT", "/etc/ssl/pindexer-ca.pem");
        env::set_var("METRICS_PORT", "9100");
        env::set_var("UPDATE_INTERVAL_SECONDS", "15");
        env::set_var("DISCORD_INTERVAL_HOURS", "0.5");
        env::set_var("FETCH_TIMEOUT_SECONDS", "5");
        env::set_var("UM_PRICE_USD", "0.12");
        env::set_var("PENUMBRA_BLOCKS_PER_EPOCH", "8640");

        let config = Config::from_env().unwrap();
        assert_eq!(
            config.indexer_url.as_deref(),
            Some("postgres://pindexer/penumbra")
        );
        assert_eq!(
            config.indexer_ca_cert.as_deref(),
            Some("/etc/ssl/pindexer-ca.pem")
        );
        assert_eq!(config.metrics_port, 9100);
        assert_eq!(config.update_interval, Duration::from_secs(15));
        assert_eq!(config.digest_interval, Duration::from_secs(1800));
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.um_price_usd, 0.12);
        assert_eq!(config.blocks_per_epoch, 8640);

        // Test: invalid scheme rejected
        env::set_var("PENUMBRA_RPC_ENDPOINT", "ftp://rpc.example.com");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidValue(_))
        ));

        // Cleanup
        env::remove_var("PENUMBRA_RPC_ENDPOINT");
        env::remove_var("DISCORD_WEBHOOK_URL");
        env::remove_var("PENUMBRA_INDEXER_URL");
        env::remove_var("INDEXER_CA_CERT");
        env::remove_var("METRICS_PORT");
        env::remove_var("UPDATE_INTERVAL_SECONDS");
        env::remove_var("DISCORD_INTERVAL_HOURS");
        env::remove_var("FETCH_TIMEOUT_SECONDS");
        env::remove_var("UM_PRICE_USD");
        env::remove_var("PENUMBRA_BLOCKS_PER_EPOCH");
    }
}
