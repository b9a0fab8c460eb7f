//! Primary source client
//!
//! Fetches authoritative network state from the Penumbra RPC (CometBFT
//! HTTP interface):
//! - `/status` for the latest block height
//! - `/validators` for total voting power (staked UM)
//! - `/blockchain` for recent per-block tx counts, extrapolated to 24h
//!
//! One call is all-or-nothing: if any sub-request fails the whole fetch
//! reports a `FetchError` and no partial state escapes. Monotonicity of
//! height/epoch is enforced by the reconciler, not here.

use super::FetchError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Micro-UM per UM
const MICRO_UM: f64 = 1_000_000.0;

/// Target block time used when extrapolating tx counts
const BLOCK_TIME_SECS: u64 = 6;

/// How many recent blocks to sample for the tx-rate extrapolation
const TX_SAMPLE_BLOCKS: u64 = 20;

/// The subset of [`Snapshot`](super::snapshot::Snapshot) fields
/// obtainable from the network RPC
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkState {
    pub block_height: u64,
    pub epoch: u64,
    pub tvl_staking_usd: f64,
    pub transactions_24h: u64,
}

/// Seam for the primary source, mockable in tests
#[async_trait]
pub trait NetworkStateSource: Send + Sync {
    async fn fetch_network_state(&self) -> Result<NetworkState, FetchError>;
}

// ---------------------------------------------------------------------
// CometBFT response shapes (only the fields we read)
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct StatusResponse {
    result: StatusResult,
}

#[derive(Debug, Deserialize)]
struct StatusResult {
    sync_info: SyncInfo,
}

#[derive(Debug, Deserialize)]
struct SyncInfo {
    latest_block_height: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValidatorsResponse {
    result: ValidatorsResult,
}

#[derive(Debug, Deserialize)]
struct ValidatorsResult {
    validators: Vec<ValidatorInfo>,
}

#[derive(Debug, Deserialize)]
struct ValidatorInfo {
    voting_power: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BlockchainResponse {
    result: BlockchainResult,
}

#[derive(Debug, Deserialize)]
struct BlockchainResult {
    block_metas: Vec<BlockMeta>,
}

#[derive(Debug, Deserialize)]
struct BlockMeta {
    num_txs: String,
}

// ---------------------------------------------------------------------
// Parse helpers (pure, unit-tested without I/O)
// ---------------------------------------------------------------------

pub(crate) fn parse_height(status: &StatusResponse) -> Result<u64, FetchError> {
    status
        .result
        .sync_info
        .latest_block_height
        .parse::<u64>()
        .map_err(|e| FetchError::Malformed(format!("latest_block_height: {}", e)))
}

/// Sum of validator voting power in micro-UM
pub(crate) fn total_voting_power(validators: &ValidatorsResponse) -> Result<u64, FetchError> {
    let mut total: u64 = 0;
    for v in &validators.result.validators {
        let power = v
            .voting_power
            .parse::<u64>()
            .map_err(|e| FetchError::Malformed(format!("voting_power: {}", e)))?;
        total = total.saturating_add(power);
    }
    Ok(total)
}

/// Extrapolate a 24h tx count from the sampled block window
pub(crate) fn extrapolate_tx_24h(blockchain: &BlockchainResponse) -> Result<u64, FetchError> {
    let metas = &blockchain.result.block_metas;
    if metas.is_empty() {
        return Ok(0);
    }
    let mut window_txs: u64 = 0;
    for meta in metas {
        let txs = meta
            .num_txs
            .parse::<u64>()
            .map_err(|e| FetchError::Malformed(format!("num_txs: {}", e)))?;
        window_txs = window_txs.saturating_add(txs);
    }
    let blocks_per_day = 86_400 / BLOCK_TIME_SECS;
    Ok(window_txs.saturating_mul(blocks_per_day) / metas.len() as u64)
}

// ---------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------

/// Primary source client over the network RPC
pub struct RpcClient {
    endpoint: String,
    blocks_per_epoch: u64,
    um_price_usd: f64,
    client: reqwest::Client,
}

impl RpcClient {
    /// Create a client against `endpoint` (trailing slash tolerated).
    ///
    /// The epoch is derived from block height via `blocks_per_epoch`;
    /// staked voting power converts to USD at `um_price_usd` (0 keeps
    /// staking TVL at zero instead of inventing a price).
    pub fn new(
        endpoint: &str,
        blocks_per_epoch: u64,
        um_price_usd: f64,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::from)?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            blocks_per_epoch,
            um_price_usd,
            client,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T, FetchError> {
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Transport(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl NetworkStateSource for RpcClient {
    async fn fetch_network_state(&self) -> Result<NetworkState, FetchError> {
        let status: StatusResponse = self.get_json(format!("{}/status", self.endpoint)).await?;
        let block_height = parse_height(&status)?;

        let validators: ValidatorsResponse = self
            .get_json(format!("{}/validators?per_page=300", self.endpoint))
            .await?;
        let staked_um = total_voting_power(&validators)? as f64 / MICRO_UM;

        let min_height = block_height.saturating_sub(TX_SAMPLE_BLOCKS.saturating_sub(1)).max(1);
        let blockchain: BlockchainResponse = self
            .get_json(format!(
                "{}/blockchain?minHeight={}&maxHeight={}",
                self.endpoint, min_height, block_height
            ))
            .await?;
        let transactions_24h = extrapolate_tx_24h(&blockchain)?;

        Ok(NetworkState {
            block_height,
            epoch: block_height / self.blocks_per_epoch,
            tvl_staking_usd: (staked_um * self.um_price_usd).max(0.0),
            transactions_24h,
        })
    }
}
