use crate::utils::{deserialize_string_to_u64, is_syncing_from_distance, parse_field, parse_uint};
use crate::{BeaconClient, BeaconError, BeaconHttpClient, ChainHead, ChainHeadSource};
use async_trait::async_trait;
use serde::de::IgnoredAny;
use serde::Deserialize;

/// Slots per epoch on every public network
pub const SLOTS_PER_EPOCH: u64 = 32;

/// Beacon node implementation for the standard Beacon API (Lighthouse,
/// Teku, Nimbus, Prysm and recent Lodestar releases)
pub struct StandardBeaconClient {
    api: BeaconHttpClient,
}

#[derive(Deserialize)]
struct ApiResult<T> {
    data: T,
}

#[derive(Deserialize)]
struct VersionData {
    version: String,
}

#[derive(Deserialize)]
struct GenesisData {
    #[serde(deserialize_with = "deserialize_string_to_u64")]
    genesis_time: u64,
}

#[derive(Deserialize)]
struct PeerCountData {
    #[serde(deserialize_with = "deserialize_string_to_u64")]
    connected: u64,
}

#[derive(Deserialize)]
struct SyncingData {
    #[serde(default)]
    sync_distance: String,
}

#[derive(Deserialize)]
struct HeaderData {
    root: String,
    header: SignedHeader,
}

#[derive(Deserialize)]
struct SignedHeader {
    message: HeaderMessage,
}

#[derive(Deserialize)]
struct HeaderMessage {
    #[serde(default)]
    slot: String,
}

#[derive(Deserialize)]
struct FinalityCheckpoints {
    finalized: Checkpoint,
    current_justified: Checkpoint,
}

#[derive(Deserialize)]
struct Checkpoint {
    epoch: String,
    root: String,
}

impl StandardBeaconClient {
    pub fn new(api: BeaconHttpClient) -> Self {
        Self { api }
    }

    async fn head_header(&self) -> Result<HeaderData, BeaconError> {
        let result: ApiResult<HeaderData> = self.api.get("eth/v1/beacon/headers/head").await?;
        Ok(result.data)
    }

    async fn finality_checkpoints(&self) -> Result<FinalityCheckpoints, BeaconError> {
        let result: ApiResult<FinalityCheckpoints> = self
            .api
            .get("eth/v1/beacon/states/head/finality_checkpoints")
            .await?;
        Ok(result.data)
    }
}

fn checkpoint_slot(field: &'static str, checkpoint: &Checkpoint) -> Result<u64, BeaconError> {
    let epoch = parse_field(field, &checkpoint.epoch)?;
    Ok(epoch.saturating_mul(SLOTS_PER_EPOCH))
}

#[async_trait]
impl BeaconClient for StandardBeaconClient {
    async fn version(&self) -> Result<String, BeaconError> {
        let result: ApiResult<VersionData> = self.api.get("eth/v1/node/version").await?;
        Ok(result.data.version)
    }

    async fn genesis_time(&self) -> Result<u64, BeaconError> {
        let result: ApiResult<GenesisData> = self.api.get("eth/v1/beacon/genesis").await?;
        Ok(result.data.genesis_time)
    }

    async fn peer_count(&self) -> Result<u64, BeaconError> {
        let result: ApiResult<PeerCountData> = self.api.get("eth/v1/node/peer_count").await?;
        Ok(result.data.connected)
    }

    async fn attestations_in_pool_count(&self) -> Result<u64, BeaconError> {
        let result: ApiResult<Vec<IgnoredAny>> =
            self.api.get("eth/v1/beacon/pool/attestations").await?;
        Ok(result.data.len() as u64)
    }

    async fn is_syncing(&self) -> Result<bool, BeaconError> {
        let result: ApiResult<SyncingData> = self.api.get("eth/v1/node/syncing").await?;
        Ok(is_syncing_from_distance(&result.data.sync_distance))
    }
}

#[async_trait]
impl ChainHeadSource for StandardBeaconClient {
    async fn chain_head(&self) -> Result<ChainHead, BeaconError> {
        let header = self.head_header().await?;

        let Ok(head_slot) = parse_uint(&header.header.message.slot) else {
            return Ok(ChainHead::pre_genesis());
        };

        let checkpoints = self.finality_checkpoints().await?;

        Ok(ChainHead {
            head_slot,
            head_block_root: header.root,
            finalized_slot: checkpoint_slot("finalized_epoch", &checkpoints.finalized)?,
            finalized_block_root: checkpoints.finalized.root,
            justified_slot: checkpoint_slot("justified_epoch", &checkpoints.current_justified)?,
            justified_block_root: checkpoints.current_justified.root,
        })
    }
}
