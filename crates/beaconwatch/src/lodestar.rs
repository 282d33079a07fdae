use crate::utils::{is_syncing_from_distance, RawChainHead};
use crate::{BeaconClient, BeaconError, BeaconHttpClient, ChainHead, ChainHeadSource};
use async_trait::async_trait;
use serde::de::IgnoredAny;
use serde::Deserialize;

/// Lodestar beacon node implementation (uses the Lodestar REST API)
pub struct LodestarClient {
    api: BeaconHttpClient,
}

#[derive(Deserialize)]
struct ApiResult<T> {
    data: T,
}

#[derive(Deserialize)]
struct VersionData {
    #[serde(default)]
    version: String,
}

#[derive(Deserialize)]
struct SyncingData {
    #[serde(default)]
    sync_distance: String,
}

#[derive(Deserialize)]
struct HeadResult {
    #[serde(default)]
    head_slot: String,
    #[serde(default)]
    head_block_root: String,
    #[serde(default)]
    finalized_slot: String,
    #[serde(default)]
    finalized_block_root: String,
    #[serde(default)]
    justified_slot: String,
    #[serde(default)]
    justified_block_root: String,
}

impl LodestarClient {
    pub fn new(api: BeaconHttpClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl BeaconClient for LodestarClient {
    async fn version(&self) -> Result<String, BeaconError> {
        let result: ApiResult<VersionData> = self.api.get("v1/node/version").await?;
        Ok(result.data.version)
    }

    async fn genesis_time(&self) -> Result<u64, BeaconError> {
        self.api.get("lodestar/genesis_time").await
    }

    async fn peer_count(&self) -> Result<u64, BeaconError> {
        // Only the length of the peer list matters.
        let result: ApiResult<Vec<IgnoredAny>> = self.api.get("v1/node/peers").await?;
        Ok(result.data.len() as u64)
    }

    async fn attestations_in_pool_count(&self) -> Result<u64, BeaconError> {
        Err(BeaconError::NotImplemented)
    }

    async fn is_syncing(&self) -> Result<bool, BeaconError> {
        let result: ApiResult<SyncingData> = self.api.get("v1/node/syncing").await?;
        Ok(is_syncing_from_distance(&result.data.sync_distance))
    }
}

#[async_trait]
impl ChainHeadSource for LodestarClient {
    async fn chain_head(&self) -> Result<ChainHead, BeaconError> {
        let head: HeadResult = self.api.get("lodestar/head").await?;

        RawChainHead {
            head_slot: &head.head_slot,
            head_block_root: &head.head_block_root,
            finalized_slot: &head.finalized_slot,
            finalized_block_root: &head.finalized_block_root,
            justified_slot: &head.justified_slot,
            justified_block_root: &head.justified_block_root,
        }
        .parse()
    }
}
