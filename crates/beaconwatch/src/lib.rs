use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

// Re-export the data model from beaconwatch-api
pub use beaconwatch_api::{ChainHead, NodeStatus};

/// Core trait for querying a beacon node, one implementation per node type
#[async_trait]
pub trait BeaconClient: ChainHeadSource + 'static {
    /// Free-form version string of the node software
    async fn version(&self) -> Result<String, BeaconError>;

    /// Genesis time in unix seconds
    async fn genesis_time(&self) -> Result<u64, BeaconError>;

    /// Number of currently connected peers
    async fn peer_count(&self) -> Result<u64, BeaconError>;

    /// Number of attestations in the pool, [`BeaconError::NotImplemented`]
    /// for nodes without such an endpoint
    async fn attestations_in_pool_count(&self) -> Result<u64, BeaconError>;

    /// Whether the node is still syncing
    async fn is_syncing(&self) -> Result<bool, BeaconError>;

    /// Stream of chain head changes, polled every `interval`
    fn subscribe_chain_heads(self: Arc<Self>, interval: Duration) -> ChainHeadSubscription {
        ChainHeadPoller::new(self, interval).start()
    }
}

pub mod error;
pub mod http;
pub mod lodestar;
pub mod metrics;
pub mod polling;
pub mod rpc;
pub mod server;
pub mod standard;
mod utils;

pub use error::BeaconError;
pub use http::BeaconHttpClient;
pub use lodestar::LodestarClient;
pub use polling::{ChainHeadPoller, ChainHeadSource, ChainHeadSubscription};
pub use server::StatsServer;
pub use standard::StandardBeaconClient;
