use beaconwatch_api::{BeaconWatchApiServer, ChainHead, NodeStatus};
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use tokio::sync::RwLock;

const NOT_AVAILABLE_CODE: i32 = 1;

/// Implementation of the Beaconwatch RPC server
pub struct BeaconWatchRpcServer {
    cached_status: Arc<RwLock<Option<NodeStatus>>>,
    cached_head: Arc<RwLock<Option<ChainHead>>>,
}

impl BeaconWatchRpcServer {
    pub fn new(
        cached_status: Arc<RwLock<Option<NodeStatus>>>,
        cached_head: Arc<RwLock<Option<ChainHead>>>,
    ) -> Self {
        Self {
            cached_status,
            cached_head,
        }
    }
}

fn not_available(what: &str) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(
        NOT_AVAILABLE_CODE,
        format!("{} not yet available", what),
        None::<()>,
    )
}

#[jsonrpsee::core::async_trait]
impl BeaconWatchApiServer for BeaconWatchRpcServer {
    async fn status(&self) -> Result<NodeStatus, ErrorObjectOwned> {
        self.cached_status
            .read()
            .await
            .clone()
            .ok_or_else(|| not_available("Status"))
    }

    async fn chain_head(&self) -> Result<ChainHead, ErrorObjectOwned> {
        self.cached_head
            .read()
            .await
            .clone()
            .ok_or_else(|| not_available("Chain head"))
    }
}

/// Start the RPC server
pub async fn start_rpc_server(
    addr: std::net::SocketAddr,
    cached_status: Arc<RwLock<Option<NodeStatus>>>,
    cached_head: Arc<RwLock<Option<ChainHead>>>,
) -> eyre::Result<(jsonrpsee::server::ServerHandle, std::net::SocketAddr)> {
    use jsonrpsee::server::Server;

    let server = Server::builder().build(addr).await?;
    let local_addr = server.local_addr()?;

    let rpc_server = BeaconWatchRpcServer::new(cached_status, cached_head);
    let handle = server.start(rpc_server.into_rpc());

    tracing::info!("Beaconwatch RPC server listening on {}", local_addr);

    Ok((handle, local_addr))
}
