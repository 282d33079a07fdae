use crate::{
    metrics::BeaconMetrics, BeaconClient, BeaconError, ChainHead, ChainHeadSubscription, NodeStatus,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// One slot on mainnet
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(12);
pub const DEFAULT_HEAD_INTERVAL: Duration = Duration::from_secs(1);

const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Clone)]
struct AppState {
    client: Arc<dyn BeaconClient>,
    metrics: BeaconMetrics,
    cached_status: Arc<RwLock<Option<NodeStatus>>>,
    cached_head: Arc<RwLock<Option<ChainHead>>>,
}

impl AppState {
    fn new(client: Arc<dyn BeaconClient>, metrics: BeaconMetrics) -> Self {
        Self {
            client,
            metrics,
            cached_status: Arc::new(RwLock::new(None)),
            cached_head: Arc::new(RwLock::new(None)),
        }
    }
}

pub struct StatsServer {
    state: AppState,
    prometheus_handle: PrometheusHandle,
    status_interval: Duration,
    head_interval: Duration,
}

impl StatsServer {
    /// Create a server and install the global Prometheus recorder
    pub fn new(client: impl BeaconClient, nodename: Option<String>) -> eyre::Result<Self> {
        let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| eyre::eyre!("Failed to install Prometheus recorder: {}", e))?;

        Ok(Self::with_prometheus_handle(
            Arc::new(client),
            nodename,
            prometheus_handle,
        ))
    }

    pub fn with_prometheus_handle(
        client: Arc<dyn BeaconClient>,
        nodename: Option<String>,
        prometheus_handle: PrometheusHandle,
    ) -> Self {
        let metrics = if let Some(nodename) = nodename {
            BeaconMetrics::new_with_labels(&[("nodename", nodename)])
        } else {
            BeaconMetrics::default()
        };

        Self {
            state: AppState::new(client, metrics),
            prometheus_handle,
            status_interval: DEFAULT_STATUS_INTERVAL,
            head_interval: DEFAULT_HEAD_INTERVAL,
        }
    }

    pub fn with_status_interval(mut self, interval: Duration) -> Self {
        self.status_interval = interval.max(MIN_INTERVAL);
        self
    }

    pub fn with_head_interval(mut self, interval: Duration) -> Self {
        self.head_interval = interval.max(MIN_INTERVAL);
        self
    }

    pub fn cached_status(&self) -> Arc<RwLock<Option<NodeStatus>>> {
        self.state.cached_status.clone()
    }

    pub fn cached_head(&self) -> Arc<RwLock<Option<ChainHead>>> {
        self.state.cached_head.clone()
    }

    pub fn router(&self) -> Router {
        let prometheus_handle = self.prometheus_handle.clone();

        Router::new()
            .route("/status", get(status_handler))
            .route("/head", get(head_handler))
            .route("/metrics", get(move || metrics_handler(prometheus_handle)))
            .with_state(self.state.clone())
    }

    pub async fn serve(self, addr: &str) -> eyre::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Beaconwatch server listening on {}", addr);

        self.serve_with_shutdown(listener, shutdown_signal()).await
    }

    /// Serve on `listener` until `shutdown` resolves, then stop the head
    /// subscription and wait for its polling task to exit.
    pub async fn serve_with_shutdown<F>(
        self,
        listener: tokio::net::TcpListener,
        shutdown: F,
    ) -> eyre::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let status_task = tokio::spawn(Self::status_polling_loop(
            self.state.clone(),
            self.status_interval,
        ));

        let mut subscription = self
            .state
            .client
            .clone()
            .subscribe_chain_heads(self.head_interval);

        let server = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .into_future();

        let head_loop = async {
            Self::chain_head_loop(&self.state, &mut subscription).await;
            tracing::warn!("Chain head subscription ended");
            std::future::pending::<()>().await
        };

        let result = tokio::select! {
            result = server => result,
            _ = head_loop => Ok(()),
        };

        status_task.abort();
        subscription.shutdown().await;
        tracing::info!("Chain head subscription stopped");

        result?;
        Ok(())
    }

    async fn status_polling_loop(state: AppState, period: Duration) {
        let mut interval = tokio::time::interval(period);

        loop {
            interval.tick().await;

            match collect_status(state.client.as_ref()).await {
                Ok(status) => {
                    state.metrics.update_status(&status);
                    *state.cached_status.write().await = Some(status);
                }
                Err(e) => {
                    state.metrics.status_failures.increment(1);
                    tracing::error!("Failed to collect node status: {}", e);
                }
            }
        }
    }

    async fn chain_head_loop(state: &AppState, subscription: &mut ChainHeadSubscription) {
        while let Some(head) = subscription.recv().await {
            tracing::info!(
                head_slot = head.head_slot,
                finalized_slot = head.finalized_slot,
                justified_slot = head.justified_slot,
                "Chain head updated"
            );
            state.metrics.update_chain_head(&head);
            *state.cached_head.write().await = Some(head);
        }
    }
}

/// Query every scalar metric of the node. A node without an attestation
/// pool endpoint reports `None` for it; any other failure is returned.
pub async fn collect_status(client: &dyn BeaconClient) -> Result<NodeStatus, BeaconError> {
    let attestations_in_pool = match client.attestations_in_pool_count().await {
        Ok(count) => Some(count),
        Err(e) if e.is_not_implemented() => None,
        Err(e) => return Err(e),
    };

    Ok(NodeStatus {
        version: client.version().await?,
        genesis_time: client.genesis_time().await?,
        peers: client.peer_count().await?,
        attestations_in_pool,
        is_syncing: client.is_syncing().await?,
    })
}

async fn status_handler(State(state): State<AppState>) -> Result<Json<NodeStatus>, AppError> {
    let status = state
        .cached_status
        .read()
        .await
        .clone()
        .ok_or_else(|| eyre::eyre!("Status not yet available"))?;

    Ok(Json(status))
}

async fn head_handler(State(state): State<AppState>) -> Result<Json<ChainHead>, AppError> {
    let head = state
        .cached_head
        .read()
        .await
        .clone()
        .ok_or_else(|| eyre::eyre!("Chain head not yet available"))?;

    Ok(Json(head))
}

async fn metrics_handler(prometheus_handle: PrometheusHandle) -> String {
    prometheus_handle.render()
}

struct AppError(eyre::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error: {}", self.0),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<eyre::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
