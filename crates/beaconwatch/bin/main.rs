use beaconwatch::{BeaconHttpClient, LodestarClient, StandardBeaconClient, StatsServer};
use clap::{Parser, ValueEnum};
use std::time::Duration;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ClientKind {
    /// Lodestar specific REST API
    Lodestar,
    /// Standard eth/v1 Beacon API
    Standard,
}

#[derive(Parser)]
#[command(name = "beaconwatch")]
#[command(about = "Beacon node monitoring agent", long_about = None)]
struct Cli {
    /// Beacon node implementation
    #[arg(long, value_enum)]
    client: ClientKind,

    /// Base URL of the beacon node API
    #[arg(long)]
    beacon_url: String,

    /// REST server bind address
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// RPC server bind address
    #[arg(long, default_value = "127.0.0.1:3001")]
    rpc_addr: String,

    /// Node name for metrics labels (defaults to the host of beacon_url)
    #[arg(long)]
    nodename: Option<String>,

    /// How often to poll the chain head, in milliseconds
    #[arg(long, default_value_t = 1000)]
    head_interval_ms: u64,

    /// How often to collect the node status, in seconds
    #[arg(long, default_value_t = 12)]
    status_interval_secs: u64,

    /// Timeout of a single request to the beacon node, in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();

    let beacon_url = url::Url::parse(&cli.beacon_url)
        .map_err(|e| eyre::eyre!("Invalid beacon url {}: {}", cli.beacon_url, e))?;

    // Local nodes get no nodename label unless one is given
    let nodename = cli.nodename.or_else(|| match beacon_url.host_str() {
        Some("localhost") | Some("127.0.0.1") | None => None,
        Some(host) => Some(host.to_string()),
    });

    tracing::info!(
        "Starting beaconwatch for {:?} node at {} with nodename {:?}",
        cli.client,
        cli.beacon_url,
        nodename,
    );

    let api = BeaconHttpClient::with_timeout(
        cli.beacon_url.clone(),
        Duration::from_secs(cli.timeout_secs),
    )?;

    let server = match cli.client {
        ClientKind::Lodestar => StatsServer::new(LodestarClient::new(api), nodename)?,
        ClientKind::Standard => StatsServer::new(StandardBeaconClient::new(api), nodename)?,
    }
    .with_head_interval(Duration::from_millis(cli.head_interval_ms))
    .with_status_interval(Duration::from_secs(cli.status_interval_secs));

    // Start RPC server in background
    let rpc_addr = cli.rpc_addr.parse()?;
    let (_rpc_handle, _rpc_local_addr) =
        beaconwatch::rpc::start_rpc_server(rpc_addr, server.cached_status(), server.cached_head())
            .await?;

    // Start REST server
    server.serve(&cli.addr).await?;

    Ok(())
}
