use crate::{ChainHead, NodeStatus};
use metrics_derive::Metrics;

#[derive(Metrics, Clone)]
#[metrics(scope = "beaconwatch")]
pub struct BeaconMetrics {
    /// Number of peers connected to the beacon node
    #[metric(describe = "Total number of connected peers")]
    pub peers_total: metrics::Gauge,

    /// Is the node syncing
    #[metric(describe = "Whether the node is currently syncing (1 = syncing, 0 = not syncing)")]
    pub is_syncing: metrics::Gauge,

    #[metric(describe = "Number of attestations in the node pool")]
    pub attestations_in_pool: metrics::Gauge,

    #[metric(describe = "Genesis time of the chain in unix seconds")]
    pub genesis_time: metrics::Gauge,

    #[metric(describe = "Slot of the current head block")]
    pub head_slot: metrics::Gauge,

    #[metric(describe = "Slot of the latest finalized checkpoint")]
    pub finalized_slot: metrics::Gauge,

    #[metric(describe = "Slot of the latest justified checkpoint")]
    pub justified_slot: metrics::Gauge,

    /// Failed status collections
    #[metric(describe = "Number of failed node status collections")]
    pub status_failures: metrics::Counter,
}

impl BeaconMetrics {
    pub fn update_status(&self, status: &NodeStatus) {
        self.peers_total.set(status.peers as f64);
        self.is_syncing
            .set(if status.is_syncing { 1.0 } else { 0.0 });
        self.genesis_time.set(status.genesis_time as f64);
        if let Some(count) = status.attestations_in_pool {
            self.attestations_in_pool.set(count as f64);
        }
    }

    pub fn update_chain_head(&self, head: &ChainHead) {
        self.head_slot.set(head.head_slot as f64);
        self.finalized_slot.set(head.finalized_slot as f64);
        self.justified_slot.set(head.justified_slot as f64);
    }
}
