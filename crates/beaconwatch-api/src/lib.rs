use jsonrpsee::proc_macros::rpc;
use serde::{Deserialize, Serialize};

/// Root reported for every checkpoint before the node has a head.
pub const PRE_GENESIS_ROOT: &str = "0x0";

/// Consensus state of a beacon node at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainHead {
    pub head_slot: u64,
    pub head_block_root: String,
    pub finalized_slot: u64,
    pub finalized_block_root: String,
    pub justified_slot: u64,
    pub justified_block_root: String,
}

impl ChainHead {
    /// The head reported by a node that has not reached genesis yet:
    /// every slot is zero and every root is `0x0`.
    pub fn pre_genesis() -> Self {
        Self {
            head_slot: 0,
            head_block_root: PRE_GENESIS_ROOT.to_string(),
            finalized_slot: 0,
            finalized_block_root: PRE_GENESIS_ROOT.to_string(),
            justified_slot: 0,
            justified_block_root: PRE_GENESIS_ROOT.to_string(),
        }
    }

    pub fn is_pre_genesis(&self) -> bool {
        *self == Self::pre_genesis()
    }
}

impl Default for ChainHead {
    fn default() -> Self {
        Self::pre_genesis()
    }
}

/// Scalar node metrics collected from a beacon node
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct NodeStatus {
    pub version: String,
    pub genesis_time: u64,
    pub peers: u64,
    /// `None` when the node has no attestation pool endpoint
    pub attestations_in_pool: Option<u64>,
    pub is_syncing: bool,
}

/// JSON-RPC API for the collected beacon node state
#[rpc(server, client)]
pub trait BeaconWatchApi {
    /// Get the last collected node status
    #[method(name = "status")]
    async fn status(&self) -> Result<NodeStatus, jsonrpsee::types::ErrorObjectOwned>;

    /// Get the last observed chain head
    #[method(name = "chainHead")]
    async fn chain_head(&self) -> Result<ChainHead, jsonrpsee::types::ErrorObjectOwned>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chain_head_is_pre_genesis() {
        let head = ChainHead::default();
        assert_eq!(head.head_slot, 0);
        assert_eq!(head.finalized_slot, 0);
        assert_eq!(head.justified_slot, 0);
        assert_eq!(head.head_block_root, "0x0");
        assert_eq!(head.finalized_block_root, "0x0");
        assert_eq!(head.justified_block_root, "0x0");
        assert!(head.is_pre_genesis());
    }

    #[test]
    fn test_chain_head_differs_on_any_field() {
        let base = ChainHead::pre_genesis();

        let mut other = base.clone();
        other.justified_block_root = "0xabc".to_string();
        assert_ne!(base, other);
        assert!(!other.is_pre_genesis());

        let mut other = base.clone();
        other.finalized_slot = 1;
        assert_ne!(base, other);
    }

    #[test]
    fn test_node_status_json_shape() {
        let status = NodeStatus {
            version: "Lodestar/v1.0.0".to_string(),
            genesis_time: 1606824023,
            peers: 7,
            attestations_in_pool: None,
            is_syncing: true,
        };

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["peers"], 7);
        assert_eq!(value["attestations_in_pool"], serde_json::Value::Null);
        assert_eq!(value["is_syncing"], true);
    }
}
