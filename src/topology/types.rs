use super::hash::ConsistentHash;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Segment identifier inside a cache's key space.
pub type SegmentId = u32;

/// Address of a node inside the local cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub String);

impl Address {
    /// Generates a random UUID v4-based address.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn named(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of the consistent-hash view of a cache.
///
/// `current_ch` stays `None` until the node has completed its join.
#[derive(Clone)]
pub struct CacheTopology {
    pub topology_id: u64,
    pub current_ch: Option<Arc<dyn ConsistentHash>>,
}

impl CacheTopology {
    pub fn new(topology_id: u64, current_ch: Arc<dyn ConsistentHash>) -> Self {
        Self {
            topology_id,
            current_ch: Some(current_ch),
        }
    }

    /// Topology announced before any consistent hash was received.
    pub fn pending(topology_id: u64) -> Self {
        Self {
            topology_id,
            current_ch: None,
        }
    }
}

impl fmt::Debug for CacheTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheTopology")
            .field("topology_id", &self.topology_id)
            .field(
                "num_segments",
                &self.current_ch.as_ref().map(|ch| ch.num_segments()),
            )
            .finish()
    }
}
