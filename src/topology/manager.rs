use super::types::CacheTopology;

use dashmap::DashMap;

/// Holds the latest topology installed for each cache on this node.
#[derive(Default)]
pub struct LocalTopologyManager {
    topologies: DashMap<String, CacheTopology>,
}

impl LocalTopologyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the topology of `cache_name`. Older topology ids are ignored.
    pub fn install(&self, cache_name: &str, topology: CacheTopology) {
        let mut slot = self
            .topologies
            .entry(cache_name.to_string())
            .or_insert_with(|| topology.clone());

        if topology.topology_id >= slot.topology_id {
            tracing::debug!(
                "Installing topology {} for cache {}",
                topology.topology_id,
                cache_name
            );
            *slot = topology;
        }
    }

    pub fn cache_topology(&self, cache_name: &str) -> Option<CacheTopology> {
        self.topologies
            .get(cache_name)
            .map(|entry| entry.value().clone())
    }
}
