//! Topology Module Tests
//!
//! ## Test Scopes
//! - **Consistent hash**: deterministic key hashing and owner assignment.
//! - **Topology manager**: installation ordering by topology id.

#[cfg(test)]
mod tests {
    use crate::topology::hash::{ConsistentHash, ModuloConsistentHash};
    use crate::topology::manager::LocalTopologyManager;
    use crate::topology::types::{Address, CacheTopology};
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn members(names: &[&str]) -> Vec<Address> {
        names.iter().map(|name| Address::named(name)).collect()
    }

    // ============================================================
    // CONSISTENT HASH TESTS
    // ============================================================

    #[test]
    fn test_segment_is_deterministic_and_in_range() {
        let ch = ModuloConsistentHash::new(64, 1, members(&["a"]));

        for i in 0..1000 {
            let key = format!("order_{}", i);
            let segment = ch.segment_of(&key);
            assert_eq!(segment, ch.segment_of(&key));
            assert!(segment < 64, "Segment {} should be < 64", segment);
        }
    }

    #[test]
    fn test_single_owner_segments_partition_the_key_space() {
        let ch = ModuloConsistentHash::new(16, 1, members(&["c", "a", "b"]));

        let mut all = BTreeSet::new();
        let mut total = 0;
        for name in ["a", "b", "c"] {
            let owned = ch.segments_for_owner(&Address::named(name));
            total += owned.len();
            all.extend(owned);
        }

        assert_eq!(total, 16, "Each segment must have exactly one owner");
        assert_eq!(all.len(), 16);
        // Sorted members: a owns 0, 3, 6, ...
        assert!(ch.segments_for_owner(&Address::named("a")).contains(&0));
        assert!(ch.segments_for_owner(&Address::named("b")).contains(&1));
    }

    #[test]
    fn test_backup_owners_extend_owned_segments() {
        let ch = ModuloConsistentHash::new(8, 2, members(&["a", "b"]));

        // With two members and two owners every node owns every segment.
        assert_eq!(ch.segments_for_owner(&Address::named("a")).len(), 8);
        assert_eq!(ch.owners(3).len(), 2);
    }

    #[test]
    fn test_non_member_owns_nothing() {
        let ch = ModuloConsistentHash::new(8, 1, members(&["a"]));
        assert!(ch.segments_for_owner(&Address::named("zz")).is_empty());
    }

    // ============================================================
    // TOPOLOGY MANAGER TESTS
    // ============================================================

    #[test]
    fn test_manager_keeps_newest_topology() {
        let manager = LocalTopologyManager::new();
        let ch = Arc::new(ModuloConsistentHash::new(4, 1, members(&["a"])));

        assert!(manager.cache_topology("orders").is_none());

        manager.install("orders", CacheTopology::pending(1));
        assert!(manager.cache_topology("orders").unwrap().current_ch.is_none());

        manager.install("orders", CacheTopology::new(3, ch.clone()));
        manager.install("orders", CacheTopology::pending(2));

        let topology = manager.cache_topology("orders").unwrap();
        assert_eq!(topology.topology_id, 3);
        assert!(topology.current_ch.is_some());
    }
}
