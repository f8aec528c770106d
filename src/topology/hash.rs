use super::types::{Address, SegmentId};

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

/// Segment ownership resolver consumed by the state transfer.
pub trait ConsistentHash: Send + Sync {
    fn num_segments(&self) -> u32;

    /// Segment a key hashes to.
    fn segment_of(&self, key: &str) -> SegmentId;

    /// Segments for which `owner` is listed as an owner.
    fn segments_for_owner(&self, owner: &Address) -> BTreeSet<SegmentId>;
}

/// Hash-modulo segment assignment over a fixed member list.
///
/// Members are sorted so every node derives the same assignment. Segment `s`
/// is owned by `members[s % n]` and backed up by the next member.
pub struct ModuloConsistentHash {
    num_segments: u32,
    num_owners: usize,
    members: Vec<Address>,
}

impl ModuloConsistentHash {
    pub fn new(num_segments: u32, num_owners: usize, mut members: Vec<Address>) -> Self {
        members.sort();
        members.dedup();
        Self {
            num_segments: num_segments.max(1),
            num_owners: num_owners.max(1),
            members,
        }
    }

    pub fn owners(&self, segment: SegmentId) -> Vec<Address> {
        if self.members.is_empty() {
            return vec![];
        }
        let count = self.num_owners.min(self.members.len());
        (0..count)
            .map(|offset| {
                let idx = (segment as usize + offset) % self.members.len();
                self.members[idx].clone()
            })
            .collect()
    }
}

impl ConsistentHash for ModuloConsistentHash {
    fn num_segments(&self) -> u32 {
        self.num_segments
    }

    fn segment_of(&self, key: &str) -> SegmentId {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let hash = hasher.finish() as u32;
        hash % self.num_segments
    }

    fn segments_for_owner(&self, owner: &Address) -> BTreeSet<SegmentId> {
        (0..self.num_segments)
            .filter(|&segment| self.owners(segment).contains(owner))
            .collect()
    }
}
