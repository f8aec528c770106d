use super::types::{now_ms, CacheEntry};
use super::{DataContainer, EntryIter};

use dashmap::DashMap;

/// Live entries held in memory, keyed by cache key.
#[derive(Default)]
pub struct InMemoryDataContainer {
    entries: DashMap<String, CacheEntry>,
}

impl InMemoryDataContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, entry: CacheEntry) {
        self.entries.insert(entry.key.clone(), entry);
    }

    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, key: &str) -> Option<CacheEntry> {
        self.entries.remove(key).map(|(_, entry)| entry)
    }
}

impl DataContainer for InMemoryDataContainer {
    /// Snapshot of the non-expired entries.
    ///
    /// Entries are copied out so no shard lock outlives this call.
    fn entries(&self) -> EntryIter {
        let now = now_ms();
        let snapshot: Vec<CacheEntry> = self
            .entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .map(|entry| entry.value().clone())
            .collect();
        Box::new(snapshot.into_iter())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
