use super::types::CacheEntry;
use super::{CacheStore, EntryIter};
use crate::error::XSiteResult;

use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Store kept in process memory, ordered by key.
///
/// Stands in for a real persistent store wherever one is not configured.
#[derive(Default)]
pub struct InMemoryCacheStore {
    entries: RwLock<BTreeMap<String, CacheEntry>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&self, entry: CacheEntry) {
        self.entries.write().insert(entry.key.clone(), entry);
    }

    pub fn delete(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    pub fn size(&self) -> usize {
        self.entries.read().len()
    }
}

impl CacheStore for InMemoryCacheStore {
    fn load_all(&self) -> XSiteResult<EntryIter> {
        let snapshot: Vec<CacheEntry> = self.entries.read().values().cloned().collect();
        Ok(Box::new(snapshot.into_iter()))
    }
}
