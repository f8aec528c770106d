//! Data Container Module
//!
//! Read-only sources of cache entries for the outbound state transfer.
//!
//! - **`DataContainer`**: the live in-memory entries of a cache.
//! - **`CacheStore`**: the optional persistent store behind the cache.
//!
//! Both hand out restartable sequences: every call begins a fresh traversal,
//! so a transfer never observes a half-consumed iterator from a previous run.

pub mod memory;
pub mod store;
pub mod types;

use crate::error::XSiteResult;
use types::CacheEntry;

/// Boxed, sendable entry sequence.
pub type EntryIter = Box<dyn Iterator<Item = CacheEntry> + Send>;

/// Live entries of one cache.
pub trait DataContainer: Send + Sync {
    fn entries(&self) -> EntryIter;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Persistent store backing one cache.
pub trait CacheStore: Send + Sync {
    fn load_all(&self) -> XSiteResult<EntryIter>;
}
