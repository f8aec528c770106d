use serde::{Deserialize, Serialize};

/// Per-entry bookkeeping carried along with the value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EntryMetadata {
    pub version: u64,
    /// Creation timestamp in milliseconds.
    pub created_at: u64,
    pub lifespan_ms: Option<u64>,
}

/// One key/value pair as transferred to a backup site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    /// The serialized JSON string of the value.
    pub value_json: String,
    pub metadata: EntryMetadata,
}

impl CacheEntry {
    pub fn new(key: &str, value_json: &str) -> Self {
        Self {
            key: key.to_string(),
            value_json: value_json.to_string(),
            metadata: EntryMetadata {
                version: 1,
                created_at: now_ms(),
                lifespan_ms: None,
            },
        }
    }

    /// True once the lifespan has elapsed.
    pub fn is_expired(&self, now: u64) -> bool {
        match self.metadata.lifespan_ms {
            Some(lifespan) => now >= self.metadata.created_at.saturating_add(lifespan),
            None => false,
        }
    }
}

/// Helper to get the current system time in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
