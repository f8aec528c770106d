//! Node and cache configuration.
//!
//! Loaded from a JSON file at startup. Only the settings consumed by the
//! cross-site state transfer are modelled here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_NUM_SEGMENTS: u32 = 256;
pub const DEFAULT_CHUNK_SIZE: i32 = 512;
pub const DEFAULT_STATE_TRANSFER_TIMEOUT_MS: u64 = 240_000;
pub const DEFAULT_REPLICATION_TIMEOUT_MS: u64 = 10_000;

/// Top-level configuration for one node.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeConfig {
    #[serde(default)]
    pub caches: Vec<CacheConfiguration>,
    /// Bridge endpoint for each remote site, used by the HTTP transport.
    #[serde(default)]
    pub sites: HashMap<String, SocketAddr>,
    /// Name of the site this node belongs to.
    #[serde(default)]
    pub local_site: Option<String>,
}

impl NodeConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: NodeConfig = serde_json::from_str(&raw)?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfiguration {
    pub name: String,
    #[serde(default)]
    pub transactional: bool,
    #[serde(default = "default_num_segments")]
    pub num_segments: u32,
    #[serde(default)]
    pub state_transfer: StateTransferConfiguration,
    #[serde(default)]
    pub backups: Vec<BackupConfiguration>,
}

impl CacheConfiguration {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            transactional: false,
            num_segments: DEFAULT_NUM_SEGMENTS,
            state_transfer: StateTransferConfiguration::default(),
            backups: Vec::new(),
        }
    }

    /// Looks up the backup configured for `site`.
    pub fn backup_for_site(&self, site: &str) -> Option<&BackupConfiguration> {
        self.backups.iter().find(|backup| backup.site == site)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransferConfiguration {
    /// Entries per chunk. Non-positive values mean "no limit".
    #[serde(default = "default_chunk_size")]
    pub chunk_size: i32,
    #[serde(default = "default_state_transfer_timeout")]
    pub timeout_ms: u64,
}

impl StateTransferConfiguration {
    /// Chunk size actually used by outbound tasks; never zero.
    pub fn effective_chunk_size(&self) -> usize {
        if self.chunk_size > 0 {
            self.chunk_size as usize
        } else {
            usize::MAX
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for StateTransferConfiguration {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout_ms: DEFAULT_STATE_TRANSFER_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BackupStrategy {
    Sync,
    Async,
}

/// One remote site receiving replicated data for a cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfiguration {
    pub site: String,
    #[serde(default = "default_strategy")]
    pub strategy: BackupStrategy,
    #[serde(default = "default_replication_timeout")]
    pub replication_timeout_ms: u64,
}

impl BackupConfiguration {
    pub fn new(site: &str, strategy: BackupStrategy, replication_timeout_ms: u64) -> Self {
        Self {
            site: site.to_string(),
            strategy,
            replication_timeout_ms,
        }
    }
}

fn default_num_segments() -> u32 {
    DEFAULT_NUM_SEGMENTS
}

fn default_chunk_size() -> i32 {
    DEFAULT_CHUNK_SIZE
}

fn default_state_transfer_timeout() -> u64 {
    DEFAULT_STATE_TRANSFER_TIMEOUT_MS
}

fn default_strategy() -> BackupStrategy {
    BackupStrategy::Sync
}

fn default_replication_timeout() -> u64 {
    DEFAULT_REPLICATION_TIMEOUT_MS
}
