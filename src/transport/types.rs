use crate::config::{BackupConfiguration, BackupStrategy};

use std::time::Duration;

/// Connection parameters for one remote site, resolved once per transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupTarget {
    pub site: String,
    pub sync: bool,
    pub timeout: Duration,
}

impl BackupTarget {
    /// Builds a target from configuration. A zero replication timeout falls
    /// back to `default_timeout`.
    pub fn from_config(backup: &BackupConfiguration, default_timeout: Duration) -> Self {
        let timeout = if backup.replication_timeout_ms == 0 {
            default_timeout
        } else {
            Duration::from_millis(backup.replication_timeout_ms)
        };

        Self {
            site: backup.site.clone(),
            sync: backup.strategy == BackupStrategy::Sync,
            timeout,
        }
    }
}
