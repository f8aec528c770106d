use super::task::OutboundTask;
use crate::topology::types::Address;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Unique identifier of one outbound transfer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TransferId(pub String);

impl TransferId {
    /// Generates a new random UUID v4-based TransferId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle of an outbound transfer.
///
/// `Created -> Running -> {Completed, Cancelled, Failed}`. Terminal states are final.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransferStatus {
    Created,
    Running,
    Completed,
    Cancelled,
    Failed { error: String },
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferStatus::Completed | TransferStatus::Cancelled | TransferStatus::Failed { .. }
        )
    }
}

/// Monitoring view of one transfer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferSummary {
    pub transfer_id: TransferId,
    pub site: String,
    pub cache_name: String,
    pub origin: Address,
    pub status: TransferStatus,
    pub chunks_sent: u64,
    pub entries_sent: u64,
}

/// Returned by `start_transfer`; the transfer itself runs in the background.
pub struct TransferHandle {
    task: Arc<OutboundTask>,
    join: JoinHandle<TransferStatus>,
}

impl TransferHandle {
    pub(crate) fn new(task: Arc<OutboundTask>, join: JoinHandle<TransferStatus>) -> Self {
        Self { task, join }
    }

    pub fn id(&self) -> &TransferId {
        self.task.id()
    }

    pub fn site(&self) -> &str {
        self.task.site_name()
    }

    pub fn status(&self) -> TransferStatus {
        self.task.status()
    }

    pub fn summary(&self) -> TransferSummary {
        self.task.summary()
    }

    /// Requests cooperative cancellation. Returns false if already terminal.
    pub fn cancel(&self) -> bool {
        self.task.cancel()
    }

    /// Waits until the task is terminal and has left the registry.
    pub async fn wait(self) -> TransferStatus {
        match self.join.await {
            Ok(status) => status,
            Err(e) => TransferStatus::Failed {
                error: format!("transfer task aborted: {}", e),
            },
        }
    }
}
