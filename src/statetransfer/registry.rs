//! Registry of in-progress outbound transfers.
//!
//! Owned by the provider and shared with its tasks so they can deregister
//! themselves. Every read and write goes through a single lock; no task work
//! runs while it is held.

use super::task::OutboundTask;
use super::types::TransferSummary;
use crate::error::{XSiteError, XSiteResult};

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct TransferRegistry {
    transfers_by_site: Mutex<HashMap<String, Arc<OutboundTask>>>,
}

impl TransferRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers `task` under its site name.
    ///
    /// Fails with `TransferInProgress` if the site already has a task.
    pub fn register(&self, task: Arc<OutboundTask>) -> XSiteResult<()> {
        let mut transfers = self.transfers_by_site.lock();
        if transfers.contains_key(task.site_name()) {
            return Err(XSiteError::TransferInProgress(task.site_name().to_string()));
        }

        tracing::trace!(
            "Adding outbound transfer task for site {} from node {}",
            task.site_name(),
            task.source()
        );
        transfers.insert(task.site_name().to_string(), task);
        Ok(())
    }

    /// Removes `task` if it is still the registered task for its site.
    ///
    /// Returns false when the entry is already gone, which makes repeated
    /// completion a no-op and never evicts a newer task for the same site.
    pub fn on_task_completion(&self, task: &OutboundTask) -> bool {
        let mut transfers = self.transfers_by_site.lock();
        let is_current = transfers
            .get(task.site_name())
            .map(|registered| registered.id() == task.id())
            .unwrap_or(false);

        if is_current {
            transfers.remove(task.site_name());
            tracing::trace!(
                "Removed outbound transfer task from node {} to site {} ({:?})",
                task.source(),
                task.site_name(),
                task.status()
            );
        }
        is_current
    }

    pub fn is_transfer_in_progress(&self) -> bool {
        !self.transfers_by_site.lock().is_empty()
    }

    pub fn get(&self, site: &str) -> Option<Arc<OutboundTask>> {
        self.transfers_by_site.lock().get(site).cloned()
    }

    pub fn len(&self) -> usize {
        self.transfers_by_site.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn summaries(&self) -> Vec<TransferSummary> {
        let mut summaries: Vec<TransferSummary> = self
            .transfers_by_site
            .lock()
            .values()
            .map(|task| task.summary())
            .collect();
        summaries.sort_by(|a, b| a.site.cmp(&b.site));
        summaries
    }
}
