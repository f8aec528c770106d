//! Cross-Site State Provider
//!
//! The single authority for outbound cross-site transfers of one cache. It
//! validates a request, reads segment ownership once, collects the affected
//! transactions and hands an `OutboundTask` to the executor. The caller never
//! waits for the transaction push or the entry stream.

use super::registry::TransferRegistry;
use super::task::{OutboundTask, TransferPlan, TransferSources};
use super::types::{TransferHandle, TransferSummary};
use crate::config::CacheConfiguration;
use crate::container::{CacheStore, DataContainer};
use crate::error::{XSiteError, XSiteResult};
use crate::topology::manager::LocalTopologyManager;
use crate::topology::types::Address;
use crate::transaction::collector::{collect_transactions, translate_to_site_transactions};
use crate::transaction::table::TransactionTable;
use crate::transport::types::BackupTarget;
use crate::transport::BackupTransport;

use std::sync::Arc;
use tokio::runtime::Handle;

/// Collaborators of one cache that the provider reads from or sends through.
#[derive(Clone)]
pub struct CacheComponents {
    pub topology_manager: Arc<LocalTopologyManager>,
    pub transaction_table: Arc<dyn TransactionTable>,
    pub container: Arc<dyn DataContainer>,
    pub store: Option<Arc<dyn CacheStore>>,
    pub transport: Arc<dyn BackupTransport>,
    /// Executor running the outbound tasks.
    pub executor: Handle,
}

pub struct XSiteStateProvider {
    local_address: Address,
    local_site: Option<String>,
    configuration: CacheConfiguration,
    components: CacheComponents,
    registry: Arc<TransferRegistry>,
}

impl XSiteStateProvider {
    pub fn new(
        local_address: Address,
        local_site: Option<String>,
        configuration: CacheConfiguration,
        components: CacheComponents,
    ) -> Arc<Self> {
        Arc::new(Self {
            local_address,
            local_site,
            configuration,
            components,
            registry: TransferRegistry::new(),
        })
    }

    pub fn cache_name(&self) -> &str {
        &self.configuration.name
    }

    pub fn local_address(&self) -> &Address {
        &self.local_address
    }

    /// Starts pushing `cache_name` to `site_name` on behalf of `origin`.
    ///
    /// Returns once the transfer is registered; the push runs on the executor.
    pub fn start_transfer(
        &self,
        site_name: &str,
        cache_name: &str,
        origin: &Address,
    ) -> XSiteResult<TransferHandle> {
        if site_name.is_empty() {
            return Err(XSiteError::InvalidArgument("site name must not be empty"));
        }
        if cache_name.is_empty() {
            return Err(XSiteError::InvalidArgument("cache name must not be empty"));
        }
        if cache_name != self.cache_name() {
            return Err(XSiteError::UnknownCache(cache_name.to_string()));
        }

        tracing::trace!(
            "Received request for cross site transfer from node {} for site {} for cache {}",
            origin,
            site_name,
            cache_name
        );

        let target = match self.resolve_backup_target(site_name) {
            Some(target) => target,
            None => {
                tracing::warn!(
                    "No backup configuration is found for site {} in cache {}",
                    site_name,
                    cache_name
                );
                return Err(XSiteError::BackupNotConfigured(site_name.to_string()));
            }
        };

        let ch = self
            .components
            .topology_manager
            .cache_topology(cache_name)
            .and_then(|topology| topology.current_ch)
            .ok_or_else(|| XSiteError::NoTopology(cache_name.to_string()))?;

        let owned_segments = ch.segments_for_owner(&self.local_address);

        let transactions = if self.configuration.transactional {
            let table = &self.components.transaction_table;
            let collected = collect_transactions(
                ch.as_ref(),
                &owned_segments,
                &table.local_transactions(),
                &table.remote_transactions(),
            );
            translate_to_site_transactions(&collected)
        } else {
            Vec::new()
        };

        let plan = TransferPlan {
            target,
            cache_name: cache_name.to_string(),
            source: origin.clone(),
            origin_site: self.local_site.clone(),
            chunk_size: self.configuration.state_transfer.effective_chunk_size(),
            ch,
            owned_segments,
            transactions,
        };
        let sources = TransferSources {
            container: self.components.container.clone(),
            store: self.components.store.clone(),
            transport: self.components.transport.clone(),
        };

        let task = OutboundTask::new(plan, sources, self.registry.clone());
        if let Err(e) = self.registry.register(task.clone()) {
            tracing::warn!("Rejected transfer of cache {}: {}", cache_name, e);
            return Err(e);
        }

        tracing::info!(
            "Starting outbound transfer {} of cache {} to site {}",
            task.id().0,
            cache_name,
            site_name
        );
        let join = task.execute(&self.components.executor);
        Ok(TransferHandle::new(task, join))
    }

    pub fn is_transfer_in_progress(&self) -> bool {
        self.registry.is_transfer_in_progress()
    }

    /// Removes `task` from the registry. Repeated calls are no-ops.
    pub fn on_task_completion(&self, task: &OutboundTask) {
        self.registry.on_task_completion(task);
    }

    /// Requests cancellation of the transfer to `site_name`, if any.
    pub fn cancel_transfer(&self, site_name: &str) -> bool {
        match self.registry.get(site_name) {
            Some(task) => task.cancel(),
            None => false,
        }
    }

    pub fn transfers(&self) -> Vec<TransferSummary> {
        self.registry.summaries()
    }

    /// Connection parameters for `site_name`, if it is a configured backup.
    pub fn resolve_backup_target(&self, site_name: &str) -> Option<BackupTarget> {
        self.configuration
            .backup_for_site(site_name)
            .map(|backup| {
                BackupTarget::from_config(backup, self.configuration.state_transfer.timeout())
            })
    }
}
