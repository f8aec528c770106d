//! Outbound State Transfer Task
//!
//! Streams one cache's owned entries to one backup site.
//!
//! ## Execution
//! - **Transactions first**: the collected transaction batch is pushed before
//!   any entry chunk, so the backup never sees data locked by a transaction
//!   it cannot account for. The batch is awaited even when the backup is
//!   asynchronous; only entry chunks are fire-and-forget there.
//! - **Chunking**: entries from the data container, then from the persistent
//!   store, are grouped into chunks of at most `chunk_size` entries. Keys
//!   already sent from the container are skipped when reading the store.
//! - **Cancellation**: checked at every chunk boundary; an in-flight chunk is
//!   never interrupted.
//! - **Failure**: the first timeout or transport error ends the task as
//!   `Failed`. Sent chunks are neither retried nor rolled back.
//! - **Completion**: the task leaves the registry on every exit path, a
//!   panicking collaborator included.

use super::registry::TransferRegistry;
use super::types::{TransferId, TransferStatus, TransferSummary};
use crate::container::types::CacheEntry;
use crate::container::{CacheStore, DataContainer};
use crate::error::{XSiteError, XSiteResult};
use crate::topology::hash::ConsistentHash;
use crate::topology::types::{Address, SegmentId};
use crate::transaction::types::SiteTransactionInfo;
use crate::transport::protocol::{BackupResponse, XSiteTransferCommand, XSiteTransferKind};
use crate::transport::types::BackupTarget;
use crate::transport::BackupTransport;

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Upper bound on the capacity reserved up front for one chunk.
const MAX_CHUNK_PREALLOC: usize = 1024;

/// What one transfer sends, fixed when the transfer starts.
pub struct TransferPlan {
    pub target: BackupTarget,
    pub cache_name: String,
    /// Node that requested the transfer.
    pub source: Address,
    pub origin_site: Option<String>,
    pub chunk_size: usize,
    pub ch: Arc<dyn ConsistentHash>,
    /// Segments owned by this node, read once at start.
    pub owned_segments: BTreeSet<SegmentId>,
    pub transactions: Vec<SiteTransactionInfo>,
}

/// Where the entries come from and where they go.
#[derive(Clone)]
pub struct TransferSources {
    pub container: Arc<dyn DataContainer>,
    pub store: Option<Arc<dyn CacheStore>>,
    pub transport: Arc<dyn BackupTransport>,
}

enum StreamOutcome {
    Completed,
    Cancelled,
}

pub struct OutboundTask {
    id: TransferId,
    plan: TransferPlan,
    sources: TransferSources,
    registry: Arc<TransferRegistry>,
    cancel: CancellationToken,
    status: watch::Sender<TransferStatus>,
    chunks_sent: AtomicU64,
    entries_sent: AtomicU64,
}

impl OutboundTask {
    pub fn new(
        plan: TransferPlan,
        sources: TransferSources,
        registry: Arc<TransferRegistry>,
    ) -> Arc<Self> {
        let (status, _) = watch::channel(TransferStatus::Created);
        Arc::new(Self {
            id: TransferId::new(),
            plan,
            sources,
            registry,
            cancel: CancellationToken::new(),
            status,
            chunks_sent: AtomicU64::new(0),
            entries_sent: AtomicU64::new(0),
        })
    }

    pub fn id(&self) -> &TransferId {
        &self.id
    }

    pub fn site_name(&self) -> &str {
        &self.plan.target.site
    }

    pub fn cache_name(&self) -> &str {
        &self.plan.cache_name
    }

    pub fn source(&self) -> &Address {
        &self.plan.source
    }

    pub fn status(&self) -> TransferStatus {
        self.status.borrow().clone()
    }

    pub fn chunks_sent(&self) -> u64 {
        self.chunks_sent.load(Ordering::SeqCst)
    }

    pub fn entries_sent(&self) -> u64 {
        self.entries_sent.load(Ordering::SeqCst)
    }

    pub fn summary(&self) -> TransferSummary {
        TransferSummary {
            transfer_id: self.id.clone(),
            site: self.site_name().to_string(),
            cache_name: self.cache_name().to_string(),
            origin: self.plan.source.clone(),
            status: self.status(),
            chunks_sent: self.chunks_sent(),
            entries_sent: self.entries_sent(),
        }
    }

    /// Sets the cancellation flag. No-op once the task is terminal.
    pub fn cancel(&self) -> bool {
        if self.status().is_terminal() {
            return false;
        }
        tracing::debug!(
            "Cancelling outbound transfer {} to site {}",
            self.id.0,
            self.site_name()
        );
        self.cancel.cancel();
        true
    }

    /// Spawns the task body on `executor` and returns immediately.
    pub fn execute(self: &Arc<Self>, executor: &Handle) -> JoinHandle<TransferStatus> {
        let task = self.clone();
        executor.spawn(async move { task.run().await })
    }

    async fn run(self: Arc<Self>) -> TransferStatus {
        let _completion = CompletionGuard {
            task: self.clone(),
        };
        self.transition(TransferStatus::Running);
        tracing::info!(
            "Starting outbound transfer of cache {} to site {} ({} owned segments)",
            self.cache_name(),
            self.site_name(),
            self.plan.owned_segments.len()
        );

        let status = match self.stream().await {
            Ok(StreamOutcome::Completed) => {
                tracing::info!(
                    "Transfer of cache {} to site {} completed: {} entries in {} chunks",
                    self.cache_name(),
                    self.site_name(),
                    self.entries_sent(),
                    self.chunks_sent()
                );
                TransferStatus::Completed
            }
            Ok(StreamOutcome::Cancelled) => {
                tracing::info!(
                    "Transfer of cache {} to site {} cancelled after {} chunks",
                    self.cache_name(),
                    self.site_name(),
                    self.chunks_sent()
                );
                TransferStatus::Cancelled
            }
            Err(e) => {
                tracing::error!(
                    "Transfer of cache {} to site {} failed: {}",
                    self.cache_name(),
                    self.site_name(),
                    e
                );
                TransferStatus::Failed {
                    error: e.to_string(),
                }
            }
        };

        self.transition(status);
        self.status()
    }

    /// Moves to `next` unless already terminal.
    fn transition(&self, next: TransferStatus) -> bool {
        self.status.send_if_modified(|current| {
            if current.is_terminal() {
                return false;
            }
            *current = next;
            true
        })
    }

    async fn stream(&self) -> XSiteResult<StreamOutcome> {
        if !self.plan.transactions.is_empty() {
            if self.cancel.is_cancelled() {
                return Ok(StreamOutcome::Cancelled);
            }
            tracing::debug!(
                "Pushing {} transaction(s) of cache {} to site {}",
                self.plan.transactions.len(),
                self.cache_name(),
                self.site_name()
            );
            // Awaited even for asynchronous backups so the batch lands before any chunk.
            let batch_target = BackupTarget {
                sync: true,
                ..self.plan.target.clone()
            };
            self.send_to(
                &batch_target,
                XSiteTransferKind::TransactionsTransferred {
                    transactions: self.plan.transactions.clone(),
                },
            )
            .await?;
        }

        let mut chunk = ChunkBuilder::new(self.plan.chunk_size);
        let mut emitted: HashSet<String> = HashSet::new();

        let owned = self
            .sources
            .container
            .entries()
            .filter(|entry| self.is_owned(entry));
        for entry in owned {
            emitted.insert(entry.key.clone());
            if let Some(full) = chunk.push(entry) {
                if !self.send_chunk(full).await? {
                    return Ok(StreamOutcome::Cancelled);
                }
            }
        }

        if let Some(store) = &self.sources.store {
            let stored = store
                .load_all()?
                .filter(|entry| self.is_owned(entry) && !emitted.contains(&entry.key));
            for entry in stored {
                if let Some(full) = chunk.push(entry) {
                    if !self.send_chunk(full).await? {
                        return Ok(StreamOutcome::Cancelled);
                    }
                }
            }
        }

        if let Some(last) = chunk.finish() {
            if !self.send_chunk(last).await? {
                return Ok(StreamOutcome::Cancelled);
            }
        }

        Ok(StreamOutcome::Completed)
    }

    fn is_owned(&self, entry: &CacheEntry) -> bool {
        self.plan
            .owned_segments
            .contains(&self.plan.ch.segment_of(&entry.key))
    }

    /// Sends one chunk. Returns false if cancellation was requested first.
    async fn send_chunk(&self, entries: Vec<CacheEntry>) -> XSiteResult<bool> {
        if self.cancel.is_cancelled() {
            return Ok(false);
        }

        let chunk_index = self.chunks_sent();
        let count = entries.len() as u64;
        self.send(XSiteTransferKind::StateChunk {
            chunk_index,
            entries,
        })
        .await?;

        self.chunks_sent.fetch_add(1, Ordering::SeqCst);
        self.entries_sent.fetch_add(count, Ordering::SeqCst);
        tracing::debug!(
            "Sent chunk {} ({} entries) of cache {} to site {}",
            chunk_index,
            count,
            self.cache_name(),
            self.site_name()
        );
        Ok(true)
    }

    async fn send(&self, kind: XSiteTransferKind) -> XSiteResult<BackupResponse> {
        self.send_to(&self.plan.target, kind).await
    }

    async fn send_to(
        &self,
        target: &BackupTarget,
        kind: XSiteTransferKind,
    ) -> XSiteResult<BackupResponse> {
        let command = XSiteTransferCommand {
            kind,
            origin: self.plan.source.clone(),
            cache_name: self.plan.cache_name.clone(),
            origin_site: self.plan.origin_site.clone(),
        };

        match tokio::time::timeout(
            target.timeout,
            self.sources.transport.backup_remotely(target, command),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(XSiteError::Timeout {
                site: target.site.clone(),
                timeout_ms: target.timeout.as_millis() as u64,
            }),
        }
    }
}

/// Leaves the registry on every exit of `run`, including a panicking collaborator.
struct CompletionGuard {
    task: Arc<OutboundTask>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let stopped_early = self.task.transition(TransferStatus::Failed {
            error: "transfer task stopped before reaching a terminal state".to_string(),
        });
        if stopped_early {
            tracing::error!(
                "Transfer of cache {} to site {} stopped unexpectedly",
                self.task.cache_name(),
                self.task.site_name()
            );
        }
        self.task.registry.on_task_completion(&self.task);
    }
}

/// Groups entries into chunks of at most `chunk_size`.
pub struct ChunkBuilder {
    chunk_size: usize,
    current: Vec<CacheEntry>,
}

impl ChunkBuilder {
    pub fn new(chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            current: Vec::with_capacity(chunk_size.min(MAX_CHUNK_PREALLOC)),
        }
    }

    /// Adds one entry, returning the chunk once it is full.
    pub fn push(&mut self, entry: CacheEntry) -> Option<Vec<CacheEntry>> {
        self.current.push(entry);
        if self.current.len() >= self.chunk_size {
            let next = Vec::with_capacity(self.chunk_size.min(MAX_CHUNK_PREALLOC));
            Some(std::mem::replace(&mut self.current, next))
        } else {
            None
        }
    }

    /// Returns the trailing partial chunk, if any.
    pub fn finish(self) -> Option<Vec<CacheEntry>> {
        if self.current.is_empty() {
            None
        } else {
            Some(self.current)
        }
    }
}
