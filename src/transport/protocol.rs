//! Cross-Site Network Protocol
//!
//! Defines the endpoints and Data Transfer Objects (DTOs) exchanged between
//! sites and between nodes of the same site during a state transfer.

use crate::container::types::CacheEntry;
use crate::statetransfer::types::TransferSummary;
use crate::topology::types::Address;
use crate::transaction::types::SiteTransactionInfo;

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Inbound endpoint on a backup site receiving pushed state.
pub const ENDPOINT_XSITE_PUSH: &str = "/xsite/push";
/// Endpoint receiving encoded state request commands from other nodes.
pub const ENDPOINT_STATE_REQUEST: &str = "/xsite/state_request";
/// Operational endpoint reporting transfers in progress.
pub const ENDPOINT_XSITE_STATUS: &str = "/xsite/status";
/// Operational endpoint cancelling the transfer to a site.
pub const ENDPOINT_XSITE_CANCEL: &str = "/xsite/cancel";

// --- Data Transfer Objects ---

/// Payload pushed to a backup site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum XSiteTransferKind {
    /// In-flight transactions overlapping the migrated segments.
    TransactionsTransferred { transactions: Vec<SiteTransactionInfo> },
    /// One chunk of cache entries.
    StateChunk { chunk_index: u64, entries: Vec<CacheEntry> },
}

/// Command carried by the transport to a backup site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct XSiteTransferCommand {
    pub kind: XSiteTransferKind,
    pub origin: Address,
    pub cache_name: String,
    pub origin_site: Option<String>,
}

impl XSiteTransferCommand {
    pub fn entry_count(&self) -> usize {
        match &self.kind {
            XSiteTransferKind::StateChunk { entries, .. } => entries.len(),
            XSiteTransferKind::TransactionsTransferred { .. } => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BackupResponse {
    /// The site acknowledged the command.
    Acknowledged,
    /// Fire-and-forget send; no acknowledgement awaited.
    Queued,
}

/// Wire envelope for a replicable command sent between nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub command_id: u8,
    /// bincode-encoded parameter tuple.
    pub parameters: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandReply {
    pub success: bool,
    pub transfer: Option<TransferSummary>,
    pub error: Option<String>,
}

/// Response for the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferStatusResponse {
    pub in_progress: bool,
    pub transfers: Vec<TransferSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushResponse {
    pub accepted: bool,
}
