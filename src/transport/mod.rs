//! Cross-Site Transport Module
//!
//! The bridge between this site and its backup sites. The state transfer only
//! depends on the `BackupTransport` trait; `http` provides the implementation
//! used by the node binary.
//!
//! ## Submodules
//! - **`types`**: per-transfer backup target parameters.
//! - **`protocol`**: commands and DTOs exchanged over the bridge.
//! - **`http`**: reqwest-based transport and the remote state request client.

pub mod http;
pub mod protocol;
pub mod types;

use crate::error::XSiteResult;
use async_trait::async_trait;
use protocol::{BackupResponse, XSiteTransferCommand};
use types::BackupTarget;

/// Sends one command to one backup site.
///
/// Synchronous targets resolve once the site acknowledged; asynchronous
/// targets resolve as soon as the command has been handed off. Callers own
/// the timeout.
#[async_trait]
pub trait BackupTransport: Send + Sync {
    async fn backup_remotely(
        &self,
        target: &BackupTarget,
        command: XSiteTransferCommand,
    ) -> XSiteResult<BackupResponse>;
}
