//! Cross-Site State Transfer Module
//!
//! Pushes a consistent snapshot of one cache to a remote backup site without
//! pausing local traffic.
//!
//! ## Flow
//! 1. **Request**: an `XSiteStateRequestCommand` reaches the node and is
//!    dispatched to the cache's `XSiteStateProvider`.
//! 2. **Planning**: the provider reads segment ownership once, collects the
//!    in-flight transactions locking keys in those segments and registers an
//!    `OutboundTask`. At most one task per remote site is registered.
//! 3. **Streaming**: the task pushes the transaction batch, then streams the
//!    owned entries of the data container and the persistent store in chunks.
//! 4. **Completion**: on any terminal state the task removes itself from the
//!    `TransferRegistry`.
//!
//! ## Submodules
//! - **`types`**: identifiers, status, handles and summaries.
//! - **`registry`**: the lock-guarded map of in-progress transfers.
//! - **`task`**: the chunked outbound push.
//! - **`provider`**: the per-cache coordinator.
//! - **`command`**: the replicable request command and its wire format.
//! - **`handlers`**: HTTP handlers exposing the command and status endpoints.

pub mod command;
pub mod handlers;
pub mod provider;
pub mod registry;
pub mod task;
pub mod types;
