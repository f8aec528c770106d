//! Error taxonomy for cross-site state transfer.
//!
//! Every error is reported at the point of detection. Nothing here is retried
//! internally; recovery means issuing a fresh transfer request.

use thiserror::Error;

/// Result alias used by the library API.
pub type XSiteResult<T> = Result<T, XSiteError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum XSiteError {
    /// No consistent hash has been installed for the cache (join not complete).
    #[error("no cache topology received yet for cache '{0}'")]
    NoTopology(String),

    /// A transfer to the site is already registered.
    #[error("a state transfer to site '{0}' is already in progress")]
    TransferInProgress(String),

    /// The site is not one of the cache's configured backups.
    #[error("site '{0}' is not a configured backup")]
    BackupNotConfigured(String),

    /// Sending a chunk or the transaction batch failed.
    #[error("transport error towards site '{site}': {reason}")]
    Transport { site: String, reason: String },

    /// The backup site did not acknowledge within the configured timeout.
    #[error("timed out after {timeout_ms}ms waiting for site '{site}'")]
    Timeout { site: String, timeout_ms: u64 },

    /// Malformed or version-mismatched command.
    #[error("unknown state request command type: {0}")]
    UnknownCommandType(String),

    /// No coordinator is running for the named cache on this node.
    #[error("cache '{0}' is not running on this node")]
    UnknownCache(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Command frame could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),
}

impl From<bincode::Error> for XSiteError {
    fn from(err: bincode::Error) -> Self {
        XSiteError::Codec(err.to_string())
    }
}
