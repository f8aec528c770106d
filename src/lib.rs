//! Cross-Site State Transfer Library
//!
//! This library crate pushes the contents of a cache from one site of a
//! distributed in-memory data grid to a backup site. It serves as the
//! foundation for the node binary (`main.rs`).
//!
//! ## Architecture Modules
//! - **`statetransfer`**: The outbound side. A per-cache provider accepts
//!   transfer requests, keeps at most one transfer per destination site and
//!   runs each as a cancellable background task streaming owned entries in
//!   chunks. Also hosts the replicable request command and its HTTP handlers.
//! - **`transaction`**: Transaction table interface and the collector picking
//!   the in-flight transactions that touch migrated segments.
//! - **`topology`**: Node addresses, consistent hash and the local topology
//!   manager used to resolve segment ownership.
//! - **`container`**: In-memory data container and optional persistent store
//!   the entries are read from.
//! - **`transport`**: Backup transport interface, the HTTP bridge between
//!   sites and the wire DTOs.
//! - **`config`** / **`error`**: Node configuration and the error taxonomy.

pub mod config;
pub mod container;
pub mod error;
pub mod statetransfer;
pub mod topology;
pub mod transaction;
pub mod transport;

#[cfg(test)]
mod testkit;
