//! Topology Module
//!
//! The consumed view of cluster ownership. A cache topology carries the current
//! consistent hash, which answers two questions for the state transfer:
//! which segment a key belongs to and which segments a node owns.
//!
//! ## Core Concepts
//! - **Segment**: a fixed partition of the key space, the unit of ownership.
//! - **Consistent hash**: maps keys to segments and segments to owners.
//! - **Topology manager**: holds the latest topology installed per cache.

pub mod hash;
pub mod manager;
pub mod types;

#[cfg(test)]
mod tests;
