//! Transaction Module
//!
//! Selects the in-flight transactions that must accompany a cross-site state
//! transfer so the backup site sees a consistent lock and modification
//! picture for the migrated segments.
//!
//! ## Submodules
//! - **`types`**: transaction identity, modifications and transfer views.
//! - **`table`**: the consumed transaction table and an in-memory version.
//! - **`collector`**: filtering by owned segments and cross-site translation.

pub mod collector;
pub mod table;
pub mod types;

#[cfg(test)]
mod tests;
