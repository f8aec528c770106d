//! Transaction collection for cross-site transfer.
//!
//! Only keys whose segment is in the requested set are kept, and a
//! transaction survives only if at least one such key remains. The collector
//! reads the tables and never touches lock state.

use super::types::{CacheTransaction, GlobalTransaction, SiteTransactionInfo, TransactionInfo};
use crate::topology::hash::ConsistentHash;
use crate::topology::types::SegmentId;

use std::collections::{BTreeMap, BTreeSet};

/// Collects the transactions from both tables that lock keys in `segments`.
///
/// The output is ordered by global transaction. A transaction found in both
/// tables is reported once, with the union of its retained keys.
pub fn collect_transactions(
    ch: &dyn ConsistentHash,
    segments: &BTreeSet<SegmentId>,
    local: &[CacheTransaction],
    remote: &[CacheTransaction],
) -> Vec<TransactionInfo> {
    let mut collected: BTreeMap<GlobalTransaction, TransactionInfo> = BTreeMap::new();

    for tx in remote.iter().chain(local.iter()) {
        let locked_keys: BTreeSet<String> = tx
            .locked_keys
            .iter()
            .chain(tx.backup_locked_keys.iter())
            .filter(|key| segments.contains(&ch.segment_of(key)))
            .cloned()
            .collect();

        if locked_keys.is_empty() {
            continue;
        }

        match collected.get_mut(&tx.global_tx) {
            Some(existing) => {
                existing.locked_keys.extend(locked_keys);
                existing.view_id = existing.view_id.max(tx.view_id);
                if existing.modifications.is_empty() {
                    existing.modifications = tx.modifications.clone().unwrap_or_default();
                }
            }
            None => {
                collected.insert(
                    tx.global_tx.clone(),
                    TransactionInfo {
                        global_tx: tx.global_tx.clone(),
                        view_id: tx.view_id,
                        modifications: tx.modifications.clone().unwrap_or_default(),
                        locked_keys,
                    },
                );
            }
        }
    }

    tracing::trace!("Found {} transaction(s) to transfer", collected.len());

    collected.into_values().collect()
}

/// Strips the view id from each transaction, preserving order.
pub fn translate_to_site_transactions(transactions: &[TransactionInfo]) -> Vec<SiteTransactionInfo> {
    transactions.iter().map(SiteTransactionInfo::from).collect()
}
