//! Transaction Module Tests
//!
//! ## Test Scopes
//! - **Collector**: segment filtering, key restriction, ordering and merging.
//! - **Translation**: view id stripping with identity and order preserved.
//! - **Properties**: inclusion/exclusion over randomized lock layouts.

#[cfg(test)]
mod tests {
    use crate::testkit::{segment_key, SegmentPrefixHash};
    use crate::topology::types::Address;
    use crate::transaction::collector::{collect_transactions, translate_to_site_transactions};
    use crate::transaction::table::{InMemoryTransactionTable, TransactionTable};
    use crate::transaction::types::{CacheTransaction, GlobalTransaction, WriteCommand};
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn gtx(id: u64) -> GlobalTransaction {
        GlobalTransaction::new(id, Address::named("node-a"))
    }

    fn segments(ids: &[u32]) -> BTreeSet<u32> {
        ids.iter().copied().collect()
    }

    // ============================================================
    // COLLECTOR TESTS
    // ============================================================

    #[test]
    fn test_collect_skips_transactions_outside_owned_segments() {
        // ARRANGE: locks on segments {1,3}, node owns {0,2}
        let ch = SegmentPrefixHash::new(4);
        let tx = CacheTransaction::new(gtx(1), 7)
            .with_lock(&segment_key(1, 0))
            .with_backup_lock(&segment_key(3, 0));

        // ACT
        let collected = collect_transactions(&ch, &segments(&[0, 2]), &[tx], &[]);

        // ASSERT
        assert!(collected.is_empty());
    }

    #[test]
    fn test_collect_restricts_keys_to_owned_segments() {
        let ch = SegmentPrefixHash::new(4);
        let owned_key = segment_key(0, 1);
        let backup_key = segment_key(2, 1);
        let foreign_key = segment_key(1, 1);
        let tx = CacheTransaction::new(gtx(1), 3)
            .with_lock(&owned_key)
            .with_lock(&foreign_key)
            .with_backup_lock(&backup_key)
            .with_modification(WriteCommand::Put {
                key: owned_key.clone(),
                value_json: "1".to_string(),
            });

        let collected = collect_transactions(&ch, &segments(&[0, 2]), &[tx], &[]);

        assert_eq!(collected.len(), 1);
        let info = &collected[0];
        assert_eq!(info.view_id, 3);
        assert_eq!(info.modifications.len(), 1);
        assert_eq!(
            info.locked_keys,
            [owned_key, backup_key].into_iter().collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn test_collect_orders_by_transaction_and_merges_duplicates() {
        let ch = SegmentPrefixHash::new(4);
        let local = vec![
            CacheTransaction::new(gtx(9), 1).with_lock(&segment_key(0, 1)),
            CacheTransaction::new(gtx(2), 1).with_lock(&segment_key(0, 2)),
        ];
        let remote = vec![
            CacheTransaction::new(gtx(5), 1).with_lock(&segment_key(2, 5)),
            CacheTransaction::new(gtx(9), 2).with_backup_lock(&segment_key(2, 9)),
        ];

        let collected = collect_transactions(&ch, &segments(&[0, 2]), &local, &remote);

        let ids: Vec<u64> = collected.iter().map(|info| info.global_tx.id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
        let merged = &collected[2];
        assert_eq!(merged.locked_keys.len(), 2);
        assert_eq!(merged.view_id, 2);
    }

    #[test]
    fn test_collect_does_not_mutate_table() {
        let ch = SegmentPrefixHash::new(4);
        let table = InMemoryTransactionTable::new();
        table.add_local(CacheTransaction::new(gtx(1), 1).with_lock(&segment_key(0, 0)));
        table.add_remote(CacheTransaction::new(gtx(2), 1).with_lock(&segment_key(1, 0)));

        let before_local = table.local_transactions();
        let collected = collect_transactions(
            &ch,
            &segments(&[0]),
            &table.local_transactions(),
            &table.remote_transactions(),
        );

        assert_eq!(collected.len(), 1);
        assert_eq!(table.local_transactions(), before_local);
        assert_eq!(table.remote_transactions().len(), 1);

        table.finish(&gtx(1));
        assert!(table.local_transactions().is_empty());
    }

    // ============================================================
    // TRANSLATION TESTS
    // ============================================================

    #[test]
    fn test_translate_preserves_identity_and_order() {
        let ch = SegmentPrefixHash::new(2);
        let txs: Vec<CacheTransaction> = (0..5)
            .map(|id| {
                CacheTransaction::new(gtx(id), 40 + id)
                    .with_lock(&segment_key(0, id as usize))
                    .with_modification(WriteCommand::Remove {
                        key: segment_key(0, id as usize),
                    })
            })
            .collect();
        let collected = collect_transactions(&ch, &segments(&[0]), &txs, &[]);

        let translated = translate_to_site_transactions(&collected);

        assert_eq!(translated.len(), collected.len());
        for (site_tx, info) in translated.iter().zip(collected.iter()) {
            assert_eq!(site_tx.global_tx, info.global_tx);
            assert_eq!(site_tx.modifications, info.modifications);
        }
    }

    // ============================================================
    // PROPERTY TESTS
    // ============================================================

    proptest! {
        #[test]
        fn prop_collect_includes_exactly_transactions_with_owned_locks(
            locks in prop::collection::vec(
                (prop::collection::vec(0u32..8, 0..4), prop::collection::vec(0u32..8, 0..4)),
                0..20,
            ),
            owned in prop::collection::btree_set(0u32..8, 0..8),
        ) {
            let ch = SegmentPrefixHash::new(8);
            let txs: Vec<CacheTransaction> = locks
                .iter()
                .enumerate()
                .map(|(id, (locked, backup))| {
                    let mut tx = CacheTransaction::new(gtx(id as u64), 1);
                    for (n, segment) in locked.iter().enumerate() {
                        tx = tx.with_lock(&segment_key(*segment, n));
                    }
                    for (n, segment) in backup.iter().enumerate() {
                        tx = tx.with_backup_lock(&segment_key(*segment, 100 + n));
                    }
                    tx
                })
                .collect();

            let collected = collect_transactions(&ch, &owned, &txs, &[]);
            let collected_ids: BTreeSet<u64> =
                collected.iter().map(|info| info.global_tx.id).collect();

            for (id, (locked, backup)) in locks.iter().enumerate() {
                let touches_owned = locked.iter().chain(backup.iter()).any(|s| owned.contains(s));
                prop_assert_eq!(collected_ids.contains(&(id as u64)), touches_owned);
            }
            for info in &collected {
                for key in &info.locked_keys {
                    prop_assert!(owned.contains(&ch.segment_of_key(key)));
                }
            }
        }
    }
}
