use super::types::{CacheTransaction, GlobalTransaction};

use dashmap::DashMap;

/// Read access to the in-flight transactions of one cache.
pub trait TransactionTable: Send + Sync {
    /// Transactions originated on this node.
    fn local_transactions(&self) -> Vec<CacheTransaction>;

    /// Transactions originated elsewhere that hold locks here.
    fn remote_transactions(&self) -> Vec<CacheTransaction>;
}

/// Transaction table kept in two concurrent maps.
#[derive(Default)]
pub struct InMemoryTransactionTable {
    local: DashMap<GlobalTransaction, CacheTransaction>,
    remote: DashMap<GlobalTransaction, CacheTransaction>,
}

impl InMemoryTransactionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_local(&self, tx: CacheTransaction) {
        self.local.insert(tx.global_tx.clone(), tx);
    }

    pub fn add_remote(&self, tx: CacheTransaction) {
        self.remote.insert(tx.global_tx.clone(), tx);
    }

    /// Drops the transaction from both tables once it commits or rolls back.
    pub fn finish(&self, global_tx: &GlobalTransaction) {
        self.local.remove(global_tx);
        self.remote.remove(global_tx);
    }
}

impl TransactionTable for InMemoryTransactionTable {
    fn local_transactions(&self) -> Vec<CacheTransaction> {
        self.local
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn remote_transactions(&self) -> Vec<CacheTransaction> {
        self.remote
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}
