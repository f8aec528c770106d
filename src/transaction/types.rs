use crate::topology::types::Address;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Cluster-wide transaction identity.
///
/// Ordered by id first so collected transactions come out in a stable order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalTransaction {
    pub id: u64,
    pub origin: Address,
}

impl GlobalTransaction {
    pub fn new(id: u64, origin: Address) -> Self {
        Self { id, origin }
    }
}

impl fmt::Display for GlobalTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GlobalTx:{}:{}", self.origin, self.id)
    }
}

/// A write recorded by a transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum WriteCommand {
    Put { key: String, value_json: String },
    Replace { key: String, value_json: String },
    Remove { key: String },
}

/// A transaction as kept by the transaction table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheTransaction {
    pub global_tx: GlobalTransaction,
    pub view_id: u64,
    pub modifications: Option<Vec<WriteCommand>>,
    pub locked_keys: BTreeSet<String>,
    pub backup_locked_keys: BTreeSet<String>,
}

impl CacheTransaction {
    pub fn new(global_tx: GlobalTransaction, view_id: u64) -> Self {
        Self {
            global_tx,
            view_id,
            modifications: None,
            locked_keys: BTreeSet::new(),
            backup_locked_keys: BTreeSet::new(),
        }
    }

    pub fn with_lock(mut self, key: &str) -> Self {
        self.locked_keys.insert(key.to_string());
        self
    }

    pub fn with_backup_lock(mut self, key: &str) -> Self {
        self.backup_locked_keys.insert(key.to_string());
        self
    }

    pub fn with_modification(mut self, modification: WriteCommand) -> Self {
        self.modifications
            .get_or_insert_with(Vec::new)
            .push(modification);
        self
    }
}

/// A collected transaction restricted to the keys being migrated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionInfo {
    pub global_tx: GlobalTransaction,
    pub view_id: u64,
    pub modifications: Vec<WriteCommand>,
    pub locked_keys: BTreeSet<String>,
}

/// Transaction info as shipped to another site. Carries no view id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteTransactionInfo {
    pub global_tx: GlobalTransaction,
    pub modifications: Vec<WriteCommand>,
}

impl From<&TransactionInfo> for SiteTransactionInfo {
    fn from(info: &TransactionInfo) -> Self {
        Self {
            global_tx: info.global_tx.clone(),
            modifications: info.modifications.clone(),
        }
    }
}
