//! Transaction (posting) table.

use std::collections::HashMap;

use tally_core::ledger::Transaction;
use tally_core::storage::{StoreError, TransactionFilter};
use tally_shared::types::TransactionId;

use super::Row;

/// Immutable postings keyed by ID.
#[derive(Debug, Clone, Default)]
pub struct TransactionRepository {
    rows: HashMap<TransactionId, Row<Transaction>>,
}

impl TransactionRepository {
    /// Loads a transaction.
    #[must_use]
    pub fn get(&self, id: &TransactionId) -> Option<&Transaction> {
        self.rows.get(id).map(|row| &row.record)
    }

    /// Returns true if the transaction is stored.
    #[must_use]
    pub fn contains(&self, id: &TransactionId) -> bool {
        self.rows.contains_key(id)
    }

    /// Fails if the ID is taken.
    pub fn check_insert(&self, id: &TransactionId) -> Result<(), StoreError> {
        if self.contains(id) {
            Err(StoreError::conflict("transaction", id.as_str()))
        } else {
            Ok(())
        }
    }

    /// Inserts a transaction; existing ones are never replaced.
    pub fn insert(&mut self, transaction: Transaction, sequence: u64) -> Result<(), StoreError> {
        self.check_insert(&transaction.id)?;
        self.rows.insert(
            transaction.id.clone(),
            Row {
                sequence,
                record: transaction,
            },
        );
        Ok(())
    }

    /// Lists matching transactions in insertion order, which is the order
    /// their post-balances were computed in.
    #[must_use]
    pub fn scan(&self, filter: &TransactionFilter) -> Vec<Transaction> {
        let mut rows: Vec<&Row<Transaction>> = self
            .rows
            .values()
            .filter(|row| filter.matches(&row.record))
            .collect();
        rows.sort_by_key(|row| row.sequence);
        rows.into_iter().map(|row| row.record.clone()).collect()
    }

    /// Number of stored transactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no transaction is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
